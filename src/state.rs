// src/state.rs
use crate::services::notify_service::Mailer;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    // Colaborador de email (confirmações de matrícula, códigos de reset)
    pub mailer: Mailer,
    // UPI da universidade, mostrado na página de pagamento
    pub upi_id: String,
}

// Permite extrair o pool da DB diretamente
impl axum::extract::FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> SqlitePool {
        state.db_pool.clone()
    }
}

impl axum::extract::FromRef<AppState> for Mailer {
    fn from_ref(state: &AppState) -> Mailer {
        state.mailer.clone()
    }
}
