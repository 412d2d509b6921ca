// src/web/mw_student.rs
use crate::{
    error::AppError,
    services::user_service,
    state::AppState,
    web::mw_auth::UserId,
};
use axum::{
    extract::{Extension, Request, State},
    middleware::Next,
    response::Response,
};

/// Middleware que restringe a área do aluno a utilizadores com role
/// 'student'. Deve ser executado *depois* do middleware `require_auth`.
pub async fn require_student(
    State(state): State<AppState>,
    Extension(user_id_ext): Extension<UserId>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = user_id_ext.0;
    tracing::debug!("Student MW: Verificando role 'student' para {}", user_id);

    match user_service::find_user_by_id(&state.db_pool, user_id).await {
        Ok(Some(user)) if user.role == "student" => Ok(next.run(request).await),
        Ok(_) => {
            tracing::warn!("Student MW: Acesso negado para {} (área de alunos).", user_id);
            Err(AppError::Unauthorized)
        }
        Err(e) => {
            tracing::error!("Student MW: Erro ao buscar utilizador {}: {:?}", user_id, e);
            Err(e)
        }
    }
}
