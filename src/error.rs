// src/error.rs
use axum::{http::StatusCode, response::Html, response::IntoResponse};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Erro na base de dados: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Erro de migração da base de dados: {0}")]
    SqlxMigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Erro de variável de ambiente: {0}")]
    EnvVarError(#[from] std::env::VarError),

    #[error("Erro ao processar password")]
    PasswordHashingError,

    #[error("Email ou senha inválidos.")]
    InvalidCredentials,

    #[error("Erro na sessão: {0}")]
    SessionError(String),

    // --- Erros de fluxo (recuperáveis, apresentados ao requisitante) ---
    #[error("Já está matriculado neste curso.")]
    AlreadyEnrolled,

    #[error("Este curso está lotado.")]
    CourseFull,

    #[error("Acesso negado: esta matrícula não lhe pertence.")]
    NotOwner,

    #[error("Forneça a referência da transação e o comprovativo do pagamento.")]
    MissingPaymentProof,

    #[error("Código inválido.")]
    InvalidCode,

    #[error("Código expirado. Solicite um novo.")]
    CodeExpired,

    #[error("As senhas não coincidem.")]
    PasswordMismatch,

    #[error("Este email já está registado.")]
    EmailTaken,

    #[error("Já existe um curso com esse código.")]
    CourseCodeTaken,

    #[error("Registo não encontrado.")]
    NotFound,

    #[error("Erro interno inesperado")]
    InternalServerError,

    #[error("Não autorizado")]
    Unauthorized,
}

// Como converter AppError numa resposta HTTP.
// Os erros de fluxo normalmente são tratados nos handlers (redirect com
// mensagem); isto é a rede de segurança para os que escapam.
impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        // Loga o erro detalhado no servidor
        tracing::error!("Erro processado: {:?}", self);

        let (status, user_message) = match &self {
            AppError::SqlxError(_) | AppError::SqlxMigrateError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Erro ao aceder aos dados.".to_string())
            }
            AppError::EnvVarError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Erro de configuração.".to_string())
            }
            AppError::PasswordHashingError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Erro ao processar credenciais.".to_string())
            }
            AppError::SessionError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Erro na gestão da sua sessão.".to_string())
            }
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Unauthorized => (StatusCode::FORBIDDEN, "Não autorizado.".to_string()),
            AppError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::NotOwner => (StatusCode::FORBIDDEN, self.to_string()),
            AppError::AlreadyEnrolled
            | AppError::CourseFull
            | AppError::EmailTaken
            | AppError::CourseCodeTaken => (StatusCode::CONFLICT, self.to_string()),
            AppError::MissingPaymentProof
            | AppError::InvalidCode
            | AppError::CodeExpired
            | AppError::PasswordMismatch => (StatusCode::BAD_REQUEST, self.to_string()),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "Ocorreu um erro inesperado.".to_string()),
        };

        (status, Html(format!(r#"
            <!DOCTYPE html><html><head><title>Erro</title><style>body{{font-family:sans-serif;}}</style></head>
            <body><h1>Erro {status_code}</h1><p>{message}</p><a href="javascript:history.back()">Voltar</a></body></html>
         "#, status_code = status.as_u16(), message = user_message))).into_response()
    }
}

// Tipo Result padrão para a aplicação
pub type AppResult<T = ()> = Result<T, AppError>;
