// src/web/auth_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::user::{EsqueciSenhaForm, LoginForm, RegistoForm, ResetManualForm},
    services::{auth_service, reset_service, user_service},
    state::AppState,
    templates::{EsqueciSenhaPage, LoginPage, RegistoPage, ResetManualPage},
};
use askama::Template; // Trait Template para render()
use axum::{
    extract::{Form, Query, State},
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Redirect},
};
use serde::Deserialize;
use tower_sessions::Session;

/// Redireciona para a área certa conforme a role.
fn destino_por_role(role: &str) -> Redirect {
    if role == "admin" {
        Redirect::to("/admin/dashboard")
    } else {
        Redirect::to("/student/dashboard")
    }
}

/// Se já houver sessão iniciada, devolve o redirect para a área do
/// utilizador (senão None).
async fn redirect_se_logado(state: &AppState, session: &Session) -> AppResult<Option<Redirect>> {
    let user_id: Option<i64> = session.get("user_id").await.ok().flatten();
    if let Some(id) = user_id {
        if let Some(user) = user_service::find_user_by_id(&state.db_pool, id).await? {
            return Ok(Some(destino_por_role(&user.role)));
        }
    }
    Ok(None)
}

// GET /login
pub async fn show_login_form(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<impl IntoResponse> {
    if let Some(redirect) = redirect_se_logado(&state, &session).await? {
        tracing::debug!("GET /login: Utilizador já logado, redirecionando.");
        return Ok(redirect.into_response());
    }

    let template = LoginPage { error: None };
    match template.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!("Falha ao renderizar template de login: {}", e);
            Err(AppError::InternalServerError)
        }
    }
}

// POST /login (identidade é o email)
pub async fn handle_login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> AppResult<impl IntoResponse> {
    tracing::info!("Tentativa de login para: {}", form.email);

    let user = user_service::find_user_by_email(&state.db_pool, &form.email).await?;

    let user = match user {
        Some(u) => u,
        None => {
            tracing::warn!("Utilizador não encontrado: {}", form.email);
            // Mensagem genérica: não distingue email de senha errada
            let template = LoginPage { error: Some("Email ou senha inválidos.".to_string()) };
            return match template.render() {
                Ok(html) => Ok(Html(html).into_response()),
                Err(e) => {
                    tracing::error!("Falha ao renderizar login com erro: {}", e);
                    Err(AppError::InternalServerError)
                }
            };
        }
    };

    if auth_service::verify_password(&form.password, &user.password_hash).await? {
        // Novo ID de sessão ao autenticar (contra fixação de sessão)
        session.cycle_id().await
            .map_err(|e| AppError::SessionError(format!("Falha ao rodar ID: {}", e)))?;
        session.insert("user_id", user.id).await
            .map_err(|e| AppError::SessionError(format!("Falha ao inserir na sessão: {}", e)))?;

        tracing::info!("✅ Login bem-sucedido para: {}", user.email);
        Ok(destino_por_role(&user.role).into_response())
    } else {
        tracing::warn!("Senha incorreta para: {}", form.email);
        let template = LoginPage { error: Some("Email ou senha inválidos.".to_string()) };
        match template.render() {
            Ok(html) => Ok(Html(html).into_response()),
            Err(e) => {
                tracing::error!("Falha ao renderizar login com erro: {}", e);
                Err(AppError::InternalServerError)
            }
        }
    }
}

// GET /logout
pub async fn handle_logout(session: Session) -> AppResult<Redirect> {
    let user_id: Option<i64> = session.get("user_id").await.ok().flatten();

    session.delete().await
        .map_err(|e| AppError::SessionError(format!("Falha ao apagar sessão: {}", e)))?;

    if let Some(id) = user_id {
        tracing::info!("🚪 Utilizador {} desligado.", id);
    }
    Ok(Redirect::to("/login"))
}

// GET /register
pub async fn show_registo_form(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<impl IntoResponse> {
    if let Some(redirect) = redirect_se_logado(&state, &session).await? {
        return Ok(redirect.into_response());
    }

    let template = RegistoPage { error: None };
    match template.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!("Falha ao renderizar template de registo: {}", e);
            Err(AppError::InternalServerError)
        }
    }
}

// POST /register
pub async fn handle_registo(
    State(state): State<AppState>,
    Form(form): Form<RegistoForm>,
) -> AppResult<impl IntoResponse> {
    match user_service::registar_aluno(
        &state.db_pool,
        form.name.trim(),
        form.email.trim(),
        &form.password,
        &form.confirm_password,
    )
    .await
    {
        Ok(_) => Ok(Redirect::to("/login").into_response()),
        // Erros de fluxo voltam para o formulário com a mensagem
        Err(e @ (AppError::PasswordMismatch | AppError::EmailTaken)) => {
            let template = RegistoPage { error: Some(e.to_string()) };
            match template.render() {
                Ok(html) => Ok(Html(html).into_response()),
                Err(render_e) => {
                    tracing::error!("Falha ao renderizar registo com erro: {}", render_e);
                    Err(AppError::InternalServerError)
                }
            }
        }
        Err(e) => Err(e),
    }
}

// GET /forgot-password
pub async fn show_esqueci_senha(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<impl IntoResponse> {
    if let Some(redirect) = redirect_se_logado(&state, &session).await? {
        return Ok(redirect.into_response());
    }

    match EsqueciSenhaPage.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!("Falha ao renderizar esqueci-senha: {}", e);
            Err(AppError::InternalServerError)
        }
    }
}

// POST /forgot-password
// Resposta sempre em forma de sucesso: segue para a página do código
// quer o email exista quer não.
pub async fn handle_esqueci_senha(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<EsqueciSenhaForm>,
) -> AppResult<Redirect> {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost:3000");

    reset_service::solicitar_reset(&state.db_pool, &state.mailer, form.email.trim(), host)
        .await?;

    Ok(Redirect::to("/manual-reset"))
}

#[derive(Debug, Deserialize)]
pub struct ResetQuery {
    // Código vindo do link do email (pré-preenche o formulário)
    pub otp: Option<String>,
}

// GET /manual-reset
pub async fn show_reset_manual(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<ResetQuery>,
) -> AppResult<impl IntoResponse> {
    if let Some(redirect) = redirect_se_logado(&state, &session).await? {
        return Ok(redirect.into_response());
    }

    let template = ResetManualPage {
        otp: params.otp,
        codigo_validado: false,
        error: None,
    };
    match template.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!("Falha ao renderizar reset manual: {}", e);
            Err(AppError::InternalServerError)
        }
    }
}

// POST /manual-reset
// Dois passos no mesmo formulário: sem senha valida o código e mostra
// os campos de senha; com senha conclui o reset.
pub async fn handle_reset_manual(
    State(state): State<AppState>,
    Form(form): Form<ResetManualForm>,
) -> AppResult<impl IntoResponse> {
    let codigo = form.token.trim().to_string();
    let senha = form.password.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let confirmacao = form.confirm_password.as_deref().unwrap_or("");

    let resultado = match senha {
        // Passo 1: só validação do código
        None => reset_service::validar_codigo(&state.db_pool, &codigo)
            .await
            .map(|_| None),
        // Passo 2: troca efetiva
        Some(senha) => reset_service::concluir_reset(&state.db_pool, &codigo, senha, confirmacao)
            .await
            .map(Some),
    };

    let template = match resultado {
        // Reset concluído: volta ao login
        Ok(Some(())) => return Ok(Redirect::to("/login").into_response()),
        // Código válido: mostra os campos de senha
        Ok(None) => ResetManualPage {
            otp: Some(codigo),
            codigo_validado: true,
            error: None,
        },
        Err(e @ AppError::PasswordMismatch) => ResetManualPage {
            otp: Some(codigo),
            codigo_validado: true,
            error: Some(e.to_string()),
        },
        Err(e @ (AppError::InvalidCode | AppError::CodeExpired)) => ResetManualPage {
            otp: None,
            codigo_validado: false,
            error: Some(e.to_string()),
        },
        Err(e) => return Err(e),
    };

    match template.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!("Falha ao renderizar reset manual: {}", e);
            Err(AppError::InternalServerError)
        }
    }
}
