// src/web/student_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        matricula::PagamentoForm,
        user::{Aluno, User},
    },
    services::{curso_service, matricula_service, user_service},
    state::AppState,
    templates::{
        AssistirPage, ConfirmacaoPage, CursoDetalhePage, CursosPage, DashboardAlunoPage,
        PagamentoPage, PerfilPage,
    },
    web::mw_auth::UserId,
};
use askama::Template;
use axum::{
    extract::{Extension, Form, Path, Query, State},
    response::{Html, IntoResponse, Redirect},
};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct FeedbackParams {
    success: Option<String>,
    error: Option<String>,
}

/// Carrega o User + ficha de Aluno do utilizador em sessão. A ficha
/// existe sempre para registos normais; a ausência é tratada como 404.
async fn carregar_aluno(state: &AppState, user_id: i64) -> AppResult<(User, Aluno)> {
    let user = user_service::find_user_by_id(&state.db_pool, user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let aluno = user_service::find_aluno_by_user(&state.db_pool, user_id)
        .await?
        .ok_or_else(|| {
            tracing::error!("Ficha de aluno em falta para o user {}.", user_id);
            AppError::NotFound
        })?;
    Ok((user, aluno))
}

// GET /student/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
) -> AppResult<impl IntoResponse> {
    let (user, aluno) = carregar_aluno(&state, user_id.0).await?;
    let matriculas = matricula_service::listar_do_aluno(&state.db_pool, aluno.id).await?;

    let template = DashboardAlunoPage {
        user_name: user.name,
        numero_matricula: aluno.numero_matricula,
        matriculas,
    };
    match template.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!("Falha ao renderizar dashboard do aluno: {}", e);
            Err(AppError::InternalServerError)
        }
    }
}

// --- Perfil ---

#[derive(Deserialize, Debug)]
pub struct PerfilForm {
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    dob: Option<String>,
    #[serde(default)]
    address: Option<String>,
    // Nome do ficheiro da foto; o armazenamento em si fica fora do fluxo
    #[serde(default)]
    profile_image: Option<String>,
}

// GET /student/profile
pub async fn show_perfil(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Query(params): Query<FeedbackParams>,
) -> AppResult<impl IntoResponse> {
    let (user, aluno) = carregar_aluno(&state, user_id.0).await?;

    let template = PerfilPage {
        user,
        aluno,
        success_message: params.success,
        error_message: params.error,
    };
    match template.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!("Falha ao renderizar perfil: {}", e);
            Err(AppError::InternalServerError)
        }
    }
}

// POST /student/profile
pub async fn handle_perfil(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Form(form): Form<PerfilForm>,
) -> AppResult<Redirect> {
    let limpar = |campo: &Option<String>| -> Option<String> {
        campo.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
    };

    let foto = limpar(&form.profile_image)
        .map(|nome| format!("uploads/perfis/user_{}_{}", user_id.0, nome));

    let resultado = user_service::atualizar_perfil(
        &state.db_pool,
        user_id.0,
        limpar(&form.phone).as_deref(),
        limpar(&form.address).as_deref(),
        limpar(&form.dob).as_deref(),
        foto.as_deref(),
    )
    .await;

    match resultado {
        Ok(()) => {
            let msg = urlencoding::encode("Perfil atualizado com sucesso!").to_string();
            Ok(Redirect::to(&format!("/student/profile?success={}", msg)))
        }
        Err(e) => {
            tracing::error!("Erro ao atualizar perfil do user {}: {:?}", user_id.0, e);
            let msg = urlencoding::encode("Erro ao atualizar o perfil.").to_string();
            Ok(Redirect::to(&format!("/student/profile?error={}", msg)))
        }
    }
}

// --- Catálogo ---

#[derive(Deserialize, Debug)]
pub struct CatalogoQuery {
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    nivel: Option<String>,
    #[serde(default)]
    area: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

// GET /student/courses
// Navegação em três passos (nível -> área -> cursos); a busca livre
// salta direto para a lista.
pub async fn cursos(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Query(params): Query<CatalogoQuery>,
) -> AppResult<impl IntoResponse> {
    let (_, aluno) = carregar_aluno(&state, user_id.0).await?;
    let ids_matriculados =
        matricula_service::ids_cursos_do_aluno(&state.db_pool, aluno.id).await?;

    let busca = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let (display_mode, cursos) = match (busca, &params.nivel, &params.area) {
        (Some(termo), _, _) => {
            ("courses", curso_service::buscar_cursos(&state.db_pool, termo).await?)
        }
        (None, None, _) => ("levels", vec![]),
        (None, Some(_), None) => ("streams", vec![]),
        (None, Some(nivel), Some(area)) => {
            ("courses", curso_service::listar_por_nivel_area(&state.db_pool, nivel, area).await?)
        }
    };

    let template = CursosPage {
        display_mode: display_mode.to_string(),
        current_level: params.nivel,
        current_area: params.area,
        search_query: busca.unwrap_or("").to_string(),
        cursos,
        ids_matriculados,
        niveis: curso_service::NIVEIS,
        areas: curso_service::AREAS,
        error_message: params.error,
    };
    match template.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!("Falha ao renderizar catálogo: {}", e);
            Err(AppError::InternalServerError)
        }
    }
}

// GET /student/course/{id}
pub async fn curso_detalhe(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(curso_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let (_, aluno) = carregar_aluno(&state, user_id.0).await?;

    let curso = curso_service::find_curso(&state.db_pool, curso_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let matriculado = matricula_service::find_por_aluno_curso(&state.db_pool, aluno.id, curso_id)
        .await?
        .map(|m| m.tem_acesso())
        .unwrap_or(false);

    let secoes = curso_service::listar_secoes_com_videos(&state.db_pool, curso_id).await?;
    let videos_orfaos = curso_service::listar_videos_orfaos(&state.db_pool, curso_id).await?;

    let template = CursoDetalhePage { curso, secoes, videos_orfaos, matriculado };
    match template.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!("Falha ao renderizar detalhe do curso {}: {}", curso_id, e);
            Err(AppError::InternalServerError)
        }
    }
}

// GET /student/enroll/{id}
// Reserva a vaga e cria a matrícula pendente; segue para o pagamento.
pub async fn inscrever(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(curso_id): Path<i64>,
) -> AppResult<Redirect> {
    let (_, aluno) = carregar_aluno(&state, user_id.0).await?;

    match matricula_service::inscrever(&state.db_pool, aluno.id, curso_id).await {
        Ok(matricula_id) => Ok(Redirect::to(&format!("/student/payment/{}", matricula_id))),
        Err(e @ (AppError::AlreadyEnrolled | AppError::CourseFull | AppError::NotFound)) => {
            let msg = urlencoding::encode(&e.to_string()).to_string();
            Ok(Redirect::to(&format!("/student/courses?error={}", msg)))
        }
        Err(e) => Err(e),
    }
}

// GET /student/payment/{matricula_id}
pub async fn pagamento_page(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(matricula_id): Path<i64>,
    Query(params): Query<FeedbackParams>,
) -> AppResult<impl IntoResponse> {
    let (_, aluno) = carregar_aluno(&state, user_id.0).await?;

    let matricula = matricula_service::find_matricula(&state.db_pool, matricula_id)
        .await?
        .ok_or(AppError::NotFound)?;

    // Só o dono da matrícula pode ver a página de pagamento
    if matricula.aluno_id != aluno.id {
        tracing::warn!("Acesso negado à página de pagamento {} (user {}).", matricula_id, user_id.0);
        return Ok(Redirect::to("/student/dashboard").into_response());
    }

    // Já paga: nada a cobrar
    if matricula.status == crate::models::matricula::STATUS_MATRICULADO {
        return Ok(Redirect::to("/student/dashboard").into_response());
    }

    let curso = curso_service::find_curso(&state.db_pool, matricula.curso_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let nota = format!("Matricula {}", matricula.id);
    let (qr_code, upi_link) =
        matricula_service::gerar_link_upi(&state.upi_id, "Universidade", curso.taxa, &nota);

    let template = PagamentoPage {
        matricula,
        curso,
        qr_code,
        upi_link,
        error_message: params.error,
    };
    match template.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!("Falha ao renderizar página de pagamento: {}", e);
            Err(AppError::InternalServerError)
        }
    }
}

// POST /student/payment/{matricula_id}/process
pub async fn processar_pagamento(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(matricula_id): Path<i64>,
    Form(form): Form<PagamentoForm>,
) -> AppResult<Redirect> {
    let (user, aluno) = carregar_aluno(&state, user_id.0).await?;

    match matricula_service::confirmar_pagamento(
        &state.db_pool,
        &state.mailer,
        matricula_id,
        &aluno,
        &user,
        &form,
    )
    .await
    {
        Ok(id_transacao) => {
            let tx = urlencoding::encode(&id_transacao).to_string();
            Ok(Redirect::to(&format!(
                "/student/confirmation/{}?tx_id={}",
                matricula_id, tx
            )))
        }
        Err(e @ AppError::MissingPaymentProof) => {
            let msg = urlencoding::encode(&e.to_string()).to_string();
            Ok(Redirect::to(&format!("/student/payment/{}?error={}", matricula_id, msg)))
        }
        Err(AppError::NotOwner) => {
            tracing::warn!("Pagamento recusado: matrícula {} não pertence ao user {}.", matricula_id, user_id.0);
            Ok(Redirect::to("/student/dashboard"))
        }
        Err(e) => Err(e),
    }
}

#[derive(Deserialize, Debug)]
pub struct ConfirmacaoQuery {
    tx_id: Option<String>,
}

// GET /student/confirmation/{matricula_id}
pub async fn confirmacao(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(matricula_id): Path<i64>,
    Query(params): Query<ConfirmacaoQuery>,
) -> AppResult<impl IntoResponse> {
    let (_, aluno) = carregar_aluno(&state, user_id.0).await?;

    let matricula = matricula_service::find_matricula(&state.db_pool, matricula_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if matricula.aluno_id != aluno.id {
        return Ok(Redirect::to("/student/dashboard").into_response());
    }

    let curso = curso_service::find_curso(&state.db_pool, matricula.curso_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let template = ConfirmacaoPage {
        curso,
        transaction_id: params.tx_id.unwrap_or_else(|| "N/A".to_string()),
    };
    match template.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!("Falha ao renderizar confirmação: {}", e);
            Err(AppError::InternalServerError)
        }
    }
}

// GET /student/watch/{curso_id}
// Conteúdo só para matrículas pagas ('enrolled') ou concluídas.
pub async fn assistir(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(curso_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let (_, aluno) = carregar_aluno(&state, user_id.0).await?;

    let curso = curso_service::find_curso(&state.db_pool, curso_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let acesso = matricula_service::find_por_aluno_curso(&state.db_pool, aluno.id, curso_id)
        .await?
        .map(|m| m.tem_acesso())
        .unwrap_or(false);
    if !acesso {
        let msg = urlencoding::encode("Precisa de estar matriculado para assistir aos vídeos.").to_string();
        return Ok(Redirect::to(&format!("/student/courses?error={}", msg)).into_response());
    }

    let secoes = curso_service::listar_secoes_com_videos(&state.db_pool, curso_id).await?;
    let videos_orfaos = curso_service::listar_videos_orfaos(&state.db_pool, curso_id).await?;

    let template = AssistirPage { curso, secoes, videos_orfaos };
    match template.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!("Falha ao renderizar página de vídeos: {}", e);
            Err(AppError::InternalServerError)
        }
    }
}
