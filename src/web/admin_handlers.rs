// src/web/admin_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::user::AlunoComUser,
    services::{auth_service, curso_service, matricula_service, user_service},
    services::curso_service::CursoCampos,
    state::AppState,
    templates::{
        AdminAlunosPage, AdminCursosPage, AdminDashboardPage, AdminEditarAlunoPage,
        AdminEditarCursoPage, AdminMatriculasPage, AdminSettingsPage, AdminVideosPage,
    },
    web::mw_auth::UserId,
};
use askama::Template; // Para render()
use axum::{
    extract::{Extension, Form, Path, Query, State},
    http::header,
    response::{Html, IntoResponse, Redirect},
};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct FeedbackParams {
    success: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct BuscaParams {
    #[serde(default)]
    search: Option<String>,
    success: Option<String>,
    error: Option<String>,
}

// GET /admin/dashboard
pub async fn dashboard(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let template = AdminDashboardPage {
        total_alunos: user_service::contar_alunos(&state.db_pool).await?,
        total_cursos: curso_service::contar_cursos(&state.db_pool).await?,
        total_matriculas: matricula_service::contar_matriculas(&state.db_pool).await?,
    };
    match template.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!("Falha ao renderizar dashboard admin: {}", e);
            Err(AppError::InternalServerError)
        }
    }
}

// --- Gestão de alunos ---

// GET /admin/students
pub async fn alunos(
    State(state): State<AppState>,
    Query(params): Query<BuscaParams>,
) -> AppResult<impl IntoResponse> {
    let alunos = user_service::listar_alunos(&state.db_pool, params.search.as_deref()).await?;

    let template = AdminAlunosPage {
        alunos,
        search_query: params.search.unwrap_or_default(),
        success_message: params.success,
        error_message: params.error,
    };
    match template.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!("Falha ao renderizar gestão de alunos: {}", e);
            Err(AppError::InternalServerError)
        }
    }
}

/// Busca a linha combinada de um aluno para o formulário de edição.
async fn find_aluno_com_user(state: &AppState, user_id: i64) -> AppResult<Option<AlunoComUser>> {
    let user = user_service::find_user_by_id(&state.db_pool, user_id).await?;
    let aluno = user_service::find_aluno_by_user(&state.db_pool, user_id).await?;
    Ok(user.filter(|u| u.role == "student").map(|u| AlunoComUser {
        user_id: u.id,
        name: u.name,
        email: u.email,
        numero_matricula: aluno.as_ref().and_then(|a| a.numero_matricula.clone()),
        telefone: aluno.as_ref().and_then(|a| a.telefone.clone()),
        data_nascimento: aluno.as_ref().and_then(|a| a.data_nascimento.clone()),
    }))
}

// GET /admin/students/edit/{user_id}
pub async fn show_editar_aluno(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let aluno = find_aluno_com_user(&state, user_id).await?;

    let template = AdminEditarAlunoPage {
        error_message: if aluno.is_none() {
            Some(format!("Aluno {} não encontrado.", user_id))
        } else {
            None
        },
        aluno,
    };
    match template.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!("Falha ao renderizar edição de aluno: {}", e);
            Err(AppError::InternalServerError)
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct EditarAlunoForm {
    name: String,
    email: String,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    dob: Option<String>,
}

// POST /admin/students/edit/{user_id}
pub async fn handle_editar_aluno(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Form(form): Form<EditarAlunoForm>,
) -> AppResult<Redirect> {
    if form.name.trim().is_empty() || form.email.trim().is_empty() {
        let msg = urlencoding::encode("Nome e email são obrigatórios.").to_string();
        return Ok(Redirect::to(&format!("/admin/students/edit/{}?error={}", user_id, msg)));
    }

    match user_service::atualizar_aluno_admin(
        &state.db_pool,
        user_id,
        form.name.trim(),
        form.email.trim(),
        form.phone.as_deref().map(str::trim).filter(|v| !v.is_empty()),
        form.dob.as_deref().map(str::trim).filter(|v| !v.is_empty()),
    )
    .await
    {
        Ok(()) => {
            let msg = urlencoding::encode("Dados do aluno atualizados.").to_string();
            Ok(Redirect::to(&format!("/admin/students?success={}", msg)))
        }
        Err(e) => {
            tracing::error!("Erro ao editar aluno {}: {:?}", user_id, e);
            let msg = urlencoding::encode("Erro ao atualizar o aluno.").to_string();
            Ok(Redirect::to(&format!("/admin/students?error={}", msg)))
        }
    }
}

// GET /admin/students/delete/{user_id}
pub async fn apagar_aluno(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Redirect> {
    match user_service::apagar_aluno(&state.db_pool, user_id).await {
        Ok(()) => {
            let msg = urlencoding::encode("Aluno apagado com sucesso.").to_string();
            Ok(Redirect::to(&format!("/admin/students?success={}", msg)))
        }
        Err(e) => {
            tracing::error!("Erro ao apagar aluno {}: {:?}", user_id, e);
            let msg = urlencoding::encode("Erro ao apagar o aluno.").to_string();
            Ok(Redirect::to(&format!("/admin/students?error={}", msg)))
        }
    }
}

// --- Gestão de cursos ---

// Campos numéricos chegam como texto; a validação acontece aqui no
// boundary e volta como mensagem, nunca como 422.
#[derive(Deserialize, Debug)]
pub struct CursoForm {
    codigo: String,
    nome: String,
    creditos: String,
    vagas: String,
    taxa: String,
    #[serde(default)]
    descricao: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    categoria: Option<String>,
    #[serde(default)]
    nivel: Option<String>,
    #[serde(default)]
    area: Option<String>,
}

fn validar_curso_form(form: &CursoForm) -> Result<CursoCampos, String> {
    if form.codigo.trim().is_empty() || form.nome.trim().is_empty() {
        return Err("Código e nome do curso são obrigatórios.".to_string());
    }

    let creditos: i64 = form.creditos.trim().parse()
        .map_err(|_| "Valor inválido para créditos.".to_string())?;
    let vagas: i64 = form.vagas.trim().parse()
        .map_err(|_| "Valor inválido para vagas.".to_string())?;
    let taxa: f64 = form.taxa.trim().parse()
        .map_err(|_| "Valor inválido para a taxa.".to_string())?;

    if vagas < 0 {
        return Err("As vagas não podem ser negativas.".to_string());
    }
    if taxa < 0.0 {
        return Err("A taxa não pode ser negativa.".to_string());
    }

    let limpar = |campo: &Option<String>| -> Option<String> {
        campo.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
    };

    Ok(CursoCampos {
        codigo: form.codigo.trim().to_string(),
        nome: form.nome.trim().to_string(),
        descricao: limpar(&form.descricao),
        link: limpar(&form.link),
        creditos,
        vagas,
        taxa,
        categoria: limpar(&form.categoria).unwrap_or_else(|| "General".to_string()),
        nivel: limpar(&form.nivel),
        area: limpar(&form.area),
    })
}

// GET /admin/courses
pub async fn cursos(
    State(state): State<AppState>,
    Query(params): Query<FeedbackParams>,
) -> AppResult<impl IntoResponse> {
    let cursos = curso_service::listar_cursos(&state.db_pool).await?;

    let template = AdminCursosPage {
        cursos,
        success_message: params.success,
        error_message: params.error,
        niveis: curso_service::NIVEIS,
        areas: curso_service::AREAS,
    };
    match template.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!("Falha ao renderizar gestão de cursos: {}", e);
            Err(AppError::InternalServerError)
        }
    }
}

// POST /admin/courses
pub async fn handle_criar_curso(
    State(state): State<AppState>,
    Form(form): Form<CursoForm>,
) -> AppResult<Redirect> {
    let campos = match validar_curso_form(&form) {
        Ok(c) => c,
        Err(msg) => {
            let msg = urlencoding::encode(&msg).to_string();
            return Ok(Redirect::to(&format!("/admin/courses?error={}", msg)));
        }
    };

    match curso_service::criar_curso(&state.db_pool, &campos).await {
        Ok(_) => {
            let msg = urlencoding::encode("Curso criado com sucesso.").to_string();
            Ok(Redirect::to(&format!("/admin/courses?success={}", msg)))
        }
        Err(e @ AppError::CourseCodeTaken) => {
            let msg = urlencoding::encode(&e.to_string()).to_string();
            Ok(Redirect::to(&format!("/admin/courses?error={}", msg)))
        }
        Err(e) => {
            tracing::error!("Erro ao criar curso: {:?}", e);
            let msg = urlencoding::encode("Erro ao criar o curso.").to_string();
            Ok(Redirect::to(&format!("/admin/courses?error={}", msg)))
        }
    }
}

// GET /admin/courses/edit/{curso_id}
pub async fn show_editar_curso(
    State(state): State<AppState>,
    Path(curso_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let curso = curso_service::find_curso(&state.db_pool, curso_id).await?;

    let template = AdminEditarCursoPage {
        error_message: if curso.is_none() {
            Some(format!("Curso {} não encontrado.", curso_id))
        } else {
            None
        },
        curso,
        niveis: curso_service::NIVEIS,
        areas: curso_service::AREAS,
    };
    match template.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!("Falha ao renderizar edição de curso: {}", e);
            Err(AppError::InternalServerError)
        }
    }
}

// POST /admin/courses/edit/{curso_id}
pub async fn handle_editar_curso(
    State(state): State<AppState>,
    Path(curso_id): Path<i64>,
    Form(form): Form<CursoForm>,
) -> AppResult<Redirect> {
    let campos = match validar_curso_form(&form) {
        Ok(c) => c,
        Err(msg) => {
            let msg = urlencoding::encode(&msg).to_string();
            return Ok(Redirect::to(&format!("/admin/courses/edit/{}?error={}", curso_id, msg)));
        }
    };

    match curso_service::atualizar_curso(&state.db_pool, curso_id, &campos).await {
        Ok(()) => {
            let msg = urlencoding::encode("Curso atualizado com sucesso.").to_string();
            Ok(Redirect::to(&format!("/admin/courses?success={}", msg)))
        }
        Err(e) => {
            tracing::error!("Erro ao atualizar curso {}: {:?}", curso_id, e);
            let msg = urlencoding::encode("Erro ao atualizar o curso.").to_string();
            Ok(Redirect::to(&format!("/admin/courses?error={}", msg)))
        }
    }
}

// GET /admin/courses/delete/{curso_id}
pub async fn apagar_curso(
    State(state): State<AppState>,
    Path(curso_id): Path<i64>,
) -> AppResult<Redirect> {
    match curso_service::apagar_curso(&state.db_pool, curso_id).await {
        Ok(()) => {
            let msg = urlencoding::encode("Curso apagado com sucesso.").to_string();
            Ok(Redirect::to(&format!("/admin/courses?success={}", msg)))
        }
        Err(e) => {
            tracing::error!("Erro ao apagar curso {}: {:?}", curso_id, e);
            let msg = urlencoding::encode("Erro ao apagar o curso.").to_string();
            Ok(Redirect::to(&format!("/admin/courses?error={}", msg)))
        }
    }
}

// --- Seções e vídeos de um curso ---

// GET /admin/courses/{curso_id}/videos
pub async fn videos(
    State(state): State<AppState>,
    Path(curso_id): Path<i64>,
    Query(params): Query<FeedbackParams>,
) -> AppResult<impl IntoResponse> {
    let curso = curso_service::find_curso(&state.db_pool, curso_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let secoes = curso_service::listar_secoes_com_videos(&state.db_pool, curso_id).await?;
    let videos_orfaos = curso_service::listar_videos_orfaos(&state.db_pool, curso_id).await?;

    let template = AdminVideosPage {
        curso,
        secoes,
        videos_orfaos,
        success_message: params.success,
        error_message: params.error,
    };
    match template.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!("Falha ao renderizar gestão de vídeos: {}", e);
            Err(AppError::InternalServerError)
        }
    }
}

// O mesmo formulário cria seções e vídeos; 'action' decide
#[derive(Deserialize, Debug)]
pub struct VideoOuSecaoForm {
    action: String, // "add_section" ou "add_video"
    #[serde(default)]
    titulo: Option<String>,
    #[serde(default)]
    ordem: Option<String>,
    #[serde(default)]
    video_url: Option<String>,
    #[serde(default)]
    secao_id: Option<String>,
    #[serde(default)]
    duracao: Option<String>,
}

// POST /admin/courses/{curso_id}/videos
pub async fn handle_videos(
    State(state): State<AppState>,
    Path(curso_id): Path<i64>,
    Form(form): Form<VideoOuSecaoForm>,
) -> AppResult<Redirect> {
    let destino = |tipo: &str, msg: &str| {
        let msg = urlencoding::encode(msg).to_string();
        Redirect::to(&format!("/admin/courses/{}/videos?{}={}", curso_id, tipo, msg))
    };

    let titulo = form.titulo.as_deref().map(str::trim).filter(|t| !t.is_empty());

    match form.action.as_str() {
        "add_section" => {
            let Some(titulo) = titulo else {
                return Ok(destino("error", "O título da seção é obrigatório."));
            };
            let ordem = form
                .ordem
                .as_deref()
                .and_then(|o| o.trim().parse::<i64>().ok())
                .unwrap_or(0);
            curso_service::criar_secao(&state.db_pool, curso_id, titulo, ordem).await?;
            Ok(destino("success", "Seção criada."))
        }
        "add_video" => {
            let url = form.video_url.as_deref().map(str::trim).filter(|u| !u.is_empty());
            let (Some(titulo), Some(url)) = (titulo, url) else {
                return Ok(destino("error", "Título e URL do vídeo são obrigatórios."));
            };
            let secao_id = form
                .secao_id
                .as_deref()
                .and_then(|s| s.trim().parse::<i64>().ok());
            let duracao = form.duracao.as_deref().map(str::trim).filter(|d| !d.is_empty());
            curso_service::criar_video(&state.db_pool, curso_id, secao_id, titulo, url, duracao)
                .await?;
            Ok(destino("success", "Vídeo adicionado."))
        }
        outro => {
            tracing::warn!("Ação desconhecida na gestão de vídeos: '{}'", outro);
            Ok(destino("error", "Ação desconhecida."))
        }
    }
}

// GET /admin/courses/sections/delete/{secao_id}
pub async fn apagar_secao(
    State(state): State<AppState>,
    Path(secao_id): Path<i64>,
) -> AppResult<Redirect> {
    match curso_service::apagar_secao(&state.db_pool, secao_id).await {
        Ok(curso_id) => {
            let msg = urlencoding::encode("Seção apagada.").to_string();
            Ok(Redirect::to(&format!("/admin/courses/{}/videos?success={}", curso_id, msg)))
        }
        Err(AppError::NotFound) => {
            let msg = urlencoding::encode("Seção não encontrada.").to_string();
            Ok(Redirect::to(&format!("/admin/courses?error={}", msg)))
        }
        Err(e) => Err(e),
    }
}

// GET /admin/courses/videos/delete/{video_id}
pub async fn apagar_video(
    State(state): State<AppState>,
    Path(video_id): Path<i64>,
) -> AppResult<Redirect> {
    match curso_service::apagar_video(&state.db_pool, video_id).await {
        Ok(curso_id) => {
            let msg = urlencoding::encode("Vídeo apagado.").to_string();
            Ok(Redirect::to(&format!("/admin/courses/{}/videos?success={}", curso_id, msg)))
        }
        Err(AppError::NotFound) => {
            let msg = urlencoding::encode("Vídeo não encontrado.").to_string();
            Ok(Redirect::to(&format!("/admin/courses?error={}", msg)))
        }
        Err(e) => Err(e),
    }
}

// --- Matrículas ---

// GET /admin/enrollments
pub async fn matriculas(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let matriculas = matricula_service::listar_todas(&state.db_pool).await?;

    let template = AdminMatriculasPage { matriculas };
    match template.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!("Falha ao renderizar matrículas: {}", e);
            Err(AppError::InternalServerError)
        }
    }
}

// GET /admin/report - download CSV de todas as matrículas
pub async fn relatorio(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let csv = matricula_service::relatorio_csv(&state.db_pool).await?;
    tracing::info!("Relatório de matrículas exportado ({} bytes).", csv.len());

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"relatorio_matriculas.csv\"",
            ),
        ],
        csv,
    )
        .into_response())
}

// --- Definições ---

// GET /admin/settings
pub async fn settings(Query(params): Query<FeedbackParams>) -> AppResult<impl IntoResponse> {
    let template = AdminSettingsPage {
        success_message: params.success,
        error_message: params.error,
    };
    match template.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!("Falha ao renderizar definições: {}", e);
            Err(AppError::InternalServerError)
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct SettingsForm {
    current_password: String,
    new_password: String,
    confirm_password: String,
}

// POST /admin/settings - troca da própria senha
pub async fn handle_settings(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Form(form): Form<SettingsForm>,
) -> AppResult<Redirect> {
    let user = user_service::find_user_by_id(&state.db_pool, user_id.0)
        .await?
        .ok_or(AppError::NotFound)?;

    if !auth_service::verify_password(&form.current_password, &user.password_hash).await? {
        let msg = urlencoding::encode("Senha atual incorreta.").to_string();
        return Ok(Redirect::to(&format!("/admin/settings?error={}", msg)));
    }

    if form.new_password != form.confirm_password {
        let msg = urlencoding::encode("As senhas não coincidem.").to_string();
        return Ok(Redirect::to(&format!("/admin/settings?error={}", msg)));
    }

    user_service::atualizar_senha(&state.db_pool, user_id.0, &form.new_password).await?;

    let msg = urlencoding::encode("Senha atualizada com sucesso!").to_string();
    Ok(Redirect::to(&format!("/admin/settings?success={}", msg)))
}
