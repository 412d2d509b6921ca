// src/templates.rs
use askama::Template; // Trait necessário para Askama
use crate::models::{
    curso::{Curso, SecaoComVideos, VideoCurso},
    matricula::{Matricula, MatriculaDetalhada},
    user::{Aluno, AlunoComUser, User},
};

// --- Autenticação ---

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "registo.html")]
pub struct RegistoPage {
    pub error: Option<String>,
}

// A resposta do pedido de reset é sempre em forma de sucesso; a página
// não tem estado para mostrar além do formulário.
#[derive(Template)]
#[template(path = "esqueci_senha.html")]
pub struct EsqueciSenhaPage;

// Página de reset manual: só o campo do código, ou código + senhas
// quando o código já foi validado.
#[derive(Template)]
#[template(path = "reset_manual.html")]
pub struct ResetManualPage {
    pub otp: Option<String>,
    pub codigo_validado: bool,
    pub error: Option<String>,
}

// --- Área do aluno ---

#[derive(Template)]
#[template(path = "aluno_dashboard.html")]
pub struct DashboardAlunoPage {
    pub user_name: String,
    pub numero_matricula: Option<String>,
    pub matriculas: Vec<MatriculaDetalhada>,
}

#[derive(Template)]
#[template(path = "aluno_perfil.html")]
pub struct PerfilPage {
    pub user: User,
    pub aluno: Aluno,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
}

// Navegação do catálogo: display_mode é "levels", "streams" ou "courses"
#[derive(Template)]
#[template(path = "aluno_cursos.html")]
pub struct CursosPage {
    pub display_mode: String,
    pub current_level: Option<String>,
    pub current_area: Option<String>,
    pub search_query: String,
    pub cursos: Vec<Curso>,
    pub ids_matriculados: Vec<i64>,
    pub niveis: &'static [&'static str],
    pub areas: &'static [&'static str],
    pub error_message: Option<String>,
}

impl CursosPage {
    /// O aluno já tem matrícula (em qualquer estado) neste curso?
    pub fn ja_matriculado(&self, curso_id: i64) -> bool {
        self.ids_matriculados.contains(&curso_id)
    }
}

#[derive(Template)]
#[template(path = "curso_detalhe.html")]
pub struct CursoDetalhePage {
    pub curso: Curso,
    pub secoes: Vec<SecaoComVideos>,
    pub videos_orfaos: Vec<VideoCurso>,
    pub matriculado: bool,
}

#[derive(Template)]
#[template(path = "pagamento.html")]
pub struct PagamentoPage {
    pub matricula: Matricula,
    pub curso: Curso,
    pub qr_code: String,
    pub upi_link: String,
    pub error_message: Option<String>,
}

#[derive(Template)]
#[template(path = "confirmacao.html")]
pub struct ConfirmacaoPage {
    pub curso: Curso,
    pub transaction_id: String,
}

#[derive(Template)]
#[template(path = "assistir.html")]
pub struct AssistirPage {
    pub curso: Curso,
    pub secoes: Vec<SecaoComVideos>,
    pub videos_orfaos: Vec<VideoCurso>,
}

// --- Área de admin ---

#[derive(Template)]
#[template(path = "admin_dashboard.html")]
pub struct AdminDashboardPage {
    pub total_alunos: i64,
    pub total_cursos: i64,
    pub total_matriculas: i64,
}

#[derive(Template)]
#[template(path = "admin_alunos.html")]
pub struct AdminAlunosPage {
    pub alunos: Vec<AlunoComUser>,
    pub search_query: String,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Template)]
#[template(path = "admin_editar_aluno.html")]
pub struct AdminEditarAlunoPage {
    pub aluno: Option<AlunoComUser>,
    pub error_message: Option<String>,
}

#[derive(Template)]
#[template(path = "admin_cursos.html")]
pub struct AdminCursosPage {
    pub cursos: Vec<Curso>,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
    pub niveis: &'static [&'static str],
    pub areas: &'static [&'static str],
}

#[derive(Template)]
#[template(path = "admin_editar_curso.html")]
pub struct AdminEditarCursoPage {
    pub curso: Option<Curso>,
    pub error_message: Option<String>,
    pub niveis: &'static [&'static str],
    pub areas: &'static [&'static str],
}

#[derive(Template)]
#[template(path = "admin_videos.html")]
pub struct AdminVideosPage {
    pub curso: Curso,
    pub secoes: Vec<SecaoComVideos>,
    pub videos_orfaos: Vec<VideoCurso>,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Template)]
#[template(path = "admin_matriculas.html")]
pub struct AdminMatriculasPage {
    pub matriculas: Vec<MatriculaDetalhada>,
}

#[derive(Template)]
#[template(path = "admin_settings.html")]
pub struct AdminSettingsPage {
    pub success_message: Option<String>,
    pub error_message: Option<String>,
}
