// src/models/user.rs
use chrono::NaiveDateTime;
use serde::Deserialize;
use sqlx::FromRow;

// Representa um utilizador lido da tabela 'users'
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String, // "admin" ou "student"
    pub reset_otp: Option<String>,
    pub reset_otp_expiry: Option<NaiveDateTime>,
    pub created_at: Option<NaiveDateTime>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

// Ficha do aluno (1:1 com User), tabela 'alunos'
#[derive(Debug, Clone, FromRow)]
pub struct Aluno {
    pub id: i64,
    pub user_id: i64,
    pub numero_matricula: Option<String>, // UNIV + ano + id com 3 dígitos
    pub telefone: Option<String>,
    pub endereco: Option<String>,
    pub data_nascimento: Option<String>,
    pub foto_perfil: Option<String>,
}

// Linha combinada User + Aluno para as páginas de gestão do admin
#[derive(Debug, Clone, FromRow)]
pub struct AlunoComUser {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub numero_matricula: Option<String>,
    pub telefone: Option<String>,
    pub data_nascimento: Option<String>,
}

// --- Formulários de autenticação ---

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegistoForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct EsqueciSenhaForm {
    pub email: String,
}

// O mesmo formulário serve para validar o código e para concluir o reset:
// sem senha => só validação; com senha => troca efetiva.
#[derive(Debug, Deserialize)]
pub struct ResetManualForm {
    pub token: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub confirm_password: Option<String>,
}
