// src/models/curso.rs
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// --- Estruturas que espelham as Tabelas da DB ---

#[derive(Debug, FromRow, Serialize, Deserialize, Clone)]
pub struct Curso {
    pub id: i64,
    pub codigo: String,
    pub nome: String,
    pub descricao: Option<String>,
    pub link: Option<String>,
    pub creditos: i64,
    pub vagas: i64, // nunca negativo (CHECK na DB + decremento atómico)
    pub taxa: f64,
    pub categoria: String,
    pub nivel: Option<String>, // "1st PU", "2nd PU"
    pub area: Option<String>,  // "Science", "Commerce", "Arts"
}

#[derive(Debug, FromRow, Serialize, Deserialize, Clone)]
pub struct SecaoCurso {
    pub id: i64,
    pub curso_id: i64,
    pub titulo: String,
    pub ordem: i64,
}

#[derive(Debug, FromRow, Serialize, Deserialize, Clone)]
pub struct VideoCurso {
    pub id: i64,
    pub curso_id: i64,
    pub secao_id: Option<i64>, // NULL = vídeo sem seção ("órfão")
    pub titulo: String,
    pub video_url: String,
    pub duracao: Option<String>,
    pub ordem: i64,
}

/// Seção com os seus vídeos, para as páginas de detalhe/assistir.
#[derive(Debug, Clone)]
pub struct SecaoComVideos {
    pub secao: SecaoCurso,
    pub videos: Vec<VideoCurso>,
}
