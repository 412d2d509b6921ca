// src/models/matricula.rs
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// Estados de uma matrícula: 'pending_payment' -> 'enrolled' -> 'completed',
// ou 'dropped'. Nunca regressa automaticamente a 'pending_payment'.
pub const STATUS_PENDENTE: &str = "pending_payment";
pub const STATUS_MATRICULADO: &str = "enrolled";
pub const STATUS_CONCLUIDO: &str = "completed";

#[derive(Debug, FromRow, Serialize, Deserialize, Clone)]
pub struct Matricula {
    pub id: i64,
    pub aluno_id: i64,
    pub curso_id: i64,
    pub data_matricula: Option<NaiveDateTime>,
    pub status: String,
    pub referencia_transacao: Option<String>,
    pub recibo_imagem: Option<String>,
}

impl Matricula {
    /// Matrícula com acesso ao conteúdo (paga ou concluída).
    pub fn tem_acesso(&self) -> bool {
        self.status == STATUS_MATRICULADO || self.status == STATUS_CONCLUIDO
    }
}

// Linha combinada para o dashboard do aluno e as listagens do admin
#[derive(Debug, FromRow, Clone)]
pub struct MatriculaDetalhada {
    pub id: i64,
    pub status: String,
    pub data_matricula: Option<NaiveDateTime>,
    pub curso_id: i64,
    pub curso_nome: String,
    pub curso_codigo: String,
    pub aluno_nome: String,
    pub aluno_email: String,
}

impl MatriculaDetalhada {
    /// Data de matrícula formatada para as páginas (ou "-" se ausente).
    pub fn data_fmt(&self) -> String {
        self.data_matricula
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}

/// Dados do formulário de confirmação de pagamento.
/// O armazenamento do ficheiro em si está fora do fluxo; o formulário
/// entrega o nome do comprovativo e o serviço guarda o caminho.
#[derive(Debug, Deserialize)]
pub struct PagamentoForm {
    pub payment_method: String, // "upi", "bank_transfer" ou "card"
    #[serde(default)]
    pub transaction_reference: Option<String>,
    #[serde(default)]
    pub receipt_image: Option<String>,
}
