// src/services/matricula_service.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        matricula::{Matricula, MatriculaDetalhada, PagamentoForm, STATUS_MATRICULADO, STATUS_PENDENTE},
        user::{Aluno, User},
    },
    services::notify_service::Mailer,
};
use sqlx::SqlitePool;
use uuid::Uuid;

// Caminho do regulamento anexado ao email de confirmação
const REGULAMENTO_PDF: &str = "static/files/regulamento.pdf";

/// Inscreve um aluno num curso: reserva de vaga + criação da matrícula
/// em 'pending_payment', como unidade atómica única.
///
/// O decremento é um check-and-decrement na própria UPDATE (vagas > 0),
/// dentro da mesma transação do INSERT: duas inscrições concorrentes
/// nunca podem ultrapassar a lotação, e se o INSERT falhar a vaga volta
/// com o rollback.
pub async fn inscrever(db_pool: &SqlitePool, aluno_id: i64, curso_id: i64) -> AppResult<i64> {
    tracing::info!("Inscrição: aluno {} no curso {}", aluno_id, curso_id);

    let mut tx = db_pool.begin().await?;

    let ja_existe: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM matriculas WHERE aluno_id = ? AND curso_id = ?",
    )
    .bind(aluno_id)
    .bind(curso_id)
    .fetch_one(&mut *tx)
    .await?;
    if ja_existe > 0 {
        return Err(AppError::AlreadyEnrolled);
    }

    let reservadas = sqlx::query("UPDATE cursos SET vagas = vagas - 1 WHERE id = ? AND vagas > 0")
        .bind(curso_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if reservadas == 0 {
        // Ou o curso não existe, ou está lotado
        let existe: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cursos WHERE id = ?")
            .bind(curso_id)
            .fetch_one(&mut *tx)
            .await?;
        return Err(if existe > 0 { AppError::CourseFull } else { AppError::NotFound });
    }

    let matricula_id = sqlx::query(
        "INSERT INTO matriculas (aluno_id, curso_id, status) VALUES (?, ?, ?)",
    )
    .bind(aluno_id)
    .bind(curso_id)
    .bind(STATUS_PENDENTE)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    tx.commit().await?;
    tracing::info!("✅ Matrícula {} criada (pendente de pagamento).", matricula_id);
    Ok(matricula_id)
}

pub async fn find_matricula(db_pool: &SqlitePool, matricula_id: i64) -> AppResult<Option<Matricula>> {
    let matricula = sqlx::query_as::<_, Matricula>("SELECT * FROM matriculas WHERE id = ?")
        .bind(matricula_id)
        .fetch_optional(db_pool)
        .await?;
    Ok(matricula)
}

pub async fn find_por_aluno_curso(
    db_pool: &SqlitePool,
    aluno_id: i64,
    curso_id: i64,
) -> AppResult<Option<Matricula>> {
    let matricula = sqlx::query_as::<_, Matricula>(
        "SELECT * FROM matriculas WHERE aluno_id = ? AND curso_id = ?",
    )
    .bind(aluno_id)
    .bind(curso_id)
    .fetch_optional(db_pool)
    .await?;
    Ok(matricula)
}

/// Confirma o pagamento de uma matrícula. A confirmação é declarativa
/// ("eu paguei"): não há verificação junto de gateway — limitação
/// assumida da fronteira de confiança.
///
/// Regras por método:
/// - bank_transfer: exige referência E comprovativo;
/// - upi: referência opcional (assume "Manual-Confirmation");
/// - card: gera um id de transação próprio.
///
/// No sucesso passa o status a 'enrolled', guarda referência/recibo e
/// dispara a notificação de confirmação em best-effort: falha no envio
/// nunca desfaz a mudança de status (fica só no log).
pub async fn confirmar_pagamento(
    db_pool: &SqlitePool,
    mailer: &Mailer,
    matricula_id: i64,
    aluno: &Aluno,
    user: &User,
    form: &PagamentoForm,
) -> AppResult<String> {
    let matricula = find_matricula(db_pool, matricula_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if matricula.aluno_id != aluno.id {
        tracing::warn!(
            "Acesso negado: aluno {} tentou pagar a matrícula {} (dono: {}).",
            aluno.id, matricula_id, matricula.aluno_id
        );
        return Err(AppError::NotOwner);
    }

    // Já paga: no-op com sucesso (idempotente do ponto de vista do aluno)
    if matricula.status == STATUS_MATRICULADO {
        tracing::debug!("Matrícula {} já estava paga; nada a fazer.", matricula_id);
        return Ok(matricula
            .referencia_transacao
            .unwrap_or_else(|| "N/A".to_string()));
    }

    let referencia = form
        .transaction_reference
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty());
    let recibo = form
        .receipt_image
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty());

    let (id_transacao, caminho_recibo) = match form.payment_method.as_str() {
        "bank_transfer" => {
            let (Some(referencia), Some(recibo)) = (referencia, recibo) else {
                return Err(AppError::MissingPaymentProof);
            };
            let caminho = format!("uploads/recibos/recibo_{}_{}", matricula_id, recibo);
            (referencia.to_string(), Some(caminho))
        }
        "card" => (Uuid::new_v4().to_string(), None),
        // upi e restantes: referência opcional, confirmada manualmente
        _ => (
            referencia.unwrap_or("Manual-Confirmation").to_string(),
            None,
        ),
    };

    sqlx::query(
        "UPDATE matriculas SET status = ?, referencia_transacao = ?, recibo_imagem = ? WHERE id = ?",
    )
    .bind(STATUS_MATRICULADO)
    .bind(&id_transacao)
    .bind(&caminho_recibo)
    .bind(matricula_id)
    .execute(db_pool)
    .await?;

    tracing::info!("✅ Pagamento confirmado: matrícula {} -> enrolled.", matricula_id);

    // Notificação de confirmação: best-effort, nunca reverte o status
    if let Err(e) = enviar_confirmacao(db_pool, mailer, &matricula, user, &id_transacao).await {
        tracing::warn!("Falha ao notificar confirmação da matrícula {}: {:?}", matricula_id, e);
    }

    Ok(id_transacao)
}

async fn enviar_confirmacao(
    db_pool: &SqlitePool,
    mailer: &Mailer,
    matricula: &Matricula,
    user: &User,
    id_transacao: &str,
) -> AppResult<()> {
    let curso = crate::services::curso_service::find_curso(db_pool, matricula.curso_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let assunto = format!("Matrícula confirmada: {}", curso.nome);
    let corpo = format!(
        "Olá {},\n\n\
         A sua matrícula foi confirmada no seguinte curso:\n\n\
         Curso: {} ({})\n\
         Créditos: {}\n\
         Descrição: {}\n\
         Material do curso: {}\n\
         ID da transação: {}\n\n\
         Em anexo segue o regulamento da universidade.\n\n\
         Bons estudos!\nAdministração",
        user.name,
        curso.nome,
        curso.codigo,
        curso.creditos,
        curso.descricao.as_deref().unwrap_or("N/A"),
        curso.link.as_deref().unwrap_or("N/A"),
        id_transacao,
    );

    if !mailer.enviar(&user.email, &assunto, &corpo, Some(REGULAMENTO_PDF)).await {
        tracing::warn!("Email de confirmação não enviado para {}.", user.email);
    }
    Ok(())
}

/// Matrículas de um aluno, com os dados do curso (dashboard do aluno).
pub async fn listar_do_aluno(
    db_pool: &SqlitePool,
    aluno_id: i64,
) -> AppResult<Vec<MatriculaDetalhada>> {
    let linhas = sqlx::query_as::<_, MatriculaDetalhada>(
        r#"
        SELECT m.id, m.status, m.data_matricula,
               c.id as curso_id, c.nome as curso_nome, c.codigo as curso_codigo,
               u.name as aluno_nome, u.email as aluno_email
        FROM matriculas m
        JOIN cursos c ON c.id = m.curso_id
        JOIN alunos a ON a.id = m.aluno_id
        JOIN users u ON u.id = a.user_id
        WHERE m.aluno_id = ?
        ORDER BY m.id ASC
        "#,
    )
    .bind(aluno_id)
    .fetch_all(db_pool)
    .await?;
    Ok(linhas)
}

/// IDs dos cursos em que o aluno já tem matrícula (qualquer status).
pub async fn ids_cursos_do_aluno(db_pool: &SqlitePool, aluno_id: i64) -> AppResult<Vec<i64>> {
    let ids: Vec<i64> = sqlx::query_scalar("SELECT curso_id FROM matriculas WHERE aluno_id = ?")
        .bind(aluno_id)
        .fetch_all(db_pool)
        .await?;
    Ok(ids)
}

/// Todas as matrículas com aluno e curso (listagem/relatório do admin).
pub async fn listar_todas(db_pool: &SqlitePool) -> AppResult<Vec<MatriculaDetalhada>> {
    let linhas = sqlx::query_as::<_, MatriculaDetalhada>(
        r#"
        SELECT m.id, m.status, m.data_matricula,
               c.id as curso_id, c.nome as curso_nome, c.codigo as curso_codigo,
               u.name as aluno_nome, u.email as aluno_email
        FROM matriculas m
        JOIN alunos a ON a.id = m.aluno_id
        JOIN users u ON u.id = a.user_id
        JOIN cursos c ON c.id = m.curso_id
        ORDER BY m.id ASC
        "#,
    )
    .fetch_all(db_pool)
    .await?;
    Ok(linhas)
}

pub async fn contar_matriculas(db_pool: &SqlitePool) -> AppResult<i64> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM matriculas")
        .fetch_one(db_pool)
        .await?;
    Ok(total)
}

/// Relatório de matrículas em CSV (download na área de admin).
pub async fn relatorio_csv(db_pool: &SqlitePool) -> AppResult<Vec<u8>> {
    let linhas = listar_todas(db_pool).await?;

    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(["ID", "Aluno", "Email", "Curso", "Código", "Data", "Status"])
        .map_err(|e| {
            tracing::error!("Erro ao escrever cabeçalho CSV: {:?}", e);
            AppError::InternalServerError
        })?;

    for linha in linhas {
        let data = linha
            .data_matricula
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        wtr.write_record([
            linha.id.to_string(),
            linha.aluno_nome,
            linha.aluno_email,
            linha.curso_nome,
            linha.curso_codigo,
            data,
            linha.status,
        ])
        .map_err(|e| {
            tracing::error!("Erro ao escrever linha CSV: {:?}", e);
            AppError::InternalServerError
        })?;
    }

    wtr.into_inner().map_err(|e| {
        tracing::error!("Erro ao finalizar CSV: {:?}", e);
        AppError::InternalServerError
    })
}

// --- Pagamento por UPI ---

/// Monta o deep link UPI e a URL da imagem QR para a página de pagamento.
/// Formato: upi://pay?pa=<id>&pn=<nome>&am=<valor>&tn=<nota>&cu=INR
pub fn gerar_link_upi(upi_id: &str, nome: &str, valor: f64, nota: &str) -> (String, String) {
    let upi_url = format!(
        "upi://pay?pa={}&pn={}&am={:.2}&tn={}&cu=INR",
        upi_id,
        urlencoding::encode(nome),
        valor,
        urlencoding::encode(nota),
    );
    // Sem gerador local de QR: a página embute a imagem de um serviço externo
    let qr_url = format!(
        "https://api.qrserver.com/v1/create-qr-code/?size=250x250&data={}",
        urlencoding::encode(&upi_url)
    );
    (qr_url, upi_url)
}

#[cfg(test)]
mod tests {
    use super::gerar_link_upi;

    #[test]
    fn link_upi_tem_valor_com_dois_decimais() {
        let (qr, upi) = gerar_link_upi("uni@banco", "Universidade", 500.0, "Matrícula 7");
        assert!(upi.starts_with("upi://pay?pa=uni@banco&"));
        assert!(upi.contains("am=500.00"));
        assert!(upi.ends_with("&cu=INR"));
        assert!(qr.contains("api.qrserver.com"));
    }
}
