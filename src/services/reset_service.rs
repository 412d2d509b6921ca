// src/services/reset_service.rs
//
// Reset de senha por código OTP: NoReset -> CodeIssued -> (Validated | Expired).
// O código tem 6 dígitos e vale exatamente 15 minutos a partir da emissão.
use crate::{
    error::{AppError, AppResult},
    models::user::User,
    services::notify_service::Mailer,
};
use chrono::{Duration, Utc};
use rand::{thread_rng, Rng};
use sqlx::SqlitePool;

pub const VALIDADE_MINUTOS: i64 = 15;

/// Código uniforme de 6 dígitos (100000..=999999).
fn gerar_codigo() -> String {
    format!("{}", thread_rng().gen_range(100_000..=999_999))
}

/// Pede um reset para um email. A resposta é sempre em forma de sucesso,
/// exista a conta ou não: a existência do email nunca é revelada ao
/// requisitante (a fuga por flash message da versão antiga foi removida).
pub async fn solicitar_reset(
    db_pool: &SqlitePool,
    mailer: &Mailer,
    email: &str,
    host: &str,
) -> AppResult<()> {
    let Some(user) = crate::services::user_service::find_user_by_email(db_pool, email).await?
    else {
        tracing::debug!("Reset pedido para email desconhecido; resposta uniforme.");
        return Ok(());
    };

    let codigo = gerar_codigo();
    let expira = Utc::now().naive_utc() + Duration::minutes(VALIDADE_MINUTOS);

    sqlx::query("UPDATE users SET reset_otp = ?, reset_otp_expiry = ? WHERE id = ?")
        .bind(&codigo)
        .bind(expira)
        .bind(user.id)
        .execute(db_pool)
        .await?;

    tracing::info!("Código de reset emitido para o user {} (15 min).", user.id);

    // Link que pré-preenche o código na página de reset manual
    let link = format!("http://{}/manual-reset?otp={}", host, codigo);
    let corpo = format!(
        "O seu código de recuperação de senha é: {}\n\n\
         Introduza o código na página de recuperação, ou use este link:\n{}\n\n\
         O código expira em {} minutos.\n\
         Se não pediu esta recuperação, ignore este email.",
        codigo, link, VALIDADE_MINUTOS
    );

    // Best-effort: a falha de envio fica no log, a resposta não muda
    if !mailer.enviar(&user.email, "Código de recuperação de senha", &corpo, None).await {
        tracing::warn!("Email de reset não enviado para o user {}.", user.id);
    }

    Ok(())
}

/// Valida um código: devolve o titular quando o código existe e ainda
/// está dentro da validade. Um código expirado NÃO é limpo aqui — fica
/// na conta até um novo pedido o substituir (comportamento herdado,
/// registado como questão em aberto no DESIGN.md).
pub async fn validar_codigo(db_pool: &SqlitePool, codigo: &str) -> AppResult<User> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE reset_otp = ?")
        .bind(codigo)
        .fetch_optional(db_pool)
        .await?
        .ok_or(AppError::InvalidCode)?;

    let agora = Utc::now().naive_utc();
    match user.reset_otp_expiry {
        Some(expira) if agora <= expira => Ok(user),
        _ => Err(AppError::CodeExpired),
    }
}

/// Conclui o reset: revalida o código, confere a confirmação, troca o
/// hash e limpa código + validade incondicionalmente. Depois disto o
/// mesmo código nunca mais é aceite.
pub async fn concluir_reset(
    db_pool: &SqlitePool,
    codigo: &str,
    nova_senha: &str,
    confirmacao: &str,
) -> AppResult<()> {
    let user = validar_codigo(db_pool, codigo).await?;

    if nova_senha != confirmacao {
        return Err(AppError::PasswordMismatch);
    }

    let hash = crate::services::auth_service::hash_password(nova_senha).await?;

    sqlx::query(
        "UPDATE users SET password_hash = ?, reset_otp = NULL, reset_otp_expiry = NULL WHERE id = ?",
    )
    .bind(&hash)
    .bind(user.id)
    .execute(db_pool)
    .await?;

    tracing::info!("✅ Senha redefinida para o user {}; código consumido.", user.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::gerar_codigo;

    #[test]
    fn codigo_tem_sempre_seis_digitos() {
        for _ in 0..200 {
            let c = gerar_codigo();
            assert_eq!(c.len(), 6);
            assert!(c.chars().all(|ch| ch.is_ascii_digit()));
        }
    }
}
