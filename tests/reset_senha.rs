// Testes do reset de senha por OTP: emissão, validade e consumo único.
use chrono::{Duration, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use unimatricula::db::MIGRATOR;
use unimatricula::error::AppError;
use unimatricula::services::notify_service::Mailer;
use unimatricula::services::{reset_service, user_service};

async fn pool_teste() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    MIGRATOR.run(&pool).await.unwrap();
    pool
}

async fn criar_user(pool: &SqlitePool, email: &str) -> i64 {
    sqlx::query(
        "INSERT INTO users (name, email, password_hash, role) VALUES ('Aluno Teste', ?, 'hash-antigo', 'student')",
    )
    .bind(email)
    .execute(pool)
    .await
    .unwrap()
    .last_insert_rowid()
}

async fn codigo_emitido(pool: &SqlitePool, email: &str) -> String {
    let user = user_service::find_user_by_email(pool, email).await.unwrap().unwrap();
    user.reset_otp.expect("código deveria ter sido emitido")
}

#[tokio::test]
async fn solicitar_emite_codigo_de_seis_digitos_com_validade() {
    let pool = pool_teste().await;
    let mailer = Mailer::desativado();
    criar_user(&pool, "a@uni.edu").await;

    reset_service::solicitar_reset(&pool, &mailer, "a@uni.edu", "localhost:3000")
        .await
        .unwrap();

    let user = user_service::find_user_by_email(&pool, "a@uni.edu").await.unwrap().unwrap();
    let codigo = user.reset_otp.unwrap();
    assert_eq!(codigo.len(), 6);
    assert!(codigo.chars().all(|c| c.is_ascii_digit()));

    // Validade de 15 minutos a partir da emissão
    let expira = user.reset_otp_expiry.unwrap();
    let agora = Utc::now().naive_utc();
    assert!(expira > agora + Duration::minutes(14));
    assert!(expira < agora + Duration::minutes(16));
}

#[tokio::test]
async fn solicitar_para_email_desconhecido_responde_sucesso() {
    let pool = pool_teste().await;
    let mailer = Mailer::desativado();

    // Sem conta: não há erro nem distinção observável
    let resultado =
        reset_service::solicitar_reset(&pool, &mailer, "ninguem@uni.edu", "localhost:3000").await;
    assert!(resultado.is_ok());
}

#[tokio::test]
async fn validar_codigo_desconhecido_falha_invalid_code() {
    let pool = pool_teste().await;
    criar_user(&pool, "a@uni.edu").await;

    let resultado = reset_service::validar_codigo(&pool, "000000").await;
    assert!(matches!(resultado, Err(AppError::InvalidCode)));
}

#[tokio::test]
async fn codigo_expirado_e_rejeitado_e_fica_no_lugar() {
    let pool = pool_teste().await;
    let mailer = Mailer::desativado();
    criar_user(&pool, "a@uni.edu").await;

    reset_service::solicitar_reset(&pool, &mailer, "a@uni.edu", "localhost:3000")
        .await
        .unwrap();
    let codigo = codigo_emitido(&pool, "a@uni.edu").await;

    // Pedido em T, tentativa em T+16min: simulado recuando a validade
    let passado = Utc::now().naive_utc() - Duration::minutes(1);
    sqlx::query("UPDATE users SET reset_otp_expiry = ? WHERE email = 'a@uni.edu'")
        .bind(passado)
        .execute(&pool)
        .await
        .unwrap();

    let resultado = reset_service::validar_codigo(&pool, &codigo).await;
    assert!(matches!(resultado, Err(AppError::CodeExpired)));

    // Sem auto-limpeza: o código expirado continua na conta até novo pedido
    let user = user_service::find_user_by_email(&pool, "a@uni.edu").await.unwrap().unwrap();
    assert_eq!(user.reset_otp.as_deref(), Some(codigo.as_str()));

    // Um novo pedido substitui o código expirado
    reset_service::solicitar_reset(&pool, &mailer, "a@uni.edu", "localhost:3000")
        .await
        .unwrap();
    let novo = codigo_emitido(&pool, "a@uni.edu").await;
    assert!(reset_service::validar_codigo(&pool, &novo).await.is_ok());
}

#[tokio::test]
async fn concluir_troca_a_senha_e_consome_o_codigo() {
    let pool = pool_teste().await;
    let mailer = Mailer::desativado();
    criar_user(&pool, "a@uni.edu").await;

    reset_service::solicitar_reset(&pool, &mailer, "a@uni.edu", "localhost:3000")
        .await
        .unwrap();
    let codigo = codigo_emitido(&pool, "a@uni.edu").await;

    reset_service::concluir_reset(&pool, &codigo, "senha-nova-1", "senha-nova-1")
        .await
        .unwrap();

    let user = user_service::find_user_by_email(&pool, "a@uni.edu").await.unwrap().unwrap();
    assert!(bcrypt::verify("senha-nova-1", &user.password_hash).unwrap());
    assert!(user.reset_otp.is_none());
    assert!(user.reset_otp_expiry.is_none());

    // Código consumido: nunca mais é aceite
    let reuso = reset_service::concluir_reset(&pool, &codigo, "outra-senha", "outra-senha").await;
    assert!(matches!(reuso, Err(AppError::InvalidCode)));
}

#[tokio::test]
async fn confirmacao_diferente_falha_e_deixa_o_codigo_valido() {
    let pool = pool_teste().await;
    let mailer = Mailer::desativado();
    criar_user(&pool, "a@uni.edu").await;

    reset_service::solicitar_reset(&pool, &mailer, "a@uni.edu", "localhost:3000")
        .await
        .unwrap();
    let codigo = codigo_emitido(&pool, "a@uni.edu").await;

    let resultado =
        reset_service::concluir_reset(&pool, &codigo, "senha-nova-1", "diferente").await;
    assert!(matches!(resultado, Err(AppError::PasswordMismatch)));

    // A senha antiga não mudou e o código continua utilizável
    let user = user_service::find_user_by_email(&pool, "a@uni.edu").await.unwrap().unwrap();
    assert_eq!(user.password_hash, "hash-antigo");
    assert!(reset_service::validar_codigo(&pool, &codigo).await.is_ok());
}
