// Testes do fluxo de matrícula: reserva de vaga, pagamento e invariantes.
use chrono::{Datelike, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use uuid::Uuid;

use unimatricula::db::MIGRATOR;
use unimatricula::error::AppError;
use unimatricula::models::matricula::PagamentoForm;
use unimatricula::models::user::{Aluno, User};
use unimatricula::services::{matricula_service, user_service};
use unimatricula::services::notify_service::Mailer;

async fn pool_teste() -> SqlitePool {
    // max_connections(1): em SQLite, cada conexão ':memory:' teria a sua
    // própria base de dados
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    MIGRATOR.run(&pool).await.unwrap();
    pool
}

/// Semeia um aluno diretamente por SQL (o hash da senha não interessa
/// para estes testes).
async fn criar_aluno(pool: &SqlitePool, email: &str) -> (User, Aluno) {
    let user_id = sqlx::query(
        "INSERT INTO users (name, email, password_hash, role) VALUES ('Aluno Teste', ?, 'x', 'student')",
    )
    .bind(email)
    .execute(pool)
    .await
    .unwrap()
    .last_insert_rowid();

    sqlx::query("INSERT INTO alunos (user_id, numero_matricula) VALUES (?, ?)")
        .bind(user_id)
        .bind(format!("UNIV2026{:03}", user_id))
        .execute(pool)
        .await
        .unwrap();

    let user = user_service::find_user_by_id(pool, user_id).await.unwrap().unwrap();
    let aluno = user_service::find_aluno_by_user(pool, user_id).await.unwrap().unwrap();
    (user, aluno)
}

async fn criar_curso(pool: &SqlitePool, codigo: &str, vagas: i64) -> i64 {
    sqlx::query(
        "INSERT INTO cursos (codigo, nome, creditos, vagas, taxa) VALUES (?, 'Curso Teste', 4, ?, 500.0)",
    )
    .bind(codigo)
    .bind(vagas)
    .execute(pool)
    .await
    .unwrap()
    .last_insert_rowid()
}

async fn vagas_do_curso(pool: &SqlitePool, curso_id: i64) -> i64 {
    sqlx::query_scalar("SELECT vagas FROM cursos WHERE id = ?")
        .bind(curso_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

fn form_pagamento(metodo: &str, referencia: Option<&str>, recibo: Option<&str>) -> PagamentoForm {
    PagamentoForm {
        payment_method: metodo.to_string(),
        transaction_reference: referencia.map(str::to_string),
        receipt_image: recibo.map(str::to_string),
    }
}

#[tokio::test]
async fn inscrever_cria_matricula_pendente_e_reserva_vaga() {
    let pool = pool_teste().await;
    let (_, aluno) = criar_aluno(&pool, "a@uni.edu").await;
    let curso_id = criar_curso(&pool, "MAT101", 30).await;

    let matricula_id = matricula_service::inscrever(&pool, aluno.id, curso_id).await.unwrap();

    let matricula = matricula_service::find_matricula(&pool, matricula_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(matricula.status, "pending_payment");
    assert_eq!(matricula.curso_id, curso_id);
    assert_eq!(vagas_do_curso(&pool, curso_id).await, 29);
}

#[tokio::test]
async fn inscrever_duas_vezes_falha_already_enrolled() {
    let pool = pool_teste().await;
    let (_, aluno) = criar_aluno(&pool, "a@uni.edu").await;
    let curso_id = criar_curso(&pool, "MAT101", 30).await;

    matricula_service::inscrever(&pool, aluno.id, curso_id).await.unwrap();
    let repetida = matricula_service::inscrever(&pool, aluno.id, curso_id).await;

    assert!(matches!(repetida, Err(AppError::AlreadyEnrolled)));
    // A segunda tentativa não pode ter mexido nas vagas
    assert_eq!(vagas_do_curso(&pool, curso_id).await, 29);
}

#[tokio::test]
async fn curso_com_uma_vaga_aceita_exatamente_um_aluno() {
    let pool = pool_teste().await;
    let (_, aluno1) = criar_aluno(&pool, "a@uni.edu").await;
    let (_, aluno2) = criar_aluno(&pool, "b@uni.edu").await;
    let curso_id = criar_curso(&pool, "FIS101", 1).await;

    let primeira = matricula_service::inscrever(&pool, aluno1.id, curso_id).await;
    let segunda = matricula_service::inscrever(&pool, aluno2.id, curso_id).await;

    assert!(primeira.is_ok());
    assert!(matches!(segunda, Err(AppError::CourseFull)));
    assert_eq!(vagas_do_curso(&pool, curso_id).await, 0);

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM matriculas WHERE curso_id = ?")
        .bind(curso_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(total, 1);
}

#[tokio::test]
async fn vagas_nunca_ficam_negativas() {
    let pool = pool_teste().await;
    let curso_id = criar_curso(&pool, "QUI101", 2).await;

    let mut sucessos = 0;
    for i in 0..5 {
        let (_, aluno) = criar_aluno(&pool, &format!("aluno{}@uni.edu", i)).await;
        if matricula_service::inscrever(&pool, aluno.id, curso_id).await.is_ok() {
            sucessos += 1;
        }
        assert!(vagas_do_curso(&pool, curso_id).await >= 0);
    }

    assert_eq!(sucessos, 2);
    assert_eq!(vagas_do_curso(&pool, curso_id).await, 0);
}

#[tokio::test]
async fn inscrever_em_curso_inexistente_falha() {
    let pool = pool_teste().await;
    let (_, aluno) = criar_aluno(&pool, "a@uni.edu").await;

    let resultado = matricula_service::inscrever(&pool, aluno.id, 9999).await;
    assert!(matches!(resultado, Err(AppError::NotFound)));
}

#[tokio::test]
async fn bank_transfer_sem_comprovativo_falha_e_mantem_pendente() {
    let pool = pool_teste().await;
    let mailer = Mailer::desativado();
    let (user, aluno) = criar_aluno(&pool, "a@uni.edu").await;
    let curso_id = criar_curso(&pool, "MAT101", 30).await;
    let matricula_id = matricula_service::inscrever(&pool, aluno.id, curso_id).await.unwrap();

    // Referência sem comprovativo
    let so_referencia = matricula_service::confirmar_pagamento(
        &pool, &mailer, matricula_id, &aluno, &user,
        &form_pagamento("bank_transfer", Some("UTR123"), None),
    )
    .await;
    assert!(matches!(so_referencia, Err(AppError::MissingPaymentProof)));

    // Comprovativo sem referência
    let so_recibo = matricula_service::confirmar_pagamento(
        &pool, &mailer, matricula_id, &aluno, &user,
        &form_pagamento("bank_transfer", None, Some("recibo.png")),
    )
    .await;
    assert!(matches!(so_recibo, Err(AppError::MissingPaymentProof)));

    let matricula = matricula_service::find_matricula(&pool, matricula_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(matricula.status, "pending_payment");
}

#[tokio::test]
async fn bank_transfer_completo_matricula_e_guarda_comprovativo() {
    let pool = pool_teste().await;
    let mailer = Mailer::desativado();
    let (user, aluno) = criar_aluno(&pool, "a@uni.edu").await;
    let curso_id = criar_curso(&pool, "MAT101", 30).await;
    let matricula_id = matricula_service::inscrever(&pool, aluno.id, curso_id).await.unwrap();

    let id_transacao = matricula_service::confirmar_pagamento(
        &pool, &mailer, matricula_id, &aluno, &user,
        &form_pagamento("bank_transfer", Some("UTR123"), Some("recibo.png")),
    )
    .await
    .unwrap();
    assert_eq!(id_transacao, "UTR123");

    let matricula = matricula_service::find_matricula(&pool, matricula_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(matricula.status, "enrolled");
    assert_eq!(matricula.referencia_transacao.as_deref(), Some("UTR123"));
    let recibo = matricula.recibo_imagem.unwrap();
    assert!(recibo.starts_with("uploads/recibos/"));
    assert!(recibo.ends_with("recibo.png"));
}

#[tokio::test]
async fn upi_sem_referencia_usa_confirmacao_manual() {
    let pool = pool_teste().await;
    let mailer = Mailer::desativado();
    let (user, aluno) = criar_aluno(&pool, "a@uni.edu").await;
    let curso_id = criar_curso(&pool, "MAT101", 30).await;
    let matricula_id = matricula_service::inscrever(&pool, aluno.id, curso_id).await.unwrap();

    let id_transacao = matricula_service::confirmar_pagamento(
        &pool, &mailer, matricula_id, &aluno, &user,
        &form_pagamento("upi", None, None),
    )
    .await
    .unwrap();

    assert_eq!(id_transacao, "Manual-Confirmation");
    let matricula = matricula_service::find_matricula(&pool, matricula_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(matricula.status, "enrolled");
}

#[tokio::test]
async fn cartao_gera_id_de_transacao() {
    let pool = pool_teste().await;
    let mailer = Mailer::desativado();
    let (user, aluno) = criar_aluno(&pool, "a@uni.edu").await;
    let curso_id = criar_curso(&pool, "MAT101", 30).await;
    let matricula_id = matricula_service::inscrever(&pool, aluno.id, curso_id).await.unwrap();

    let id_transacao = matricula_service::confirmar_pagamento(
        &pool, &mailer, matricula_id, &aluno, &user,
        &form_pagamento("card", None, None),
    )
    .await
    .unwrap();

    assert!(Uuid::parse_str(&id_transacao).is_ok());
}

#[tokio::test]
async fn confirmar_matricula_de_outro_aluno_falha_not_owner() {
    let pool = pool_teste().await;
    let mailer = Mailer::desativado();
    let (_, dono) = criar_aluno(&pool, "dono@uni.edu").await;
    let (outro_user, outro_aluno) = criar_aluno(&pool, "outro@uni.edu").await;
    let curso_id = criar_curso(&pool, "MAT101", 30).await;
    let matricula_id = matricula_service::inscrever(&pool, dono.id, curso_id).await.unwrap();

    let resultado = matricula_service::confirmar_pagamento(
        &pool, &mailer, matricula_id, &outro_aluno, &outro_user,
        &form_pagamento("upi", Some("REF1"), None),
    )
    .await;

    assert!(matches!(resultado, Err(AppError::NotOwner)));
    let matricula = matricula_service::find_matricula(&pool, matricula_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(matricula.status, "pending_payment");
}

#[tokio::test]
async fn confirmar_pagamento_ja_pago_e_noop() {
    let pool = pool_teste().await;
    let mailer = Mailer::desativado();
    let (user, aluno) = criar_aluno(&pool, "a@uni.edu").await;
    let curso_id = criar_curso(&pool, "MAT101", 30).await;
    let matricula_id = matricula_service::inscrever(&pool, aluno.id, curso_id).await.unwrap();

    matricula_service::confirmar_pagamento(
        &pool, &mailer, matricula_id, &aluno, &user,
        &form_pagamento("upi", Some("REF-ORIGINAL"), None),
    )
    .await
    .unwrap();

    // Segunda confirmação (mesmo sem comprovativo) devolve sucesso e
    // não altera a referência guardada
    let repetida = matricula_service::confirmar_pagamento(
        &pool, &mailer, matricula_id, &aluno, &user,
        &form_pagamento("bank_transfer", None, None),
    )
    .await
    .unwrap();
    assert_eq!(repetida, "REF-ORIGINAL");

    let matricula = matricula_service::find_matricula(&pool, matricula_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(matricula.status, "enrolled");
    assert_eq!(matricula.referencia_transacao.as_deref(), Some("REF-ORIGINAL"));
}

#[tokio::test]
async fn registo_gera_numero_de_matricula_derivado() {
    let pool = pool_teste().await;

    let user_id = user_service::registar_aluno(&pool, "Novo Aluno", "novo@uni.edu", "senha123", "senha123")
        .await
        .unwrap();

    let aluno = user_service::find_aluno_by_user(&pool, user_id).await.unwrap().unwrap();
    let esperado = format!("UNIV{}{:03}", Utc::now().year(), user_id);
    assert_eq!(aluno.numero_matricula.as_deref(), Some(esperado.as_str()));

    // Email repetido é recusado
    let repetido =
        user_service::registar_aluno(&pool, "Outro", "novo@uni.edu", "senha123", "senha123").await;
    assert!(matches!(repetido, Err(AppError::EmailTaken)));
}

#[tokio::test]
async fn apagar_curso_remove_matriculas_em_cascata() {
    let pool = pool_teste().await;
    let (_, aluno) = criar_aluno(&pool, "a@uni.edu").await;
    let curso_id = criar_curso(&pool, "MAT101", 30).await;
    matricula_service::inscrever(&pool, aluno.id, curso_id).await.unwrap();

    unimatricula::services::curso_service::apagar_curso(&pool, curso_id).await.unwrap();

    let restantes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM matriculas WHERE curso_id = ?")
        .bind(curso_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(restantes, 0);
}
