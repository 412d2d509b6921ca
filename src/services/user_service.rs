// src/services/user_service.rs
use crate::{
    error::{AppError, AppResult},
    models::user::{Aluno, AlunoComUser, User},
};
use chrono::{Datelike, Utc};
use sqlx::SqlitePool;

/// Busca um utilizador pelo email (identidade de login).
pub async fn find_user_by_email(db_pool: &SqlitePool, email: &str) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(db_pool)
        .await?;
    Ok(user)
}

/// Busca um utilizador pelo ID.
pub async fn find_user_by_id(db_pool: &SqlitePool, user_id: i64) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(db_pool)
        .await?;
    Ok(user)
}

/// Busca a ficha de aluno associada a um utilizador.
pub async fn find_aluno_by_user(db_pool: &SqlitePool, user_id: i64) -> AppResult<Option<Aluno>> {
    let aluno = sqlx::query_as::<_, Aluno>("SELECT * FROM alunos WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(db_pool)
        .await?;
    Ok(aluno)
}

/// Regista um novo aluno: cria o User (role 'student') e a ficha de aluno
/// com o número de matrícula derivado, numa única transação.
///
/// Formato do número: UNIV + ano corrente + id do utilizador com 3 dígitos.
pub async fn registar_aluno(
    db_pool: &SqlitePool,
    nome: &str,
    email: &str,
    senha: &str,
    confirmacao: &str,
) -> AppResult<i64> {
    tracing::info!("Tentando registar aluno: {}", email);

    if senha != confirmacao {
        return Err(AppError::PasswordMismatch);
    }

    if find_user_by_email(db_pool, email).await?.is_some() {
        tracing::warn!("Registo falhou: email '{}' já existe.", email);
        return Err(AppError::EmailTaken);
    }

    let password_hash = crate::services::auth_service::hash_password(senha).await?;

    let mut tx = db_pool.begin().await?;

    let user_id = sqlx::query(
        "INSERT INTO users (name, email, password_hash, role) VALUES (?, ?, ?, 'student')",
    )
    .bind(nome)
    .bind(email)
    .bind(&password_hash)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    let ano = Utc::now().year();
    let numero = format!("UNIV{}{:03}", ano, user_id);

    sqlx::query("INSERT INTO alunos (user_id, numero_matricula) VALUES (?, ?)")
        .bind(user_id)
        .bind(&numero)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    tracing::info!("✅ Aluno '{}' registado (nº {}).", email, numero);
    Ok(user_id)
}

/// Atualiza o perfil do próprio aluno (telefone, endereço, nascimento, foto).
pub async fn atualizar_perfil(
    db_pool: &SqlitePool,
    user_id: i64,
    telefone: Option<&str>,
    endereco: Option<&str>,
    data_nascimento: Option<&str>,
    foto_perfil: Option<&str>,
) -> AppResult<()> {
    let rows = sqlx::query(
        r#"
        UPDATE alunos SET
            telefone = ?,
            endereco = ?,
            data_nascimento = COALESCE(?, data_nascimento),
            foto_perfil = COALESCE(?, foto_perfil)
        WHERE user_id = ?
        "#,
    )
    .bind(telefone)
    .bind(endereco)
    .bind(data_nascimento)
    .bind(foto_perfil)
    .bind(user_id)
    .execute(db_pool)
    .await?
    .rows_affected();

    if rows == 0 {
        tracing::warn!("Perfil não atualizado: aluno do user {} não encontrado.", user_id);
        return Err(AppError::NotFound);
    }
    Ok(())
}

// --- Funções para Admin ---

/// Lista os alunos (users com role 'student' + ficha), com busca opcional
/// por nome ou email.
pub async fn listar_alunos(
    db_pool: &SqlitePool,
    busca: Option<&str>,
) -> AppResult<Vec<AlunoComUser>> {
    let base = r#"
        SELECT u.id as user_id, u.name, u.email,
               a.numero_matricula, a.telefone, a.data_nascimento
        FROM users u
        JOIN alunos a ON a.user_id = u.id
        WHERE u.role = 'student'
    "#;

    let alunos = match busca.filter(|b| !b.trim().is_empty()) {
        Some(b) => {
            let padrao = format!("%{}%", b.trim());
            sqlx::query_as::<_, AlunoComUser>(&format!(
                "{base} AND (u.name LIKE ? OR u.email LIKE ?) ORDER BY u.id ASC"
            ))
            .bind(&padrao)
            .bind(&padrao)
            .fetch_all(db_pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, AlunoComUser>(&format!("{base} ORDER BY u.id ASC"))
                .fetch_all(db_pool)
                .await?
        }
    };
    Ok(alunos)
}

/// Edição de aluno pelo admin: dados do User + ficha. Se a ficha não
/// existir (aluno importado/antigo), é criada na mesma transação.
pub async fn atualizar_aluno_admin(
    db_pool: &SqlitePool,
    user_id: i64,
    nome: &str,
    email: &str,
    telefone: Option<&str>,
    data_nascimento: Option<&str>,
) -> AppResult<()> {
    let user = find_user_by_id(db_pool, user_id).await?.ok_or(AppError::NotFound)?;
    if user.role != "student" {
        tracing::warn!("Tentativa de editar não-aluno {} pela gestão de alunos.", user_id);
        return Err(AppError::Unauthorized);
    }

    let mut tx = db_pool.begin().await?;

    sqlx::query("UPDATE users SET name = ?, email = ? WHERE id = ?")
        .bind(nome)
        .bind(email)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    let atualizados = sqlx::query(
        "UPDATE alunos SET telefone = ?, data_nascimento = ? WHERE user_id = ?",
    )
    .bind(telefone)
    .bind(data_nascimento)
    .bind(user_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if atualizados == 0 {
        sqlx::query("INSERT INTO alunos (user_id, telefone, data_nascimento) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(telefone)
            .bind(data_nascimento)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    tracing::info!("✅ Dados do aluno {} atualizados.", user_id);
    Ok(())
}

/// Apaga um aluno com cascata explícita, sequenciada dentro da transação:
/// matrículas -> ficha de aluno -> utilizador.
pub async fn apagar_aluno(db_pool: &SqlitePool, user_id: i64) -> AppResult<()> {
    let user = find_user_by_id(db_pool, user_id).await?.ok_or(AppError::NotFound)?;
    if user.role != "student" {
        tracing::warn!("Recusado: apagar não-aluno {} pela gestão de alunos.", user_id);
        return Err(AppError::Unauthorized);
    }

    let mut tx = db_pool.begin().await?;

    sqlx::query(
        "DELETE FROM matriculas WHERE aluno_id IN (SELECT id FROM alunos WHERE user_id = ?)",
    )
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM alunos WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    tracing::info!("✅ Aluno {} apagado (matrículas e ficha incluídas).", user_id);
    Ok(())
}

/// Troca a senha de um utilizador (usada pelas definições do admin).
pub async fn atualizar_senha(
    db_pool: &SqlitePool,
    user_id: i64,
    nova_senha: &str,
) -> AppResult<()> {
    let hash = crate::services::auth_service::hash_password(nova_senha).await?;
    let rows = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
        .bind(&hash)
        .bind(user_id)
        .execute(db_pool)
        .await?
        .rows_affected();

    if rows == 0 {
        return Err(AppError::NotFound);
    }
    tracing::info!("✅ Senha alterada para o user {}.", user_id);
    Ok(())
}

pub async fn contar_alunos(db_pool: &SqlitePool) -> AppResult<i64> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'student'")
        .fetch_one(db_pool)
        .await?;
    Ok(total)
}

/// Garante que existe pelo menos um admin (seed de arranque).
pub async fn seed_admin(db_pool: &SqlitePool, email: &str, senha: &str) -> AppResult<()> {
    let existe: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'admin'")
        .fetch_one(db_pool)
        .await?;
    if existe > 0 {
        return Ok(());
    }

    let hash = crate::services::auth_service::hash_password(senha).await?;
    sqlx::query("INSERT INTO users (name, email, password_hash, role) VALUES ('Admin', ?, ?, 'admin')")
        .bind(email)
        .bind(&hash)
        .execute(db_pool)
        .await?;
    tracing::info!("✅ Utilizador admin inicial criado ({}).", email);
    Ok(())
}
