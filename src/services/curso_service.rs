// src/services/curso_service.rs
use crate::{
    error::{AppError, AppResult},
    models::curso::{Curso, SecaoComVideos, SecaoCurso, VideoCurso},
};
use sqlx::SqlitePool;

// Classificação fixa do catálogo (navegação nível -> área -> cursos)
pub const NIVEIS: &[&str] = &["1st PU", "2nd PU"];
pub const AREAS: &[&str] = &["Science", "Commerce", "Arts"];

/// Campos de criação/edição de um curso, já validados pelo handler.
#[derive(Debug)]
pub struct CursoCampos {
    pub codigo: String,
    pub nome: String,
    pub descricao: Option<String>,
    pub link: Option<String>,
    pub creditos: i64,
    pub vagas: i64,
    pub taxa: f64,
    pub categoria: String,
    pub nivel: Option<String>,
    pub area: Option<String>,
}

pub async fn listar_cursos(db_pool: &SqlitePool) -> AppResult<Vec<Curso>> {
    let cursos = sqlx::query_as::<_, Curso>("SELECT * FROM cursos ORDER BY id ASC")
        .fetch_all(db_pool)
        .await?;
    Ok(cursos)
}

/// Cursos de um nível + área (passo final da navegação do catálogo).
pub async fn listar_por_nivel_area(
    db_pool: &SqlitePool,
    nivel: &str,
    area: &str,
) -> AppResult<Vec<Curso>> {
    let cursos = sqlx::query_as::<_, Curso>(
        "SELECT * FROM cursos WHERE nivel = ? AND area = ? ORDER BY nome ASC",
    )
    .bind(nivel)
    .bind(area)
    .fetch_all(db_pool)
    .await?;
    Ok(cursos)
}

/// Busca livre por nome ou código.
pub async fn buscar_cursos(db_pool: &SqlitePool, termo: &str) -> AppResult<Vec<Curso>> {
    let padrao = format!("%{}%", termo.trim());
    let cursos = sqlx::query_as::<_, Curso>(
        "SELECT * FROM cursos WHERE nome LIKE ? OR codigo LIKE ? ORDER BY nome ASC",
    )
    .bind(&padrao)
    .bind(&padrao)
    .fetch_all(db_pool)
    .await?;
    Ok(cursos)
}

pub async fn find_curso(db_pool: &SqlitePool, curso_id: i64) -> AppResult<Option<Curso>> {
    let curso = sqlx::query_as::<_, Curso>("SELECT * FROM cursos WHERE id = ?")
        .bind(curso_id)
        .fetch_optional(db_pool)
        .await?;
    Ok(curso)
}

pub async fn criar_curso(db_pool: &SqlitePool, campos: &CursoCampos) -> AppResult<i64> {
    tracing::info!("Tentando criar curso '{}'", campos.codigo);

    let existe: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cursos WHERE codigo = ?")
        .bind(&campos.codigo)
        .fetch_one(db_pool)
        .await?;
    if existe > 0 {
        tracing::warn!("Criação falhou: código '{}' já existe.", campos.codigo);
        return Err(AppError::CourseCodeTaken);
    }

    let id = sqlx::query(
        r#"
        INSERT INTO cursos (codigo, nome, descricao, link, creditos, vagas, taxa, categoria, nivel, area)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&campos.codigo)
    .bind(&campos.nome)
    .bind(&campos.descricao)
    .bind(&campos.link)
    .bind(campos.creditos)
    .bind(campos.vagas)
    .bind(campos.taxa)
    .bind(&campos.categoria)
    .bind(&campos.nivel)
    .bind(&campos.area)
    .execute(db_pool)
    .await?
    .last_insert_rowid();

    tracing::info!("✅ Curso '{}' criado (id {}).", campos.codigo, id);
    Ok(id)
}

pub async fn atualizar_curso(
    db_pool: &SqlitePool,
    curso_id: i64,
    campos: &CursoCampos,
) -> AppResult<()> {
    let rows = sqlx::query(
        r#"
        UPDATE cursos SET
            codigo = ?, nome = ?, descricao = ?, link = ?,
            creditos = ?, vagas = ?, taxa = ?, categoria = ?, nivel = ?, area = ?
        WHERE id = ?
        "#,
    )
    .bind(&campos.codigo)
    .bind(&campos.nome)
    .bind(&campos.descricao)
    .bind(&campos.link)
    .bind(campos.creditos)
    .bind(campos.vagas)
    .bind(campos.taxa)
    .bind(&campos.categoria)
    .bind(&campos.nivel)
    .bind(&campos.area)
    .bind(curso_id)
    .execute(db_pool)
    .await?
    .rows_affected();

    if rows == 0 {
        return Err(AppError::NotFound);
    }
    tracing::info!("✅ Curso {} atualizado.", curso_id);
    Ok(())
}

/// Apaga um curso com cascata explícita dentro da transação:
/// vídeos -> seções -> matrículas -> curso.
pub async fn apagar_curso(db_pool: &SqlitePool, curso_id: i64) -> AppResult<()> {
    let mut tx = db_pool.begin().await?;

    sqlx::query("DELETE FROM videos_curso WHERE curso_id = ?")
        .bind(curso_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM secoes_curso WHERE curso_id = ?")
        .bind(curso_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM matriculas WHERE curso_id = ?")
        .bind(curso_id)
        .execute(&mut *tx)
        .await?;
    let rows = sqlx::query("DELETE FROM cursos WHERE id = ?")
        .bind(curso_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if rows == 0 {
        // Nada a apagar: desfaz e avisa o chamador
        tx.rollback().await?;
        return Err(AppError::NotFound);
    }

    tx.commit().await?;
    tracing::info!("✅ Curso {} apagado (vídeos, seções e matrículas incluídos).", curso_id);
    Ok(())
}

// --- Seções e vídeos ---

pub async fn criar_secao(
    db_pool: &SqlitePool,
    curso_id: i64,
    titulo: &str,
    ordem: i64,
) -> AppResult<i64> {
    let id = sqlx::query("INSERT INTO secoes_curso (curso_id, titulo, ordem) VALUES (?, ?, ?)")
        .bind(curso_id)
        .bind(titulo)
        .bind(ordem)
        .execute(db_pool)
        .await?
        .last_insert_rowid();
    Ok(id)
}

/// Apaga uma seção e os vídeos dela (cascata explícita). Retorna o
/// curso_id para o redirect do handler.
pub async fn apagar_secao(db_pool: &SqlitePool, secao_id: i64) -> AppResult<i64> {
    let secao = sqlx::query_as::<_, SecaoCurso>("SELECT * FROM secoes_curso WHERE id = ?")
        .bind(secao_id)
        .fetch_optional(db_pool)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut tx = db_pool.begin().await?;
    sqlx::query("DELETE FROM videos_curso WHERE secao_id = ?")
        .bind(secao_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM secoes_curso WHERE id = ?")
        .bind(secao_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(secao.curso_id)
}

pub async fn criar_video(
    db_pool: &SqlitePool,
    curso_id: i64,
    secao_id: Option<i64>,
    titulo: &str,
    video_url: &str,
    duracao: Option<&str>,
) -> AppResult<i64> {
    let id = sqlx::query(
        "INSERT INTO videos_curso (curso_id, secao_id, titulo, video_url, duracao) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(curso_id)
    .bind(secao_id)
    .bind(titulo)
    .bind(video_url)
    .bind(duracao)
    .execute(db_pool)
    .await?
    .last_insert_rowid();
    Ok(id)
}

pub async fn apagar_video(db_pool: &SqlitePool, video_id: i64) -> AppResult<i64> {
    let video = sqlx::query_as::<_, VideoCurso>("SELECT * FROM videos_curso WHERE id = ?")
        .bind(video_id)
        .fetch_optional(db_pool)
        .await?
        .ok_or(AppError::NotFound)?;

    sqlx::query("DELETE FROM videos_curso WHERE id = ?")
        .bind(video_id)
        .execute(db_pool)
        .await?;
    Ok(video.curso_id)
}

/// Seções do curso, ordenadas, cada uma com os seus vídeos.
pub async fn listar_secoes_com_videos(
    db_pool: &SqlitePool,
    curso_id: i64,
) -> AppResult<Vec<SecaoComVideos>> {
    let secoes = sqlx::query_as::<_, SecaoCurso>(
        "SELECT * FROM secoes_curso WHERE curso_id = ? ORDER BY ordem ASC, id ASC",
    )
    .bind(curso_id)
    .fetch_all(db_pool)
    .await?;

    let mut resultado = Vec::with_capacity(secoes.len());
    for secao in secoes {
        let videos = sqlx::query_as::<_, VideoCurso>(
            "SELECT * FROM videos_curso WHERE secao_id = ? ORDER BY ordem ASC, id ASC",
        )
        .bind(secao.id)
        .fetch_all(db_pool)
        .await?;
        resultado.push(SecaoComVideos { secao, videos });
    }
    Ok(resultado)
}

/// Vídeos do curso sem seção atribuída.
pub async fn listar_videos_orfaos(
    db_pool: &SqlitePool,
    curso_id: i64,
) -> AppResult<Vec<VideoCurso>> {
    let videos = sqlx::query_as::<_, VideoCurso>(
        "SELECT * FROM videos_curso WHERE curso_id = ? AND secao_id IS NULL ORDER BY ordem ASC, id ASC",
    )
    .bind(curso_id)
    .fetch_all(db_pool)
    .await?;
    Ok(videos)
}

pub async fn contar_cursos(db_pool: &SqlitePool) -> AppResult<i64> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cursos")
        .fetch_one(db_pool)
        .await?;
    Ok(total)
}
