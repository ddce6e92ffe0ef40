//! Authors repository

use sqlx::SqliteConnection;

use super::Repository;
use crate::{
    error::AppResult,
    models::author::{Author, AuthorInput, AuthorRow, NewAuthor},
};

const SELECT_AUTHOR: &str = r#"
    SELECT a.id, a.nome,
           p.id AS perfil_id, p.biografia, p.data_nascimento,
           (SELECT COUNT(*) FROM livros l WHERE l.autor_id = a.id) AS quantidade_livros
    FROM autores a
    LEFT JOIN perfis_autor p ON p.autor_id = a.id
"#;

/// Return the id of the author with this exact name, inserting it if new
pub async fn find_or_create_author(conn: &mut SqliteConnection, nome: &str) -> AppResult<i64> {
    let inserted = sqlx::query("INSERT INTO autores (nome) VALUES (?) ON CONFLICT (nome) DO NOTHING")
        .bind(nome)
        .execute(&mut *conn)
        .await?;

    let id = sqlx::query_scalar::<_, i64>("SELECT id FROM autores WHERE nome = ?")
        .bind(nome)
        .fetch_one(&mut *conn)
        .await?;

    if inserted.rows_affected() > 0 {
        tracing::info!("Created author id={} nome={:?}", id, nome);
    }
    Ok(id)
}

async fn fetch_author(conn: &mut SqliteConnection, id: i64) -> AppResult<Option<Author>> {
    let row = sqlx::query_as::<_, AuthorRow>(&format!("{} WHERE a.id = ?", SELECT_AUTHOR))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.map(Author::from))
}

impl Repository {
    /// List all authors in insertion order
    pub async fn authors_list(&self) -> AppResult<Vec<Author>> {
        let rows = sqlx::query_as::<_, AuthorRow>(&format!("{} ORDER BY a.id", SELECT_AUTHOR))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Author::from).collect())
    }

    /// Get an author by id
    pub async fn authors_get_by_id(&self, id: i64) -> AppResult<Option<Author>> {
        let mut conn = self.pool.acquire().await?;
        fetch_author(&mut conn, id).await
    }

    /// Check whether another author already uses this name
    pub async fn authors_name_exists(&self, nome: &str, exclude_id: Option<i64>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM autores WHERE nome = ? AND id IS NOT ?)",
        )
        .bind(nome)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Find-or-create an author by name outside of any other write
    pub async fn authors_find_or_create(&self, nome: &str) -> AppResult<i64> {
        let mut tx = self.begin_write().await?;
        let id = find_or_create_author(&mut tx, nome).await?;
        tx.commit().await?;
        Ok(id)
    }

    /// Create an author, with a profile when biography or birth date is given
    pub async fn authors_add(&self, data: &NewAuthor) -> AppResult<Author> {
        let mut tx = self.begin_write().await?;

        let id = sqlx::query_scalar::<_, i64>("INSERT INTO autores (nome) VALUES (?) RETURNING id")
            .bind(&data.nome)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| Repository::unique_violation(e, format!("Author '{}' already exists", data.nome)))?;

        if data.biografia.is_some() || data.data_nascimento.is_some() {
            sqlx::query(
                "INSERT INTO perfis_autor (autor_id, biografia, data_nascimento) VALUES (?, ?, ?)",
            )
            .bind(id)
            .bind(&data.biografia)
            .bind(&data.data_nascimento)
            .execute(&mut *tx)
            .await?;
        }

        let author = fetch_author(&mut tx, id).await?.ok_or(sqlx::Error::RowNotFound)?;
        tx.commit().await?;

        Ok(author)
    }

    /// Apply a partial update; returns `None` when the author does not exist
    pub async fn authors_update(&self, id: i64, data: &AuthorInput) -> AppResult<Option<Author>> {
        let mut tx = self.begin_write().await?;

        if fetch_author(&mut tx, id).await?.is_none() {
            return Ok(None);
        }

        if let Some(ref nome) = data.nome {
            sqlx::query("UPDATE autores SET nome = ? WHERE id = ?")
                .bind(nome)
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|e| Repository::unique_violation(e, format!("Author '{}' already exists", nome)))?;
        }

        if data.has_profile_fields() {
            sqlx::query(
                r#"
                INSERT INTO perfis_autor (autor_id, biografia, data_nascimento)
                VALUES (?, ?, ?)
                ON CONFLICT (autor_id) DO UPDATE SET
                    biografia = CASE WHEN ? THEN excluded.biografia ELSE perfis_autor.biografia END,
                    data_nascimento = CASE WHEN ? THEN excluded.data_nascimento ELSE perfis_autor.data_nascimento END
                "#,
            )
            .bind(id)
            .bind(data.biografia.clone().flatten())
            .bind(data.data_nascimento.clone().flatten())
            .bind(data.biografia.is_some())
            .bind(data.data_nascimento.is_some())
            .execute(&mut *tx)
            .await?;
        }

        let author = fetch_author(&mut tx, id).await?;
        tx.commit().await?;

        Ok(author)
    }

    /// Delete an author together with its books and profile
    pub async fn authors_delete(&self, id: i64) -> AppResult<bool> {
        let mut tx = self.begin_write().await?;

        sqlx::query(
            "DELETE FROM livro_categorias WHERE livro_id IN (SELECT id FROM livros WHERE autor_id = ?)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let books = sqlx::query("DELETE FROM livros WHERE autor_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM perfis_autor WHERE autor_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM autores WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        tx.commit().await?;
        tracing::info!("Deleted author id={} with {} book(s)", id, books.rows_affected());
        Ok(true)
    }
}
