//! Categories repository

use sqlx::SqliteConnection;

use super::Repository;
use crate::{error::AppResult, models::category::Category};

const SELECT_CATEGORY: &str = r#"
    SELECT c.id, c.nome,
           (SELECT COUNT(*) FROM livro_categorias lc WHERE lc.categoria_id = c.id) AS quantidade_livros
    FROM categorias c
"#;

/// Return the id of the category with this exact name, inserting it if new
pub async fn find_or_create_category(conn: &mut SqliteConnection, nome: &str) -> AppResult<i64> {
    let inserted = sqlx::query("INSERT INTO categorias (nome) VALUES (?) ON CONFLICT (nome) DO NOTHING")
        .bind(nome)
        .execute(&mut *conn)
        .await?;

    let id = sqlx::query_scalar::<_, i64>("SELECT id FROM categorias WHERE nome = ?")
        .bind(nome)
        .fetch_one(&mut *conn)
        .await?;

    if inserted.rows_affected() > 0 {
        tracing::info!("Created category id={} nome={:?}", id, nome);
    }
    Ok(id)
}

impl Repository {
    /// List all categories with their book counts
    pub async fn categories_list(&self) -> AppResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>(&format!("{} ORDER BY c.id", SELECT_CATEGORY))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Get a category by id
    pub async fn categories_get_by_id(&self, id: i64) -> AppResult<Option<Category>> {
        let row = sqlx::query_as::<_, Category>(&format!("{} WHERE c.id = ?", SELECT_CATEGORY))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn categories_name_exists(&self, nome: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categorias WHERE nome = ?)")
            .bind(nome)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Find-or-create a category by name outside of any other write
    pub async fn categories_find_or_create(&self, nome: &str) -> AppResult<i64> {
        let mut tx = self.begin_write().await?;
        let id = find_or_create_category(&mut tx, nome).await?;
        tx.commit().await?;
        Ok(id)
    }

    /// Create a category; a taken name is a conflict
    pub async fn categories_add(&self, nome: &str) -> AppResult<Category> {
        let mut tx = self.begin_write().await?;
        let id = sqlx::query_scalar::<_, i64>("INSERT INTO categorias (nome) VALUES (?) RETURNING id")
            .bind(nome)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| Repository::unique_violation(e, format!("Category '{}' already exists", nome)))?;
        tx.commit().await?;

        Ok(Category {
            id,
            nome: nome.to_string(),
            quantidade_livros: 0,
        })
    }

    /// Delete a category and unlink it from every book
    pub async fn categories_delete(&self, id: i64) -> AppResult<bool> {
        let mut tx = self.begin_write().await?;

        sqlx::query("DELETE FROM livro_categorias WHERE categoria_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM categorias WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
