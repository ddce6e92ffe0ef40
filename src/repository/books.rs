//! Books repository.
//!
//! Writes resolve the author and categories by name, creating any that do not
//! exist yet, inside the same transaction as the book row.

use std::collections::HashMap;

use sqlx::{Row, SqliteConnection};

use super::{authors::find_or_create_author, categories::find_or_create_category, Repository};
use crate::{
    error::AppResult,
    models::book::{dedup_names, Book, BookInput, BookRow, NewBook},
};

const SELECT_BOOK: &str = r#"
    SELECT l.id, l.titulo, l.ano, l.autor_id, a.nome AS autor_nome
    FROM livros l
    LEFT JOIN autores a ON a.id = l.autor_id
"#;

/// Category names of one book, in attachment order
async fn book_categories(conn: &mut SqliteConnection, livro_id: i64) -> AppResult<Vec<String>> {
    let names = sqlx::query_scalar::<_, String>(
        r#"
        SELECT c.nome
        FROM livro_categorias lc
        JOIN categorias c ON c.id = lc.categoria_id
        WHERE lc.livro_id = ?
        ORDER BY lc.posicao
        "#,
    )
    .bind(livro_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(names)
}

async fn fetch_book(conn: &mut SqliteConnection, id: i64) -> AppResult<Option<Book>> {
    let row = sqlx::query_as::<_, BookRow>(&format!("{} WHERE l.id = ?", SELECT_BOOK))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(row) => {
            let categorias = book_categories(conn, row.id).await?;
            Ok(Some(Book::from_row(row, categorias)))
        }
        None => Ok(None),
    }
}

/// Replace the category set of a book; unknown names are created
async fn set_book_categories(
    conn: &mut SqliteConnection,
    livro_id: i64,
    names: &[String],
) -> AppResult<()> {
    sqlx::query("DELETE FROM livro_categorias WHERE livro_id = ?")
        .bind(livro_id)
        .execute(&mut *conn)
        .await?;

    for (idx, nome) in dedup_names(names).iter().enumerate() {
        let categoria_id = find_or_create_category(conn, nome).await?;

        sqlx::query("INSERT INTO livro_categorias (livro_id, categoria_id, posicao) VALUES (?, ?, ?)")
            .bind(livro_id)
            .bind(categoria_id)
            .bind(idx as i64)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

impl Repository {
    /// List all books in insertion order
    pub async fn books_list(&self) -> AppResult<Vec<Book>> {
        let rows = sqlx::query_as::<_, BookRow>(&format!("{} ORDER BY l.id", SELECT_BOOK))
            .fetch_all(&self.pool)
            .await?;

        let links = sqlx::query(
            r#"
            SELECT lc.livro_id, c.nome
            FROM livro_categorias lc
            JOIN categorias c ON c.id = lc.categoria_id
            ORDER BY lc.livro_id, lc.posicao
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut categories: HashMap<i64, Vec<String>> = HashMap::new();
        for link in links {
            categories
                .entry(link.get("livro_id"))
                .or_default()
                .push(link.get("nome"));
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let categorias = categories.remove(&row.id).unwrap_or_default();
                Book::from_row(row, categorias)
            })
            .collect())
    }

    /// Get a book by id
    pub async fn books_get_by_id(&self, id: i64) -> AppResult<Option<Book>> {
        let mut conn = self.pool.acquire().await?;
        fetch_book(&mut conn, id).await
    }

    /// Create a book, creating its author and categories when unknown
    pub async fn books_add(&self, data: &NewBook) -> AppResult<Book> {
        let mut tx = self.begin_write().await?;

        let autor_id = find_or_create_author(&mut tx, &data.autor).await?;

        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO livros (titulo, ano, autor_id) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(&data.titulo)
        .bind(data.ano)
        .bind(autor_id)
        .fetch_one(&mut *tx)
        .await?;

        set_book_categories(&mut tx, id, &data.categorias).await?;

        let book = fetch_book(&mut tx, id).await?.ok_or(sqlx::Error::RowNotFound)?;
        tx.commit().await?;

        Ok(book)
    }

    /// Apply a partial update; returns `None` when the book does not exist.
    ///
    /// Absent fields are left unchanged, an explicit `null` clears the author,
    /// year or categories.
    pub async fn books_update(&self, id: i64, data: &BookInput) -> AppResult<Option<Book>> {
        let mut tx = self.begin_write().await?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM livros WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let autor_id = match &data.autor {
            Some(Some(nome)) => Some(find_or_create_author(&mut tx, nome).await?),
            _ => None,
        };

        sqlx::query(
            r#"
            UPDATE livros SET
                titulo = COALESCE(?, titulo),
                ano = CASE WHEN ? THEN ? ELSE ano END,
                autor_id = CASE WHEN ? THEN ? ELSE autor_id END
            WHERE id = ?
            "#,
        )
        .bind(data.titulo.as_deref())
        .bind(data.ano.is_some())
        .bind(data.ano.flatten())
        .bind(data.autor.is_some())
        .bind(autor_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if let Some(names) = &data.categorias {
            set_book_categories(&mut tx, id, names.as_deref().unwrap_or(&[])).await?;
        }

        let book = fetch_book(&mut tx, id).await?;
        tx.commit().await?;

        Ok(book)
    }

    /// Delete a book and its category links; returns whether it existed
    pub async fn books_delete(&self, id: i64) -> AppResult<bool> {
        let mut tx = self.begin_write().await?;

        sqlx::query("DELETE FROM livro_categorias WHERE livro_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM livros WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{file_repository, test_repository};

    fn dune() -> NewBook {
        NewBook {
            titulo: "Dune".into(),
            autor: "Frank Herbert".into(),
            categorias: vec!["Sci-Fi".into(), "Classic".into()],
            ano: Some(1965),
        }
    }

    async fn count(repo: &Repository, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&repo.pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn add_resolves_relations() {
        let repo = test_repository().await;

        let book = repo.books_add(&dune()).await.unwrap();
        assert_eq!(book.titulo, "Dune");
        assert_eq!(book.autor.as_deref(), Some("Frank Herbert"));
        assert_eq!(book.categorias, vec!["Sci-Fi", "Classic"]);
        assert_eq!(book.ano, Some(1965));

        let fetched = repo.books_get_by_id(book.id).await.unwrap();
        assert_eq!(fetched, Some(book));
    }

    #[tokio::test]
    async fn add_reuses_existing_author_and_categories() {
        let repo = test_repository().await;

        repo.books_add(&dune()).await.unwrap();
        let mut messiah = dune();
        messiah.titulo = "Dune Messiah".into();
        messiah.categorias = vec!["Sci-Fi".into()];
        repo.books_add(&messiah).await.unwrap();

        assert_eq!(count(&repo, "autores").await, 1);
        assert_eq!(count(&repo, "categorias").await, 2);
        assert_eq!(count(&repo, "livros").await, 2);
    }

    #[tokio::test]
    async fn add_deduplicates_category_names() {
        let repo = test_repository().await;

        let mut data = dune();
        data.categorias = vec!["Sci-Fi".into(), "Sci-Fi".into()];
        let book = repo.books_add(&data).await.unwrap();

        assert_eq!(book.categorias, vec!["Sci-Fi"]);
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let repo = test_repository().await;
        assert_eq!(repo.books_get_by_id(42).await.unwrap(), None);
    }

    #[tokio::test]
    async fn list_keeps_insertion_order() {
        let repo = test_repository().await;

        let first = repo.books_add(&dune()).await.unwrap();
        let mut other = dune();
        other.titulo = "Children of Dune".into();
        other.categorias = vec![];
        let second = repo.books_add(&other).await.unwrap();

        let books = repo.books_list().await.unwrap();
        assert_eq!(books, vec![first, second]);
    }

    #[tokio::test]
    async fn update_title_only_keeps_other_fields() {
        let repo = test_repository().await;
        let book = repo.books_add(&dune()).await.unwrap();

        let patch = BookInput {
            titulo: Some("X".into()),
            ..Default::default()
        };
        let updated = repo.books_update(book.id, &patch).await.unwrap().unwrap();

        assert_eq!(updated.titulo, "X");
        assert_eq!(updated.autor, book.autor);
        assert_eq!(updated.ano, book.ano);
        assert_eq!(updated.categorias, book.categorias);
    }

    #[tokio::test]
    async fn update_creates_new_author_and_clears_fields() {
        let repo = test_repository().await;
        let book = repo.books_add(&dune()).await.unwrap();

        let patch = BookInput {
            autor: Some(Some("Brian Herbert".into())),
            ano: Some(None),
            categorias: Some(None),
            ..Default::default()
        };
        let updated = repo.books_update(book.id, &patch).await.unwrap().unwrap();

        assert_eq!(updated.autor.as_deref(), Some("Brian Herbert"));
        assert_eq!(updated.ano, None);
        assert!(updated.categorias.is_empty());
        assert_eq!(count(&repo, "autores").await, 2);
    }

    #[tokio::test]
    async fn update_null_author_unlinks() {
        let repo = test_repository().await;
        let book = repo.books_add(&dune()).await.unwrap();

        let patch = BookInput {
            autor: Some(None),
            ..Default::default()
        };
        let updated = repo.books_update(book.id, &patch).await.unwrap().unwrap();
        assert_eq!(updated.autor, None);
        assert_eq!(updated.autor_id, None);
    }

    #[tokio::test]
    async fn update_missing_returns_none_without_side_effects() {
        let repo = test_repository().await;

        let patch = BookInput {
            autor: Some(Some("Nobody".into())),
            ..Default::default()
        };
        assert_eq!(repo.books_update(99, &patch).await.unwrap(), None);
        assert_eq!(count(&repo, "autores").await, 0);
    }

    #[tokio::test]
    async fn delete_removes_links_but_keeps_category() {
        let repo = test_repository().await;
        let book = repo.books_add(&dune()).await.unwrap();

        assert!(repo.books_delete(book.id).await.unwrap());
        assert!(!repo.books_delete(book.id).await.unwrap());
        assert_eq!(repo.books_get_by_id(book.id).await.unwrap(), None);
        assert_eq!(count(&repo, "livro_categorias").await, 0);
        assert_eq!(count(&repo, "categorias").await, 2);
        assert_eq!(count(&repo, "autores").await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_adds_on_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let repo = file_repository(&dir).await;

        let handles: Vec<_> = (0..40)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    let data = NewBook {
                        titulo: format!("Dune {}", i),
                        autor: "Frank Herbert".into(),
                        categorias: vec!["Sci-Fi".into()],
                        ano: None,
                    };
                    repo.books_add(&data).await
                })
            })
            .collect();

        for handle in handles {
            let book = handle.await.unwrap().unwrap();
            assert_eq!(book.autor.as_deref(), Some("Frank Herbert"));
            assert_eq!(book.categorias, vec!["Sci-Fi"]);
        }

        assert_eq!(count(&repo, "livros").await, 40);
        assert_eq!(count(&repo, "autores").await, 1);
        assert_eq!(count(&repo, "categorias").await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_updates_and_deletes_on_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let repo = file_repository(&dir).await;

        let mut ids = Vec::new();
        for i in 0..10 {
            let mut data = dune();
            data.titulo = format!("Dune {}", i);
            ids.push(repo.books_add(&data).await.unwrap().id);
        }

        let handles: Vec<_> = ids
            .iter()
            .enumerate()
            .map(|(i, &id)| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    if i % 2 == 0 {
                        let patch = BookInput {
                            autor: Some(Some(format!("Autor {}", i))),
                            categorias: Some(Some(vec!["Nova".into()])),
                            ..Default::default()
                        };
                        repo.books_update(id, &patch).await.map(|book| book.is_some())
                    } else {
                        repo.books_delete(id).await
                    }
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().unwrap());
        }

        assert_eq!(count(&repo, "livros").await, 5);
        assert_eq!(count(&repo, "autores").await, 6);
    }
}
