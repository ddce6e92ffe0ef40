//! Catalog management service: books, authors and categories.
//!
//! Request bodies arrive as untyped JSON; each write validates the payload,
//! maps it into the typed input, then hands it to the repository.

use serde_json::Value;

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{AuthorInput, AuthorOutput, NewAuthor},
        book::{BookInput, BookOutput, NewBook},
        category::{Category, CreateCategory},
    },
    repository::Repository,
    validation::{validate_author_payload, validate_book_payload, validate_category_payload},
};

fn check(errors: Vec<String>) -> AppResult<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Check that the store answers
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }

    // =========================================================================
    // BOOKS
    // =========================================================================

    pub async fn list_books(&self) -> AppResult<Vec<BookOutput>> {
        let books = self.repository.books_list().await?;
        Ok(books.into_iter().map(BookOutput::from).collect())
    }

    pub async fn get_book(&self, id: i64) -> AppResult<BookOutput> {
        self.repository
            .books_get_by_id(id)
            .await?
            .map(BookOutput::from)
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
    }

    /// Create a book; `titulo` and `autor` are required
    pub async fn create_book(&self, payload: &Value) -> AppResult<BookOutput> {
        check(validate_book_payload(payload, true))?;

        let data = NewBook::try_from(BookInput::from_payload(payload)?)?;
        let book = self.repository.books_add(&data).await?;

        tracing::info!("Created book id={} titulo={:?}", book.id, book.titulo);
        Ok(book.into())
    }

    /// Update only the fields present in the payload
    pub async fn update_book(&self, id: i64, payload: &Value) -> AppResult<BookOutput> {
        check(validate_book_payload(payload, false))?;

        let data = BookInput::from_payload(payload)?;
        let book = self
            .repository
            .books_update(id, &data)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))?;

        tracing::info!("Updated book id={}", id);
        Ok(book.into())
    }

    pub async fn delete_book(&self, id: i64) -> AppResult<()> {
        if !self.repository.books_delete(id).await? {
            return Err(AppError::NotFound(format!("Book {} not found", id)));
        }
        tracing::info!("Deleted book id={}", id);
        Ok(())
    }

    // =========================================================================
    // AUTHORS
    // =========================================================================

    pub async fn list_authors(&self) -> AppResult<Vec<AuthorOutput>> {
        let authors = self.repository.authors_list().await?;
        Ok(authors.into_iter().map(AuthorOutput::from).collect())
    }

    pub async fn get_author(&self, id: i64) -> AppResult<AuthorOutput> {
        self.repository
            .authors_get_by_id(id)
            .await?
            .map(AuthorOutput::from)
            .ok_or_else(|| AppError::NotFound(format!("Author {} not found", id)))
    }

    /// Create an author; the name must be unique
    pub async fn create_author(&self, payload: &Value) -> AppResult<AuthorOutput> {
        check(validate_author_payload(payload, true))?;

        let data = NewAuthor::try_from(AuthorInput::from_payload(payload)?)?;
        if self.repository.authors_name_exists(&data.nome, None).await? {
            return Err(AppError::Conflict(format!("Author '{}' already exists", data.nome)));
        }

        let author = self.repository.authors_add(&data).await?;
        tracing::info!("Created author id={} nome={:?}", author.id, author.nome);
        Ok(author.into())
    }

    pub async fn update_author(&self, id: i64, payload: &Value) -> AppResult<AuthorOutput> {
        check(validate_author_payload(payload, false))?;

        let data = AuthorInput::from_payload(payload)?;
        if let Some(ref nome) = data.nome {
            if self.repository.authors_name_exists(nome, Some(id)).await? {
                return Err(AppError::Conflict(format!("Author '{}' already exists", nome)));
            }
        }

        let author = self
            .repository
            .authors_update(id, &data)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Author {} not found", id)))?;

        tracing::info!("Updated author id={}", id);
        Ok(author.into())
    }

    /// Delete an author along with all of its books
    pub async fn delete_author(&self, id: i64) -> AppResult<()> {
        if !self.repository.authors_delete(id).await? {
            return Err(AppError::NotFound(format!("Author {} not found", id)));
        }
        Ok(())
    }

    // =========================================================================
    // CATEGORIES
    // =========================================================================

    pub async fn list_categories(&self) -> AppResult<Vec<Category>> {
        self.repository.categories_list().await
    }

    pub async fn get_category(&self, id: i64) -> AppResult<Category> {
        self.repository
            .categories_get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
    }

    pub async fn create_category(&self, payload: &Value) -> AppResult<Category> {
        check(validate_category_payload(payload))?;

        let data: CreateCategory = serde_json::from_value(payload.clone())
            .map_err(|e| AppError::BadRequest(format!("Invalid category payload: {}", e)))?;
        if self.repository.categories_name_exists(&data.nome).await? {
            return Err(AppError::Conflict(format!("Category '{}' already exists", data.nome)));
        }

        let category = self.repository.categories_add(&data.nome).await?;
        tracing::info!("Created category id={} nome={:?}", category.id, category.nome);
        Ok(category)
    }

    pub async fn delete_category(&self, id: i64) -> AppResult<()> {
        if !self.repository.categories_delete(id).await? {
            return Err(AppError::NotFound(format!("Category {} not found", id)));
        }
        tracing::info!("Deleted category id={}", id);
        Ok(())
    }
}
