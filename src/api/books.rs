//! Book endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

use crate::{error::AppResult, models::book::BookOutput, AppState};

use super::{AuthenticatedUser, DeletedResponse, IdPath, JsonPayload};

/// List all books
pub async fn list_books(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BookOutput>>> {
    let books = state.services.catalog.list_books().await?;
    Ok(Json(books))
}

/// Get book by ID
pub async fn get_book(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    IdPath(id): IdPath,
) -> AppResult<Json<BookOutput>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book))
}

/// Create a book, creating its author and categories when unknown
pub async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    JsonPayload(payload): JsonPayload,
) -> AppResult<(StatusCode, Json<BookOutput>)> {
    let book = state.services.catalog.create_book(&payload).await?;
    tracing::debug!("Book {} created by account {}", book.id, claims.user_id);
    Ok((StatusCode::CREATED, Json(book)))
}

/// Partially update a book
pub async fn update_book(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    IdPath(id): IdPath,
    JsonPayload(payload): JsonPayload,
) -> AppResult<Json<BookOutput>> {
    let book = state.services.catalog.update_book(id, &payload).await?;
    Ok(Json(book))
}

/// Delete a book
pub async fn delete_book(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    IdPath(id): IdPath,
) -> AppResult<Json<DeletedResponse>> {
    state.services.catalog.delete_book(id).await?;
    Ok(Json(DeletedResponse {
        mensagem: format!("Livro {} removido com sucesso!", id),
    }))
}
