//! Author endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

use crate::{error::AppResult, models::author::AuthorOutput, AppState};

use super::{AuthenticatedUser, DeletedResponse, IdPath, JsonPayload};

/// List all authors
pub async fn list_authors(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<AuthorOutput>>> {
    let authors = state.services.catalog.list_authors().await?;
    Ok(Json(authors))
}

/// Get author by ID
pub async fn get_author(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    IdPath(id): IdPath,
) -> AppResult<Json<AuthorOutput>> {
    let author = state.services.catalog.get_author(id).await?;
    Ok(Json(author))
}

/// Create an author with optional biography and birth date
pub async fn create_author(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    JsonPayload(payload): JsonPayload,
) -> AppResult<(StatusCode, Json<AuthorOutput>)> {
    let author = state.services.catalog.create_author(&payload).await?;
    Ok((StatusCode::CREATED, Json(author)))
}

/// Partially update an author
pub async fn update_author(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    IdPath(id): IdPath,
    JsonPayload(payload): JsonPayload,
) -> AppResult<Json<AuthorOutput>> {
    let author = state.services.catalog.update_author(id, &payload).await?;
    Ok(Json(author))
}

/// Delete an author together with its books
pub async fn delete_author(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    IdPath(id): IdPath,
) -> AppResult<Json<DeletedResponse>> {
    state.services.catalog.delete_author(id).await?;
    Ok(Json(DeletedResponse {
        mensagem: format!("Autor {} removido com sucesso!", id),
    }))
}
