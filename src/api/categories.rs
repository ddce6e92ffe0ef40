//! Category endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

use crate::{error::AppResult, models::category::Category, AppState};

use super::{AuthenticatedUser, DeletedResponse, IdPath, JsonPayload};

pub async fn list_categories(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Category>>> {
    let categories = state.services.catalog.list_categories().await?;
    Ok(Json(categories))
}

pub async fn get_category(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    IdPath(id): IdPath,
) -> AppResult<Json<Category>> {
    let category = state.services.catalog.get_category(id).await?;
    Ok(Json(category))
}

pub async fn create_category(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    JsonPayload(payload): JsonPayload,
) -> AppResult<(StatusCode, Json<Category>)> {
    let category = state.services.catalog.create_category(&payload).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn delete_category(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    IdPath(id): IdPath,
) -> AppResult<Json<DeletedResponse>> {
    state.services.catalog.delete_category(id).await?;
    Ok(Json(DeletedResponse {
        mensagem: format!("Categoria {} removida com sucesso!", id),
    }))
}
