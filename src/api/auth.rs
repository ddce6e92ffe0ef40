//! Registration and login endpoints

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::{AppError, AppResult},
    models::user::{AccountPublic, LoginRequest, RegisterRequest, TokenResponse},
    AppState,
};

use super::JsonPayload;

fn parse<T: serde::de::DeserializeOwned>(payload: serde_json::Value) -> AppResult<T> {
    serde_json::from_value(payload).map_err(|e| AppError::BadRequest(format!("Invalid payload: {}", e)))
}

/// Register a new account
pub async fn register(
    State(state): State<AppState>,
    JsonPayload(payload): JsonPayload,
) -> AppResult<(StatusCode, Json<AccountPublic>)> {
    let request: RegisterRequest = parse(payload)?;
    let account = state.services.auth.register(request).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// Authenticate with email and password
pub async fn login(
    State(state): State<AppState>,
    JsonPayload(payload): JsonPayload,
) -> AppResult<Json<TokenResponse>> {
    let request: LoginRequest = parse(payload)?;
    let token = state.services.auth.login(request).await?;
    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
    }))
}
