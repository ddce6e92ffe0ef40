//! Category model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Category with the number of books linked to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: i64,
    pub nome: String,
    pub quantidade_livros: i64,
}

/// Create category request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategory {
    pub nome: String,
}
