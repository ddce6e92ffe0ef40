//! Book model and related types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

use crate::error::{AppError, AppResult};

/// Label used on the wire for books without an author
pub const UNKNOWN_AUTHOR: &str = "Desconhecido";

/// Internal row structure for book queries (book joined with its author)
#[derive(Debug, Clone, FromRow)]
pub struct BookRow {
    pub id: i64,
    pub titulo: String,
    pub ano: Option<i32>,
    pub autor_id: Option<i64>,
    pub autor_nome: Option<String>,
}

/// Book with resolved author and categories
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    pub id: i64,
    pub titulo: String,
    pub ano: Option<i32>,
    pub autor_id: Option<i64>,
    pub autor: Option<String>,
    /// Category names in the order they were attached
    pub categorias: Vec<String>,
}

impl Book {
    pub fn from_row(row: BookRow, categorias: Vec<String>) -> Self {
        Self {
            id: row.id,
            titulo: row.titulo,
            ano: row.ano,
            autor_id: row.autor_id,
            autor: row.autor_nome,
            categorias,
        }
    }
}

/// Book record as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookOutput {
    pub id: i64,
    pub titulo: String,
    pub autor: String,
    pub categorias: Vec<String>,
    pub ano: Option<i32>,
}

impl From<Book> for BookOutput {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            titulo: book.titulo,
            autor: book.autor.unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            categorias: book.categorias,
            ano: book.ano,
        }
    }
}

/// Book fields parsed from a request body.
///
/// Optional relations are tri-state: `None` when the key is absent,
/// `Some(None)` for an explicit `null`, `Some(Some(_))` for a value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BookInput {
    #[serde(default)]
    pub titulo: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub autor: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub categorias: Option<Option<Vec<String>>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub ano: Option<Option<i32>>,
}

impl BookInput {
    /// Extract the recognized keys from an untyped JSON body; unknown keys are ignored
    pub fn from_payload(payload: &Value) -> AppResult<Self> {
        serde_json::from_value(payload.clone())
            .map_err(|e| AppError::BadRequest(format!("Invalid book payload: {}", e)))
    }

    /// True when no recognized field was supplied
    pub fn is_empty(&self) -> bool {
        self.titulo.is_none() && self.autor.is_none() && self.categorias.is_none() && self.ano.is_none()
    }
}

/// Fields required to create a book
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub titulo: String,
    pub autor: String,
    pub categorias: Vec<String>,
    pub ano: Option<i32>,
}

impl TryFrom<BookInput> for NewBook {
    type Error = AppError;

    fn try_from(input: BookInput) -> Result<Self, Self::Error> {
        let mut errors = Vec::new();
        if input.titulo.is_none() {
            errors.push("Field 'titulo' is required".to_string());
        }
        let autor = input.autor.flatten();
        if autor.is_none() {
            errors.push("Field 'autor' is required".to_string());
        }

        match (input.titulo, autor) {
            (Some(titulo), Some(autor)) => Ok(Self {
                titulo,
                autor,
                categorias: input.categorias.flatten().unwrap_or_default(),
                ano: input.ano.flatten(),
            }),
            _ => Err(AppError::Validation(errors)),
        }
    }
}

/// Deduplicate category names, keeping the first occurrence of each
pub fn dedup_names(names: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    names
        .iter()
        .filter(|name| seen.insert(name.as_str()))
        .cloned()
        .collect()
}
