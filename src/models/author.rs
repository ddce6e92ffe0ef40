//! Author model and related types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

use crate::error::{AppError, AppResult};

/// Internal row structure for author queries (author joined with its profile)
#[derive(Debug, Clone, FromRow)]
pub struct AuthorRow {
    id: i64,
    nome: String,
    perfil_id: Option<i64>,
    biografia: Option<String>,
    data_nascimento: Option<String>,
    quantidade_livros: i64,
}

/// Biography details, owned by exactly one author
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorProfile {
    pub biografia: Option<String>,
    pub data_nascimento: Option<String>,
}

/// Author with its optional profile and the number of books it owns
#[derive(Debug, Clone, PartialEq)]
pub struct Author {
    pub id: i64,
    pub nome: String,
    pub perfil: Option<AuthorProfile>,
    pub quantidade_livros: i64,
}

impl From<AuthorRow> for Author {
    fn from(row: AuthorRow) -> Self {
        Author {
            id: row.id,
            nome: row.nome,
            perfil: row.perfil_id.map(|_| AuthorProfile {
                biografia: row.biografia,
                data_nascimento: row.data_nascimento,
            }),
            quantidade_livros: row.quantidade_livros,
        }
    }
}

/// Author record as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorOutput {
    pub id: i64,
    pub nome: String,
    pub quantidade_livros: i64,
    pub biografia: Option<String>,
    pub data_nascimento: Option<String>,
}

impl From<Author> for AuthorOutput {
    fn from(author: Author) -> Self {
        let (biografia, data_nascimento) = match author.perfil {
            Some(p) => (p.biografia, p.data_nascimento),
            None => (None, None),
        };

        Self {
            id: author.id,
            nome: author.nome,
            quantidade_livros: author.quantidade_livros,
            biografia,
            data_nascimento,
        }
    }
}

/// Author fields parsed from a request body (absent vs `null` kept apart)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AuthorInput {
    #[serde(default)]
    pub nome: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub biografia: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub data_nascimento: Option<Option<String>>,
}

impl AuthorInput {
    pub fn from_payload(payload: &Value) -> AppResult<Self> {
        serde_json::from_value(payload.clone())
            .map_err(|e| AppError::BadRequest(format!("Invalid author payload: {}", e)))
    }

    pub fn is_empty(&self) -> bool {
        self.nome.is_none() && self.biografia.is_none() && self.data_nascimento.is_none()
    }

    /// True when the payload touches any profile field
    pub fn has_profile_fields(&self) -> bool {
        self.biografia.is_some() || self.data_nascimento.is_some()
    }
}

/// Fields required to create an author
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuthor {
    pub nome: String,
    pub biografia: Option<String>,
    pub data_nascimento: Option<String>,
}

impl TryFrom<AuthorInput> for NewAuthor {
    type Error = AppError;

    fn try_from(input: AuthorInput) -> Result<Self, Self::Error> {
        let nome = input
            .nome
            .ok_or_else(|| AppError::Validation(vec!["Field 'nome' is required".to_string()]))?;

        Ok(Self {
            nome,
            biografia: input.biografia.flatten(),
            data_nascimento: input.data_nascimento.flatten(),
        })
    }
}
