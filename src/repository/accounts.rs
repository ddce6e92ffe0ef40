//! Accounts repository

use chrono::Utc;

use super::Repository;
use crate::{error::AppResult, models::user::Account};

impl Repository {
    /// Get an account by email
    pub async fn accounts_get_by_email(&self, email: &str) -> AppResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT id, username, email, senha_hash, criado_em FROM usuarios WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    /// Check if an email is already registered
    pub async fn accounts_email_exists(&self, email: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM usuarios WHERE email = ?)")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Store a new account with an already hashed password
    pub async fn accounts_create(&self, username: &str, email: &str, senha_hash: &str) -> AppResult<Account> {
        let mut tx = self.begin_write().await?;
        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO usuarios (username, email, senha_hash, criado_em)
            VALUES (?, ?, ?, ?)
            RETURNING id, username, email, senha_hash, criado_em
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(senha_hash)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| Repository::unique_violation(e, "Email already registered"))?;
        tx.commit().await?;
        Ok(account)
    }
}
