//! Registration, login and token verification

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{Account, AccountClaims, AccountPublic, LoginRequest, RegisterRequest},
    repository::Repository,
};

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Register a new account; the email must not be taken
    pub async fn register(&self, request: RegisterRequest) -> AppResult<AccountPublic> {
        request.validate()?;

        if self.repository.accounts_email_exists(&request.email).await? {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let hash = self.hash_password(&request.senha)?;
        let account = self
            .repository
            .accounts_create(&request.username, &request.email, &hash)
            .await?;

        tracing::info!("Registered account id={} email={}", account.id, account.email);
        Ok(account.into())
    }

    /// Check credentials and issue a bearer token
    pub async fn login(&self, request: LoginRequest) -> AppResult<String> {
        request.validate()?;

        let account = self
            .repository
            .accounts_get_by_email(&request.email)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

        if !self.verify_password(&account, &request.senha)? {
            tracing::warn!("Failed login for account id={}", account.id);
            return Err(AppError::Authentication("Invalid email or password".to_string()));
        }

        self.create_token_for_account(&account)
    }

    /// Create JWT token for an account
    fn create_token_for_account(&self, account: &Account) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = AccountClaims {
            sub: account.id.to_string(),
            user_id: account.id,
            email: account.email.clone(),
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Verify account password
    fn verify_password(&self, account: &Account, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&account.senha_hash)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }
}
