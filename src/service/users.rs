use super::BudgetService;
use crate::auth::password::{
    hash_password, normalize_email, validate_email, validate_password, validate_username,
    verify_password,
};
use crate::auth::{Claims, Viewer};
use crate::domain::{NewUser, User};
use crate::error::{BudgetError, Result};
use tracing::{info, warn};

/// A freshly issued token together with the user it identifies.
#[derive(Debug, Clone)]
pub struct AuthPayload {
    pub token: String,
    pub user: User,
}

impl BudgetService {
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<AuthPayload> {
        let username = username.trim();
        let email = normalize_email(email);
        validate_username(username)?;
        validate_email(&email)?;
        validate_password(password)?;

        if self.storage.get_user_by_email(&email).await?.is_some()
            || self.storage.get_user_by_username(username).await?.is_some()
        {
            return Err(BudgetError::AlreadyExists("User"));
        }

        let user = self
            .storage
            .create_user(NewUser {
                email,
                username: username.to_string(),
                password_hash: hash_password(password, self.password_cost)?,
            })
            .await?;
        info!("Registered user {} ({})", user.id, user.username);

        let token = self.tokens.issue(&user)?;
        Ok(AuthPayload { token, user })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthPayload> {
        let email = normalize_email(email);
        let Some(user) = self.storage.get_user_by_email(&email).await? else {
            return Err(BudgetError::InvalidCredentials);
        };
        if !verify_password(password, &user.password_hash)? {
            warn!("Failed login for user {}", user.id);
            return Err(BudgetError::InvalidCredentials);
        }

        info!("User {} logged in", user.id);
        let token = self.tokens.issue(&user)?;
        Ok(AuthPayload { token, user })
    }

    /// Resolve a bearer token to a viewer. Tokens of deleted users are
    /// rejected like any other invalid token.
    pub async fn authenticate(&self, token: &str) -> Result<Viewer> {
        let claims = self.tokens.verify(token)?;
        match self.storage.get_user_by_id(claims.sub).await? {
            Some(user) => Ok(Viewer::new(user.id)),
            None => Err(BudgetError::Unauthorized),
        }
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        self.tokens.verify(token)
    }

    pub fn refresh_token(&self, token: &str) -> Result<(String, Claims)> {
        self.tokens.refresh(token)
    }

    pub async fn me(&self, viewer: Viewer) -> Result<User> {
        self.storage
            .get_user_by_id(viewer.user_id)
            .await?
            .ok_or(BudgetError::Unauthorized)
    }
}
