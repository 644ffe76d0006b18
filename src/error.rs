use async_graphql::ErrorExtensions;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BudgetError {
    #[error("Unauthorized.")]
    Unauthorized,

    #[error("{0} not found.")]
    NotFound(&'static str),

    #[error("Not permitted to modify this {}.", .0.to_lowercase())]
    Forbidden(&'static str),

    #[error("{0} already exists.")]
    AlreadyExists(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("Invalid credentials.")]
    InvalidCredentials,

    #[error("Invalid token.")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("Password hashing failed: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl BudgetError {
    /// Machine readable code placed in the GraphQL error extensions.
    pub fn code(&self) -> &'static str {
        match self {
            BudgetError::Unauthorized => "UNAUTHORIZED",
            BudgetError::NotFound(_) => "NOT_FOUND",
            BudgetError::Forbidden(_) => "FORBIDDEN",
            BudgetError::AlreadyExists(_) => "ALREADY_EXISTS",
            BudgetError::Validation(_) => "BAD_USER_INPUT",
            BudgetError::InvalidCredentials => "INVALID_CREDENTIALS",
            BudgetError::InvalidToken(_) => "INVALID_TOKEN",
            _ => "INTERNAL",
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        BudgetError::Validation(message.into())
    }
}

impl ErrorExtensions for BudgetError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| e.set("code", self.code()))
    }
}

pub type Result<T> = std::result::Result<T, BudgetError>;
