use crate::error::{BudgetError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_USERNAME_LEN: usize = 30;
pub const MAX_EMAIL_LEN: usize = 254;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles")
});

pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    Ok(bcrypt::hash(password, cost)?)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    Ok(bcrypt::verify(password, hash)?)
}

/// Lowercase the domain part of an email address, leaving the local part
/// untouched.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}

pub fn validate_email(email: &str) -> Result<()> {
    if email.len() > MAX_EMAIL_LEN || !EMAIL_RE.is_match(email) {
        return Err(BudgetError::validation("Enter a valid email address."));
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<()> {
    let len = username.chars().count();
    if username.trim().is_empty() || len > MAX_USERNAME_LEN {
        return Err(BudgetError::validation(format!(
            "Username must be between 1 and {MAX_USERNAME_LEN} characters."
        )));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(BudgetError::validation(format!(
            "Password must contain at least {MIN_PASSWORD_LEN} characters."
        )));
    }
    Ok(())
}

pub fn gravatar_url(email: &str) -> String {
    let digest = Sha256::digest(email.trim().to_lowercase().as_bytes());
    format!("https://www.gravatar.com/avatar/{}", hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_not_the_password_and_verifies() {
        let hash = hash_password("testpassword", 4).unwrap();
        assert_ne!(hash, "testpassword");
        assert!(verify_password("testpassword", &hash).unwrap());
        assert!(!verify_password("wrongpassword", &hash).unwrap());
    }

    #[test]
    fn normalizes_domain_only() {
        assert_eq!(normalize_email(" Test1@TEST.com "), "Test1@test.com");
    }

    #[test]
    fn validation_rules() {
        assert!(validate_email("user@test.com").is_ok());
        assert!(validate_email("user.test.com").is_err());
        assert!(validate_username("").is_err());
        assert!(validate_username(&"x".repeat(31)).is_err());
        assert!(validate_password("short").is_err());
        assert!(validate_password("long enough").is_ok());
    }

    #[test]
    fn gravatar_is_case_insensitive() {
        assert_eq!(gravatar_url("User@Test.com"), gravatar_url("user@test.com"));
        assert!(gravatar_url("user@test.com").starts_with("https://www.gravatar.com/avatar/"));
    }
}
