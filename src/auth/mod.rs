//! Password hashing, JWT issuing and request identity.

pub mod password;
pub mod token;

pub use token::{token_from_header, Claims, TokenIssuer};

/// The authenticated user attached to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: i64,
}

impl Viewer {
    pub fn new(user_id: i64) -> Self {
        Self { user_id }
    }
}
