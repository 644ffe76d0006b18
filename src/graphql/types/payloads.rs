use super::User;
use crate::auth::Claims;
use crate::domain::CategoryGroup;
use crate::service::TransactionDraft;
use async_graphql::{InputObject, SimpleObject, ID};

#[derive(SimpleObject)]
pub struct AuthPayload {
    pub token: String,
    pub user: User,
}

impl From<crate::service::AuthPayload> for AuthPayload {
    fn from(payload: crate::service::AuthPayload) -> Self {
        Self {
            token: payload.token,
            user: payload.user.into(),
        }
    }
}

/// Decoded token claims, plus the new token when one was refreshed
#[derive(SimpleObject)]
pub struct TokenPayload {
    pub token: Option<String>,
    pub user_id: ID,
    pub email: String,
    /// Seconds since the epoch
    pub issued_at: i64,
    /// Seconds since the epoch
    pub expires_at: i64,
}

impl TokenPayload {
    pub fn new(token: Option<String>, claims: Claims) -> Self {
        Self {
            token,
            user_id: ID(claims.sub.to_string()),
            email: claims.email,
            issued_at: claims.iat,
            expires_at: claims.exp,
        }
    }
}

#[derive(SimpleObject)]
pub struct DeletePayload {
    pub id: ID,
    pub success: bool,
}

impl DeletePayload {
    pub fn deleted(id: i64) -> Self {
        Self {
            id: ID(id.to_string()),
            success: true,
        }
    }
}

/// One item of a bulk `createTransactions` call
#[derive(InputObject)]
pub struct TransactionInput {
    pub amount: i64,
    pub description: Option<String>,
    pub group: Option<CategoryGroup>,
    pub category: Option<ID>,
    pub month: Option<ID>,
}

impl TransactionInput {
    pub fn into_draft(self) -> async_graphql::Result<TransactionDraft> {
        Ok(TransactionDraft {
            amount: self.amount,
            description: self.description,
            group: self.group,
            category_id: super::parse_optional_id(self.category.as_ref())?,
            month_id: super::parse_optional_id(self.month.as_ref())?,
        })
    }
}
