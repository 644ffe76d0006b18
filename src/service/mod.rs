//! Per-user budget operations: ownership checks and uniqueness guards in
//! front of [`Storage`].

mod categories;
mod months;
mod plans;
mod transactions;
mod users;

pub use categories::CategoryPatch;
pub use months::MonthPatch;
pub use transactions::{TransactionDraft, TransactionPatch};
pub use users::AuthPayload;

use crate::auth::{TokenIssuer, Viewer};
use crate::config::AuthConfig;
use crate::domain::Owned;
use crate::error::{BudgetError, Result};
use crate::storage::Storage;
use std::sync::Arc;

#[derive(Clone)]
pub struct BudgetService {
    storage: Arc<dyn Storage>,
    tokens: TokenIssuer,
    password_cost: u32,
}

impl BudgetService {
    pub fn new(storage: Arc<dyn Storage>, tokens: TokenIssuer, password_cost: u32) -> Self {
        Self {
            storage,
            tokens,
            password_cost,
        }
    }

    pub fn from_config(storage: Arc<dyn Storage>, config: &AuthConfig) -> Self {
        Self::new(storage, TokenIssuer::from_config(config), config.bcrypt_cost)
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }
}

/// Resolve a row fetched by id against the viewer: missing rows are
/// `NotFound`, rows of another user are `Forbidden`.
fn owned_by<T: Owned>(row: Option<T>, viewer: Viewer) -> Result<T> {
    match row {
        None => Err(BudgetError::NotFound(T::ENTITY)),
        Some(r) if r.owner_id() != viewer.user_id => Err(BudgetError::Forbidden(T::ENTITY)),
        Some(r) => Ok(r),
    }
}

/// Read-side variant of [`owned_by`]: foreign rows are simply invisible.
fn visible_to<T: Owned>(row: Option<T>, viewer: Viewer) -> Option<T> {
    row.filter(|r| r.owner_id() == viewer.user_id)
}
