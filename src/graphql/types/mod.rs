pub mod category;
pub mod month;
pub mod payloads;
pub mod plan;
pub mod transaction;
pub mod user;

pub use category::Category;
pub use month::Month;
pub use payloads::{AuthPayload, DeletePayload, TokenPayload, TransactionInput};
pub use plan::Plan;
pub use transaction::Transaction;
pub use user::User;

use crate::error::BudgetError;
use async_graphql::{ErrorExtensions, FieldResult, ID};

/// Entity ids travel as GraphQL `ID` strings holding an integer.
pub fn parse_id(id: &ID) -> FieldResult<i64> {
    id.parse::<i64>()
        .map_err(|_| BudgetError::validation(format!("Invalid id '{}'.", id.as_str())).extend())
}

pub fn parse_optional_id(id: Option<&ID>) -> FieldResult<Option<i64>> {
    id.map(parse_id).transpose()
}
