pub mod mutation;
pub mod query;

pub use mutation::Mutation;
pub use query::Query;

use crate::auth::Viewer;
use crate::error::BudgetError;
use async_graphql::{Context, ErrorExtensions, FieldResult};

/// The authenticated user of this request, or an `UNAUTHORIZED` error.
pub(crate) fn require_viewer(ctx: &Context<'_>) -> FieldResult<Viewer> {
    ctx.data_opt::<Viewer>()
        .copied()
        .ok_or_else(|| BudgetError::Unauthorized.extend())
}
