use super::{Category, Month};
use crate::domain::{CategoryGroup, Transaction as DomainTransaction};
use crate::graphql::schema::GraphQLContext;
use async_graphql::{Context, FieldResult, Object, ID};

/// GraphQL representation of a Transaction
#[derive(Clone)]
pub struct Transaction {
    pub inner: DomainTransaction,
}

impl From<DomainTransaction> for Transaction {
    fn from(transaction: DomainTransaction) -> Self {
        Self { inner: transaction }
    }
}

#[Object]
impl Transaction {
    async fn id(&self) -> ID {
        ID(self.inner.id.to_string())
    }

    /// Amount in whole currency units
    async fn amount(&self) -> i64 {
        self.inner.amount
    }

    async fn description(&self) -> &str {
        &self.inner.description
    }

    async fn group(&self) -> CategoryGroup {
        self.inner.group
    }

    /// Day the transaction was recorded
    async fn created_at(&self) -> chrono::NaiveDate {
        self.inner.created_at
    }

    async fn category(&self, ctx: &Context<'_>) -> FieldResult<Option<Category>> {
        let Some(id) = self.inner.category_id else {
            return Ok(None);
        };
        let context = ctx.data::<GraphQLContext>()?;
        Ok(context.category_loader.load_one(id).await?.map(Into::into))
    }

    async fn month(&self, ctx: &Context<'_>) -> FieldResult<Option<Month>> {
        let Some(id) = self.inner.month_id else {
            return Ok(None);
        };
        let context = ctx.data::<GraphQLContext>()?;
        Ok(context.month_loader.load_one(id).await?.map(Into::into))
    }
}
