use super::{Category, Month};
use crate::domain::Plan as DomainPlan;
use crate::graphql::schema::GraphQLContext;
use async_graphql::{Context, FieldResult, Object, ID};

/// Budgeted amount for one category in one month
#[derive(Clone)]
pub struct Plan {
    pub inner: DomainPlan,
}

impl From<DomainPlan> for Plan {
    fn from(plan: DomainPlan) -> Self {
        Self { inner: plan }
    }
}

#[Object]
impl Plan {
    async fn id(&self) -> ID {
        ID(self.inner.id.to_string())
    }

    async fn planned_amount(&self) -> i64 {
        self.inner.planned_amount
    }

    async fn category(&self, ctx: &Context<'_>) -> FieldResult<Option<Category>> {
        let context = ctx.data::<GraphQLContext>()?;
        Ok(context
            .category_loader
            .load_one(self.inner.category_id)
            .await?
            .map(Into::into))
    }

    async fn month(&self, ctx: &Context<'_>) -> FieldResult<Option<Month>> {
        let context = ctx.data::<GraphQLContext>()?;
        Ok(context
            .month_loader
            .load_one(self.inner.month_id)
            .await?
            .map(Into::into))
    }
}
