use super::{Plan, Transaction};
use crate::auth::Viewer;
use crate::domain::{Category as DomainCategory, CategoryGroup, PlanFilter, TransactionFilter};
use crate::graphql::schema::GraphQLContext;
use async_graphql::{Context, FieldResult, Object, ResultExt, ID};

/// GraphQL representation of a Category
#[derive(Clone)]
pub struct Category {
    pub inner: DomainCategory,
}

impl From<DomainCategory> for Category {
    fn from(category: DomainCategory) -> Self {
        Self { inner: category }
    }
}

#[Object]
impl Category {
    async fn id(&self) -> ID {
        ID(self.inner.id.to_string())
    }

    async fn name(&self) -> &str {
        &self.inner.name
    }

    async fn group(&self) -> CategoryGroup {
        self.inner.group
    }

    /// Display color, "gray" unless chosen otherwise
    async fn color(&self) -> &str {
        &self.inner.color
    }

    /// Transactions classified under this category
    async fn transactions(&self, ctx: &Context<'_>) -> FieldResult<Vec<Transaction>> {
        let context = ctx.data::<GraphQLContext>()?;
        let filter = TransactionFilter {
            category_id: Some(self.inner.id),
            ..Default::default()
        };
        let rows = context
            .service
            .transactions(Viewer::new(self.inner.user_id), &filter)
            .await
            .extend()?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Plans made for this category, across months
    async fn plans(&self, ctx: &Context<'_>) -> FieldResult<Vec<Plan>> {
        let context = ctx.data::<GraphQLContext>()?;
        let filter = PlanFilter {
            category_id: Some(self.inner.id),
            ..Default::default()
        };
        let rows = context
            .service
            .plans(Viewer::new(self.inner.user_id), &filter)
            .await
            .extend()?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
