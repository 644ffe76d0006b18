use super::{Plan, Transaction};
use crate::auth::Viewer;
use crate::domain::{Month as DomainMonth, MonthName, PlanFilter, Summary, TransactionFilter};
use crate::graphql::schema::GraphQLContext;
use async_graphql::{Context, FieldResult, Object, ResultExt, ID};

/// GraphQL representation of a Month
#[derive(Clone)]
pub struct Month {
    pub inner: DomainMonth,
}

impl From<DomainMonth> for Month {
    fn from(month: DomainMonth) -> Self {
        Self { inner: month }
    }
}

impl Month {
    fn owner(&self) -> Viewer {
        Viewer::new(self.inner.user_id)
    }
}

#[Object]
impl Month {
    async fn id(&self) -> ID {
        ID(self.inner.id.to_string())
    }

    async fn year(&self) -> i32 {
        self.inner.year
    }

    async fn month(&self) -> MonthName {
        self.inner.month
    }

    /// Calendar number of the month, January is 1
    async fn month_number(&self) -> u32 {
        self.inner.month.number()
    }

    async fn start_month_savings(&self) -> i64 {
        self.inner.start_month_savings
    }

    async fn start_month_balance(&self) -> i64 {
        self.inner.start_month_balance
    }

    async fn transactions(&self, ctx: &Context<'_>) -> FieldResult<Vec<Transaction>> {
        let context = ctx.data::<GraphQLContext>()?;
        let filter = TransactionFilter {
            month_id: Some(self.inner.id),
            ..Default::default()
        };
        let rows = context.service.transactions(self.owner(), &filter).await.extend()?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn plans(&self, ctx: &Context<'_>) -> FieldResult<Vec<Plan>> {
        let context = ctx.data::<GraphQLContext>()?;
        let filter = PlanFilter {
            month_id: Some(self.inner.id),
            ..Default::default()
        };
        let rows = context.service.plans(self.owner(), &filter).await.extend()?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Totals of this month's transactions on top of its opening balance
    async fn summary(&self, ctx: &Context<'_>) -> FieldResult<Summary> {
        let context = ctx.data::<GraphQLContext>()?;
        context
            .service
            .summary(self.owner(), Some(self.inner.id))
            .await
            .extend()
    }
}
