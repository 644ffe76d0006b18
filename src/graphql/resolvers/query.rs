use super::require_viewer;
use crate::domain::{
    CategoryFilter, CategoryGroup, MonthFilter, MonthName, PlanFilter, Summary, TransactionFilter,
};
use crate::graphql::schema::GraphQLContext;
use crate::graphql::types::{parse_id, parse_optional_id, Category, Month, Plan, Transaction, User};
use async_graphql::{Context, FieldResult, Object, ResultExt, ID};
use chrono::NaiveDate;

/// Root query object for GraphQL
pub struct Query;

#[Object]
impl Query {
    /// The authenticated user
    async fn me(&self, ctx: &Context<'_>) -> FieldResult<User> {
        let context = ctx.data::<GraphQLContext>()?;
        let viewer = require_viewer(ctx)?;
        Ok(context.service.me(viewer).await.extend()?.into())
    }

    /// The viewer's categories, optionally filtered
    async fn categories(
        &self,
        ctx: &Context<'_>,
        id: Option<ID>,
        name: Option<String>,
        group: Option<CategoryGroup>,
    ) -> FieldResult<Vec<Category>> {
        let context = ctx.data::<GraphQLContext>()?;
        let viewer = require_viewer(ctx)?;
        let filter = CategoryFilter {
            id: parse_optional_id(id.as_ref())?,
            name,
            group,
        };
        let rows = context.service.categories(viewer, &filter).await.extend()?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn category(&self, ctx: &Context<'_>, id: ID) -> FieldResult<Option<Category>> {
        let context = ctx.data::<GraphQLContext>()?;
        let viewer = require_viewer(ctx)?;
        let row = context.service.category(viewer, parse_id(&id)?).await.extend()?;
        Ok(row.map(Into::into))
    }

    /// The viewer's months, optionally filtered
    async fn months(
        &self,
        ctx: &Context<'_>,
        id: Option<ID>,
        year: Option<i32>,
        month: Option<MonthName>,
    ) -> FieldResult<Vec<Month>> {
        let context = ctx.data::<GraphQLContext>()?;
        let viewer = require_viewer(ctx)?;
        let filter = MonthFilter {
            id: parse_optional_id(id.as_ref())?,
            year,
            month,
        };
        let rows = context.service.months(viewer, &filter).await.extend()?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn month(&self, ctx: &Context<'_>, id: ID) -> FieldResult<Option<Month>> {
        let context = ctx.data::<GraphQLContext>()?;
        let viewer = require_viewer(ctx)?;
        let row = context.service.month(viewer, parse_id(&id)?).await.extend()?;
        Ok(row.map(Into::into))
    }

    /// The viewer's transactions, optionally filtered
    async fn transactions(
        &self,
        ctx: &Context<'_>,
        created_at: Option<NaiveDate>,
        category: Option<ID>,
        month: Option<ID>,
        group: Option<CategoryGroup>,
    ) -> FieldResult<Vec<Transaction>> {
        let context = ctx.data::<GraphQLContext>()?;
        let viewer = require_viewer(ctx)?;
        let filter = TransactionFilter {
            created_at,
            category_id: parse_optional_id(category.as_ref())?,
            month_id: parse_optional_id(month.as_ref())?,
            group,
        };
        let rows = context.service.transactions(viewer, &filter).await.extend()?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn transaction(&self, ctx: &Context<'_>, id: ID) -> FieldResult<Option<Transaction>> {
        let context = ctx.data::<GraphQLContext>()?;
        let viewer = require_viewer(ctx)?;
        let row = context.service.transaction(viewer, parse_id(&id)?).await.extend()?;
        Ok(row.map(Into::into))
    }

    /// The viewer's plans, optionally filtered
    async fn plans(
        &self,
        ctx: &Context<'_>,
        category: Option<ID>,
        month: Option<ID>,
    ) -> FieldResult<Vec<Plan>> {
        let context = ctx.data::<GraphQLContext>()?;
        let viewer = require_viewer(ctx)?;
        let filter = PlanFilter {
            category_id: parse_optional_id(category.as_ref())?,
            month_id: parse_optional_id(month.as_ref())?,
        };
        let rows = context.service.plans(viewer, &filter).await.extend()?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn plan(&self, ctx: &Context<'_>, id: ID) -> FieldResult<Option<Plan>> {
        let context = ctx.data::<GraphQLContext>()?;
        let viewer = require_viewer(ctx)?;
        let row = context.service.plan(viewer, parse_id(&id)?).await.extend()?;
        Ok(row.map(Into::into))
    }

    /// Income, expenses, savings and balance, optionally for one month
    async fn summary(&self, ctx: &Context<'_>, month: Option<ID>) -> FieldResult<Summary> {
        let context = ctx.data::<GraphQLContext>()?;
        let viewer = require_viewer(ctx)?;
        let month_id = parse_optional_id(month.as_ref())?;
        context.service.summary(viewer, month_id).await.extend()
    }
}
