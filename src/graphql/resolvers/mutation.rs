use super::require_viewer;
use crate::domain::{CategoryGroup, MonthName};
use crate::graphql::schema::GraphQLContext;
use crate::graphql::types::{
    parse_id, parse_optional_id, AuthPayload, Category, DeletePayload, Month, Plan, TokenPayload,
    Transaction, TransactionInput,
};
use crate::service::{CategoryPatch, MonthPatch, TransactionDraft, TransactionPatch};
use async_graphql::{Context, FieldResult, Object, ResultExt, ID};

/// Root mutation object for GraphQL
pub struct Mutation;

#[Object]
impl Mutation {
    /// Create an account and return a token for it
    async fn register(
        &self,
        ctx: &Context<'_>,
        username: String,
        email: String,
        password: String,
    ) -> FieldResult<AuthPayload> {
        let context = ctx.data::<GraphQLContext>()?;
        let payload = context
            .service
            .register(&username, &email, &password)
            .await
            .extend()?;
        Ok(payload.into())
    }

    /// Exchange credentials for a token
    async fn login(&self, ctx: &Context<'_>, email: String, password: String) -> FieldResult<AuthPayload> {
        let context = ctx.data::<GraphQLContext>()?;
        Ok(context.service.login(&email, &password).await.extend()?.into())
    }

    async fn verify_token(&self, ctx: &Context<'_>, token: String) -> FieldResult<TokenPayload> {
        let context = ctx.data::<GraphQLContext>()?;
        let claims = context.service.verify_token(&token).extend()?;
        Ok(TokenPayload::new(None, claims))
    }

    /// Issue a new token for a token that is still valid
    async fn refresh_token(&self, ctx: &Context<'_>, token: String) -> FieldResult<TokenPayload> {
        let context = ctx.data::<GraphQLContext>()?;
        let (fresh, claims) = context.service.refresh_token(&token).extend()?;
        Ok(TokenPayload::new(Some(fresh), claims))
    }

    async fn create_category(
        &self,
        ctx: &Context<'_>,
        name: String,
        group: CategoryGroup,
        color: Option<String>,
    ) -> FieldResult<Category> {
        let context = ctx.data::<GraphQLContext>()?;
        let viewer = require_viewer(ctx)?;
        let category = context
            .service
            .create_category(viewer, &name, group, color)
            .await
            .extend()?;
        Ok(category.into())
    }

    async fn update_category(
        &self,
        ctx: &Context<'_>,
        id: ID,
        name: Option<String>,
        group: Option<CategoryGroup>,
        color: Option<String>,
    ) -> FieldResult<Category> {
        let context = ctx.data::<GraphQLContext>()?;
        let viewer = require_viewer(ctx)?;
        let patch = CategoryPatch { name, group, color };
        let category = context
            .service
            .update_category(viewer, parse_id(&id)?, patch)
            .await
            .extend()?;
        Ok(category.into())
    }

    /// Delete a category; its transactions are kept without a category
    async fn delete_category(&self, ctx: &Context<'_>, id: ID) -> FieldResult<DeletePayload> {
        let context = ctx.data::<GraphQLContext>()?;
        let viewer = require_viewer(ctx)?;
        let deleted = context
            .service
            .delete_category(viewer, parse_id(&id)?)
            .await
            .extend()?;
        Ok(DeletePayload::deleted(deleted))
    }

    async fn create_month(
        &self,
        ctx: &Context<'_>,
        year: i32,
        month: MonthName,
        start_month_savings: Option<i64>,
        start_month_balance: Option<i64>,
    ) -> FieldResult<Month> {
        let context = ctx.data::<GraphQLContext>()?;
        let viewer = require_viewer(ctx)?;
        let month = context
            .service
            .create_month(viewer, year, month, start_month_savings, start_month_balance)
            .await
            .extend()?;
        Ok(month.into())
    }

    async fn update_month(
        &self,
        ctx: &Context<'_>,
        id: ID,
        start_month_savings: Option<i64>,
        start_month_balance: Option<i64>,
    ) -> FieldResult<Month> {
        let context = ctx.data::<GraphQLContext>()?;
        let viewer = require_viewer(ctx)?;
        let patch = MonthPatch {
            start_month_savings,
            start_month_balance,
        };
        let month = context
            .service
            .update_month(viewer, parse_id(&id)?, patch)
            .await
            .extend()?;
        Ok(month.into())
    }

    async fn delete_month(&self, ctx: &Context<'_>, id: ID) -> FieldResult<DeletePayload> {
        let context = ctx.data::<GraphQLContext>()?;
        let viewer = require_viewer(ctx)?;
        let deleted = context
            .service
            .delete_month(viewer, parse_id(&id)?)
            .await
            .extend()?;
        Ok(DeletePayload::deleted(deleted))
    }

    async fn create_transaction(
        &self,
        ctx: &Context<'_>,
        amount: i64,
        description: Option<String>,
        group: Option<CategoryGroup>,
        category: Option<ID>,
        month: Option<ID>,
    ) -> FieldResult<Transaction> {
        let context = ctx.data::<GraphQLContext>()?;
        let viewer = require_viewer(ctx)?;
        let draft = TransactionDraft {
            amount,
            description,
            group,
            category_id: parse_optional_id(category.as_ref())?,
            month_id: parse_optional_id(month.as_ref())?,
        };
        let transaction = context
            .service
            .create_transaction(viewer, draft)
            .await
            .extend()?;
        Ok(transaction.into())
    }

    /// Create several transactions at once; nothing is stored if any item is invalid
    async fn create_transactions(
        &self,
        ctx: &Context<'_>,
        transactions: Vec<TransactionInput>,
    ) -> FieldResult<Vec<Transaction>> {
        let context = ctx.data::<GraphQLContext>()?;
        let viewer = require_viewer(ctx)?;
        let drafts = transactions
            .into_iter()
            .map(TransactionInput::into_draft)
            .collect::<FieldResult<Vec<_>>>()?;
        let created = context
            .service
            .create_transactions(viewer, drafts)
            .await
            .extend()?;
        Ok(created.into_iter().map(Into::into).collect())
    }

    async fn update_transaction(
        &self,
        ctx: &Context<'_>,
        id: ID,
        amount: Option<i64>,
        description: Option<String>,
        group: Option<CategoryGroup>,
        category: Option<ID>,
        month: Option<ID>,
    ) -> FieldResult<Transaction> {
        let context = ctx.data::<GraphQLContext>()?;
        let viewer = require_viewer(ctx)?;
        let patch = TransactionPatch {
            amount,
            description,
            group,
            category_id: parse_optional_id(category.as_ref())?,
            month_id: parse_optional_id(month.as_ref())?,
        };
        let transaction = context
            .service
            .update_transaction(viewer, parse_id(&id)?, patch)
            .await
            .extend()?;
        Ok(transaction.into())
    }

    async fn delete_transaction(&self, ctx: &Context<'_>, id: ID) -> FieldResult<DeletePayload> {
        let context = ctx.data::<GraphQLContext>()?;
        let viewer = require_viewer(ctx)?;
        let deleted = context
            .service
            .delete_transaction(viewer, parse_id(&id)?)
            .await
            .extend()?;
        Ok(DeletePayload::deleted(deleted))
    }

    async fn create_plan(
        &self,
        ctx: &Context<'_>,
        category: ID,
        month: ID,
        planned_amount: i64,
    ) -> FieldResult<Plan> {
        let context = ctx.data::<GraphQLContext>()?;
        let viewer = require_viewer(ctx)?;
        let plan = context
            .service
            .create_plan(viewer, parse_id(&category)?, parse_id(&month)?, planned_amount)
            .await
            .extend()?;
        Ok(plan.into())
    }

    async fn update_plan(
        &self,
        ctx: &Context<'_>,
        id: ID,
        planned_amount: Option<i64>,
    ) -> FieldResult<Plan> {
        let context = ctx.data::<GraphQLContext>()?;
        let viewer = require_viewer(ctx)?;
        let plan = context
            .service
            .update_plan(viewer, parse_id(&id)?, planned_amount)
            .await
            .extend()?;
        Ok(plan.into())
    }

    async fn delete_plan(&self, ctx: &Context<'_>, id: ID) -> FieldResult<DeletePayload> {
        let context = ctx.data::<GraphQLContext>()?;
        let viewer = require_viewer(ctx)?;
        let deleted = context
            .service
            .delete_plan(viewer, parse_id(&id)?)
            .await
            .extend()?;
        Ok(DeletePayload::deleted(deleted))
    }
}
