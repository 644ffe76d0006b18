use crate::domain::*;
use crate::error::Result;
use async_trait::async_trait;

/// Storage trait for persisting users and their budget data.
///
/// Lookups by id are unscoped; ownership checks live in the service layer.
/// Listing operations are always scoped to one user and return rows in
/// ascending id order.
#[async_trait]
pub trait Storage: Send + Sync {
    // User operations
    async fn create_user(&self, user: NewUser) -> Result<User>;
    async fn get_user_by_id(&self, user_id: i64) -> Result<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;

    // Category operations
    async fn create_category(&self, category: NewCategory) -> Result<Category>;
    async fn get_category(&self, category_id: i64) -> Result<Option<Category>>;
    async fn find_category_by_name(&self, user_id: i64, name: &str) -> Result<Option<Category>>;
    async fn list_categories(&self, user_id: i64, filter: &CategoryFilter) -> Result<Vec<Category>>;
    async fn update_category(&self, category: &Category) -> Result<()>;
    /// Deletes the category, unlinking its transactions and removing its plans.
    async fn delete_category(&self, category_id: i64) -> Result<()>;

    // Month operations
    async fn create_month(&self, month: NewMonth) -> Result<Month>;
    async fn get_month(&self, month_id: i64) -> Result<Option<Month>>;
    async fn find_month(&self, user_id: i64, year: i32, month: MonthName) -> Result<Option<Month>>;
    async fn list_months(&self, user_id: i64, filter: &MonthFilter) -> Result<Vec<Month>>;
    async fn update_month(&self, month: &Month) -> Result<()>;
    /// Deletes the month, unlinking its transactions and removing its plans.
    async fn delete_month(&self, month_id: i64) -> Result<()>;

    // Transaction operations
    async fn create_transaction(&self, transaction: NewTransaction) -> Result<Transaction>;
    /// Inserts all rows or none of them.
    async fn create_transactions(&self, transactions: Vec<NewTransaction>) -> Result<Vec<Transaction>>;
    async fn get_transaction(&self, transaction_id: i64) -> Result<Option<Transaction>>;
    async fn list_transactions(
        &self,
        user_id: i64,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>>;
    async fn update_transaction(&self, transaction: &Transaction) -> Result<()>;
    async fn delete_transaction(&self, transaction_id: i64) -> Result<()>;

    // Plan operations
    async fn create_plan(&self, plan: NewPlan) -> Result<Plan>;
    async fn get_plan(&self, plan_id: i64) -> Result<Option<Plan>>;
    async fn find_plan(&self, user_id: i64, category_id: i64, month_id: i64) -> Result<Option<Plan>>;
    async fn list_plans(&self, user_id: i64, filter: &PlanFilter) -> Result<Vec<Plan>>;
    async fn update_plan(&self, plan: &Plan) -> Result<()>;
    async fn delete_plan(&self, plan_id: i64) -> Result<()>;

    // Batch loading methods for GraphQL DataLoader optimization
    async fn get_categories_by_ids(&self, category_ids: Vec<i64>) -> Result<Vec<Category>>;
    async fn get_months_by_ids(&self, month_ids: Vec<i64>) -> Result<Vec<Month>>;
}
