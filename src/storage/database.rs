mod rows;

use super::traits::Storage;
use crate::db::DatabaseManager;
use crate::domain::*;
use crate::error::{BudgetError, Result};
use async_trait::async_trait;
use rows::*;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::sync::Arc;
use tracing::debug;

/// SQLite-backed storage. Uniqueness and referential integrity are enforced
/// by the schema in `migrations/`.
pub struct DatabaseStorage {
    db: Arc<DatabaseManager>,
}

impl DatabaseStorage {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Fresh private in-memory database with migrations applied.
    pub fn in_memory() -> Result<Self> {
        let db = DatabaseManager::open_in_memory()?;
        db.run_migrations()?;
        Ok(Self::new(Arc::new(db)))
    }

    fn delete_by_id(&self, table: &str, entity: &'static str, id: i64) -> Result<()> {
        let conn = self.db.connection()?;
        let affected = conn.execute(&format!("DELETE FROM {table} WHERE id = ?1"), [id])?;
        if affected == 0 {
            return Err(BudgetError::NotFound(entity));
        }
        debug!("Deleted {} with id {}", entity, id);
        Ok(())
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn insert_transaction(conn: &Connection, transaction: NewTransaction) -> Result<Transaction> {
    conn.execute(
        "INSERT INTO transactions (user_id, amount, description, grp, created_at, category_id, month_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            transaction.user_id,
            transaction.amount,
            transaction.description,
            transaction.group.as_str(),
            transaction.created_at.format(DATE_FORMAT).to_string(),
            transaction.category_id,
            transaction.month_id
        ],
    )
    .map_err(|e| constraint_error(e, "Transaction"))?;
    let id = conn.last_insert_rowid();

    debug!("Created transaction of {} with id {}", transaction.amount, id);
    Ok(Transaction {
        id,
        user_id: transaction.user_id,
        amount: transaction.amount,
        description: transaction.description,
        group: transaction.group,
        created_at: transaction.created_at,
        category_id: transaction.category_id,
        month_id: transaction.month_id,
    })
}

#[async_trait]
impl Storage for DatabaseStorage {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let conn = self.db.connection()?;
        let created_at = chrono::Utc::now();
        conn.execute(
            "INSERT INTO users (email, username, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![user.email, user.username, user.password_hash, created_at.to_rfc3339()],
        )
        .map_err(|e| constraint_error(e, "User"))?;
        let id = conn.last_insert_rowid();

        debug!("Created user: {} with id {}", user.email, id);
        Ok(User {
            id,
            email: user.email,
            username: user.username,
            password_hash: user.password_hash,
            created_at,
        })
    }

    async fn get_user_by_id(&self, user_id: i64) -> Result<Option<User>> {
        let conn = self.db.connection()?;
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        Ok(conn.query_row(&sql, [user_id], user_from_row).optional()?)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.db.connection()?;
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
        Ok(conn.query_row(&sql, [email], user_from_row).optional()?)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.db.connection()?;
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1");
        Ok(conn.query_row(&sql, [username], user_from_row).optional()?)
    }

    async fn create_category(&self, category: NewCategory) -> Result<Category> {
        let conn = self.db.connection()?;
        conn.execute(
            "INSERT INTO categories (user_id, name, grp, color) VALUES (?1, ?2, ?3, ?4)",
            params![category.user_id, category.name, category.group.as_str(), category.color],
        )
        .map_err(|e| constraint_error(e, "Category"))?;
        let id = conn.last_insert_rowid();

        debug!("Created category: {} with id {}", category.name, id);
        Ok(Category {
            id,
            user_id: category.user_id,
            name: category.name,
            group: category.group,
            color: category.color,
        })
    }

    async fn get_category(&self, category_id: i64) -> Result<Option<Category>> {
        let conn = self.db.connection()?;
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1");
        Ok(conn.query_row(&sql, [category_id], category_from_row).optional()?)
    }

    async fn find_category_by_name(&self, user_id: i64, name: &str) -> Result<Option<Category>> {
        let conn = self.db.connection()?;
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE user_id = ?1 AND name = ?2");
        Ok(conn
            .query_row(&sql, params![user_id, name], category_from_row)
            .optional()?)
    }

    async fn list_categories(&self, user_id: i64, filter: &CategoryFilter) -> Result<Vec<Category>> {
        let conn = self.db.connection()?;
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories
             WHERE user_id = ?1
               AND (?2 IS NULL OR id = ?2)
               AND (?3 IS NULL OR name = ?3)
               AND (?4 IS NULL OR grp = ?4)
             ORDER BY id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![user_id, filter.id, filter.name, filter.group.map(|g| g.as_str())],
            category_from_row,
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    async fn update_category(&self, category: &Category) -> Result<()> {
        let conn = self.db.connection()?;
        let affected = conn
            .execute(
                "UPDATE categories SET name = ?2, grp = ?3, color = ?4 WHERE id = ?1",
                params![category.id, category.name, category.group.as_str(), category.color],
            )
            .map_err(|e| constraint_error(e, "Category"))?;
        if affected == 0 {
            return Err(BudgetError::NotFound("Category"));
        }

        debug!("Updated category: {} with id {}", category.name, category.id);
        Ok(())
    }

    async fn delete_category(&self, category_id: i64) -> Result<()> {
        self.delete_by_id("categories", "Category", category_id)
    }

    async fn create_month(&self, month: NewMonth) -> Result<Month> {
        let conn = self.db.connection()?;
        conn.execute(
            "INSERT INTO months (user_id, year, month, start_month_savings, start_month_balance)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                month.user_id,
                month.year,
                month.month.number(),
                month.start_month_savings,
                month.start_month_balance
            ],
        )
        .map_err(|e| constraint_error(e, "Month"))?;
        let id = conn.last_insert_rowid();

        debug!("Created month: {:?} {} with id {}", month.month, month.year, id);
        Ok(Month {
            id,
            user_id: month.user_id,
            year: month.year,
            month: month.month,
            start_month_savings: month.start_month_savings,
            start_month_balance: month.start_month_balance,
        })
    }

    async fn get_month(&self, month_id: i64) -> Result<Option<Month>> {
        let conn = self.db.connection()?;
        let sql = format!("SELECT {MONTH_COLUMNS} FROM months WHERE id = ?1");
        Ok(conn.query_row(&sql, [month_id], month_from_row).optional()?)
    }

    async fn find_month(&self, user_id: i64, year: i32, month: MonthName) -> Result<Option<Month>> {
        let conn = self.db.connection()?;
        let sql = format!(
            "SELECT {MONTH_COLUMNS} FROM months WHERE user_id = ?1 AND year = ?2 AND month = ?3"
        );
        Ok(conn
            .query_row(&sql, params![user_id, year, month.number()], month_from_row)
            .optional()?)
    }

    async fn list_months(&self, user_id: i64, filter: &MonthFilter) -> Result<Vec<Month>> {
        let conn = self.db.connection()?;
        let sql = format!(
            "SELECT {MONTH_COLUMNS} FROM months
             WHERE user_id = ?1
               AND (?2 IS NULL OR id = ?2)
               AND (?3 IS NULL OR year = ?3)
               AND (?4 IS NULL OR month = ?4)
             ORDER BY id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![user_id, filter.id, filter.year, filter.month.map(|m| m.number())],
            month_from_row,
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    async fn update_month(&self, month: &Month) -> Result<()> {
        let conn = self.db.connection()?;
        let affected = conn.execute(
            "UPDATE months SET start_month_savings = ?2, start_month_balance = ?3 WHERE id = ?1",
            params![month.id, month.start_month_savings, month.start_month_balance],
        )?;
        if affected == 0 {
            return Err(BudgetError::NotFound("Month"));
        }

        debug!("Updated month with id {}", month.id);
        Ok(())
    }

    async fn delete_month(&self, month_id: i64) -> Result<()> {
        self.delete_by_id("months", "Month", month_id)
    }

    async fn create_transaction(&self, transaction: NewTransaction) -> Result<Transaction> {
        let conn = self.db.connection()?;
        insert_transaction(&conn, transaction)
    }

    async fn create_transactions(&self, transactions: Vec<NewTransaction>) -> Result<Vec<Transaction>> {
        let mut conn = self.db.connection()?;
        let tx = conn.transaction()?;
        let created = transactions
            .into_iter()
            .map(|t| insert_transaction(&tx, t))
            .collect::<Result<Vec<_>>>()?;
        tx.commit()?;
        Ok(created)
    }

    async fn get_transaction(&self, transaction_id: i64) -> Result<Option<Transaction>> {
        let conn = self.db.connection()?;
        let sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?1");
        Ok(conn
            .query_row(&sql, [transaction_id], transaction_from_row)
            .optional()?)
    }

    async fn list_transactions(
        &self,
        user_id: i64,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>> {
        let conn = self.db.connection()?;
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions
             WHERE user_id = ?1
               AND (?2 IS NULL OR created_at = ?2)
               AND (?3 IS NULL OR category_id = ?3)
               AND (?4 IS NULL OR month_id = ?4)
               AND (?5 IS NULL OR grp = ?5)
             ORDER BY id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![
                user_id,
                filter.created_at.map(|d| d.format(DATE_FORMAT).to_string()),
                filter.category_id,
                filter.month_id,
                filter.group.map(|g| g.as_str())
            ],
            transaction_from_row,
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    async fn update_transaction(&self, transaction: &Transaction) -> Result<()> {
        let conn = self.db.connection()?;
        let affected = conn
            .execute(
                "UPDATE transactions
                 SET amount = ?2, description = ?3, grp = ?4, category_id = ?5, month_id = ?6
                 WHERE id = ?1",
                params![
                    transaction.id,
                    transaction.amount,
                    transaction.description,
                    transaction.group.as_str(),
                    transaction.category_id,
                    transaction.month_id
                ],
            )
            .map_err(|e| constraint_error(e, "Transaction"))?;
        if affected == 0 {
            return Err(BudgetError::NotFound("Transaction"));
        }

        debug!("Updated transaction with id {}", transaction.id);
        Ok(())
    }

    async fn delete_transaction(&self, transaction_id: i64) -> Result<()> {
        self.delete_by_id("transactions", "Transaction", transaction_id)
    }

    async fn create_plan(&self, plan: NewPlan) -> Result<Plan> {
        let conn = self.db.connection()?;
        conn.execute(
            "INSERT INTO plans (user_id, category_id, month_id, planned_amount) VALUES (?1, ?2, ?3, ?4)",
            params![plan.user_id, plan.category_id, plan.month_id, plan.planned_amount],
        )
        .map_err(|e| constraint_error(e, "Plan"))?;
        let id = conn.last_insert_rowid();

        debug!("Created plan with id {}", id);
        Ok(Plan {
            id,
            user_id: plan.user_id,
            category_id: plan.category_id,
            month_id: plan.month_id,
            planned_amount: plan.planned_amount,
        })
    }

    async fn get_plan(&self, plan_id: i64) -> Result<Option<Plan>> {
        let conn = self.db.connection()?;
        let sql = format!("SELECT {PLAN_COLUMNS} FROM plans WHERE id = ?1");
        Ok(conn.query_row(&sql, [plan_id], plan_from_row).optional()?)
    }

    async fn find_plan(&self, user_id: i64, category_id: i64, month_id: i64) -> Result<Option<Plan>> {
        let conn = self.db.connection()?;
        let sql = format!(
            "SELECT {PLAN_COLUMNS} FROM plans WHERE user_id = ?1 AND category_id = ?2 AND month_id = ?3"
        );
        Ok(conn
            .query_row(&sql, params![user_id, category_id, month_id], plan_from_row)
            .optional()?)
    }

    async fn list_plans(&self, user_id: i64, filter: &PlanFilter) -> Result<Vec<Plan>> {
        let conn = self.db.connection()?;
        let sql = format!(
            "SELECT {PLAN_COLUMNS} FROM plans
             WHERE user_id = ?1
               AND (?2 IS NULL OR category_id = ?2)
               AND (?3 IS NULL OR month_id = ?3)
             ORDER BY id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![user_id, filter.category_id, filter.month_id],
            plan_from_row,
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    async fn update_plan(&self, plan: &Plan) -> Result<()> {
        let conn = self.db.connection()?;
        let affected = conn.execute(
            "UPDATE plans SET planned_amount = ?2 WHERE id = ?1",
            params![plan.id, plan.planned_amount],
        )?;
        if affected == 0 {
            return Err(BudgetError::NotFound("Plan"));
        }

        debug!("Updated plan with id {}", plan.id);
        Ok(())
    }

    async fn delete_plan(&self, plan_id: i64) -> Result<()> {
        self.delete_by_id("plans", "Plan", plan_id)
    }

    async fn get_categories_by_ids(&self, category_ids: Vec<i64>) -> Result<Vec<Category>> {
        if category_ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.db.connection()?;
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id IN ({})",
            placeholders(category_ids.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(category_ids.iter()), category_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    async fn get_months_by_ids(&self, month_ids: Vec<i64>) -> Result<Vec<Month>> {
        if month_ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.db.connection()?;
        let sql = format!(
            "SELECT {MONTH_COLUMNS} FROM months WHERE id IN ({})",
            placeholders(month_ids.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(month_ids.iter()), month_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    async fn seeded() -> (DatabaseStorage, User) {
        let storage = DatabaseStorage::in_memory().unwrap();
        let user = storage
            .create_user(NewUser {
                email: "user@test.com".to_string(),
                username: "user".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();
        (storage, user)
    }

    fn groceries(user_id: i64) -> NewCategory {
        NewCategory {
            user_id,
            name: "Groceries".to_string(),
            group: CategoryGroup::Expense,
            color: DEFAULT_CATEGORY_COLOR.to_string(),
        }
    }

    #[tokio::test]
    async fn unique_constraint_maps_to_already_exists() {
        let (storage, user) = seeded().await;
        storage.create_category(groceries(user.id)).await.unwrap();

        let err = storage.create_category(groceries(user.id)).await.unwrap_err();
        assert!(matches!(err, BudgetError::AlreadyExists("Category")));
        let all = storage
            .list_categories(user.id, &CategoryFilter::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn deleting_category_nulls_transactions_and_drops_plans() {
        let (storage, user) = seeded().await;
        let category = storage.create_category(groceries(user.id)).await.unwrap();
        let month = storage
            .create_month(NewMonth {
                user_id: user.id,
                year: 2021,
                month: MonthName::January,
                start_month_savings: 0,
                start_month_balance: 0,
            })
            .await
            .unwrap();
        let tx = storage
            .create_transaction(NewTransaction {
                user_id: user.id,
                amount: 100,
                description: "milk".to_string(),
                group: CategoryGroup::Expense,
                created_at: NaiveDate::from_ymd_opt(2021, 1, 4).unwrap(),
                category_id: Some(category.id),
                month_id: Some(month.id),
            })
            .await
            .unwrap();
        let plan = storage
            .create_plan(NewPlan {
                user_id: user.id,
                category_id: category.id,
                month_id: month.id,
                planned_amount: 500,
            })
            .await
            .unwrap();

        storage.delete_category(category.id).await.unwrap();

        let tx = storage.get_transaction(tx.id).await.unwrap().unwrap();
        assert_eq!(tx.category_id, None);
        assert_eq!(tx.month_id, Some(month.id));
        assert!(storage.get_plan(plan.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleting_month_nulls_transactions_and_drops_plans() {
        let (storage, user) = seeded().await;
        let category = storage.create_category(groceries(user.id)).await.unwrap();
        let month = storage
            .create_month(NewMonth {
                user_id: user.id,
                year: 2021,
                month: MonthName::March,
                start_month_savings: 0,
                start_month_balance: 0,
            })
            .await
            .unwrap();
        let tx = storage
            .create_transaction(NewTransaction {
                user_id: user.id,
                amount: 40,
                description: "bread".to_string(),
                group: CategoryGroup::Expense,
                created_at: NaiveDate::from_ymd_opt(2021, 3, 2).unwrap(),
                category_id: Some(category.id),
                month_id: Some(month.id),
            })
            .await
            .unwrap();
        let plan = storage
            .create_plan(NewPlan {
                user_id: user.id,
                category_id: category.id,
                month_id: month.id,
                planned_amount: 200,
            })
            .await
            .unwrap();

        storage.delete_month(month.id).await.unwrap();

        assert!(storage.get_month(month.id).await.unwrap().is_none());
        let tx = storage.get_transaction(tx.id).await.unwrap().unwrap();
        assert_eq!(tx.month_id, None);
        assert_eq!(tx.category_id, Some(category.id));
        assert!(storage.get_plan(plan.id).await.unwrap().is_none());
        assert!(matches!(
            storage.delete_month(month.id).await,
            Err(BudgetError::NotFound("Month"))
        ));
    }

    #[tokio::test]
    async fn bulk_insert_is_all_or_nothing() {
        let (storage, user) = seeded().await;
        let row = |amount, category_id| NewTransaction {
            user_id: user.id,
            amount,
            description: String::new(),
            group: CategoryGroup::Expense,
            created_at: NaiveDate::from_ymd_opt(2021, 2, 1).unwrap(),
            category_id,
            month_id: None,
        };

        let err = storage
            .create_transactions(vec![row(10, None), row(20, Some(9_999))])
            .await
            .unwrap_err();
        assert!(matches!(err, BudgetError::Validation(_)));
        let stored = storage
            .list_transactions(user.id, &TransactionFilter::default())
            .await
            .unwrap();
        assert!(stored.is_empty());

        let created = storage
            .create_transactions(vec![row(10, None), row(20, None)])
            .await
            .unwrap();
        assert_eq!(created.len(), 2);
        assert_ne!(created[0].id, created[1].id);
    }

    #[tokio::test]
    async fn transaction_filters_combine() {
        let (storage, user) = seeded().await;
        let day = NaiveDate::from_ymd_opt(2021, 2, 1).unwrap();
        for (amount, group) in [(10, CategoryGroup::Expense), (20, CategoryGroup::Income)] {
            storage
                .create_transaction(NewTransaction {
                    user_id: user.id,
                    amount,
                    description: String::new(),
                    group,
                    created_at: day,
                    category_id: None,
                    month_id: None,
                })
                .await
                .unwrap();
        }

        let filter = TransactionFilter {
            created_at: Some(day),
            group: Some(CategoryGroup::Income),
            ..Default::default()
        };
        let found = storage.list_transactions(user.id, &filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].amount, 20);
        assert_eq!(found[0].created_at, day);
    }

    #[tokio::test]
    async fn batch_lookup_returns_existing_rows_only() {
        let (storage, user) = seeded().await;
        let category = storage.create_category(groceries(user.id)).await.unwrap();
        let found = storage
            .get_categories_by_ids(vec![category.id, 9_999])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert!(storage.get_months_by_ids(Vec::new()).await.unwrap().is_empty());
    }
}
