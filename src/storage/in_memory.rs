use super::traits::Storage;
use crate::domain::*;
use crate::error::{BudgetError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: BTreeMap<i64, User>,
    categories: BTreeMap<i64, Category>,
    months: BTreeMap<i64, Month>,
    transactions: BTreeMap<i64, Transaction>,
    plans: BTreeMap<i64, Plan>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn insert_transaction(&mut self, transaction: NewTransaction) -> Transaction {
        let id = self.allocate_id();
        let transaction = Transaction {
            id,
            user_id: transaction.user_id,
            amount: transaction.amount,
            description: transaction.description,
            group: transaction.group,
            created_at: transaction.created_at,
            category_id: transaction.category_id,
            month_id: transaction.month_id,
        };
        self.transactions.insert(id, transaction.clone());

        debug!("Created transaction of {} with id {}", transaction.amount, id);
        transaction
    }
}

/// In-memory storage implementation for development/testing.
///
/// All tables sit behind one lock so cascading deletes are atomic, matching
/// the foreign-key behaviour of the SQLite backend.
pub struct InMemoryStorage {
    tables: Mutex<Tables>,
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(|_| BudgetError::Storage {
            message: "in-memory storage lock poisoned".to_string(),
        })
    }
}

fn ensure_user_unique(tables: &Tables, user: &NewUser) -> Result<()> {
    let taken = tables
        .users
        .values()
        .any(|u| u.email == user.email || u.username == user.username);
    if taken {
        return Err(BudgetError::AlreadyExists("User"));
    }
    Ok(())
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut tables = self.lock()?;
        ensure_user_unique(&tables, &user)?;
        let id = tables.allocate_id();
        let user = User {
            id,
            email: user.email,
            username: user.username,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        tables.users.insert(id, user.clone());

        debug!("Created user: {} with id {}", user.email, id);
        Ok(user)
    }

    async fn get_user_by_id(&self, user_id: i64) -> Result<Option<User>> {
        Ok(self.lock()?.users.get(&user_id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let tables = self.lock()?;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let tables = self.lock()?;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn create_category(&self, category: NewCategory) -> Result<Category> {
        let mut tables = self.lock()?;
        let duplicate = tables
            .categories
            .values()
            .any(|c| c.user_id == category.user_id && c.name == category.name);
        if duplicate {
            return Err(BudgetError::AlreadyExists("Category"));
        }
        let id = tables.allocate_id();
        let category = Category {
            id,
            user_id: category.user_id,
            name: category.name,
            group: category.group,
            color: category.color,
        };
        tables.categories.insert(id, category.clone());

        debug!("Created category: {} with id {}", category.name, id);
        Ok(category)
    }

    async fn get_category(&self, category_id: i64) -> Result<Option<Category>> {
        Ok(self.lock()?.categories.get(&category_id).cloned())
    }

    async fn find_category_by_name(&self, user_id: i64, name: &str) -> Result<Option<Category>> {
        let tables = self.lock()?;
        Ok(tables
            .categories
            .values()
            .find(|c| c.user_id == user_id && c.name == name)
            .cloned())
    }

    async fn list_categories(&self, user_id: i64, filter: &CategoryFilter) -> Result<Vec<Category>> {
        let tables = self.lock()?;
        Ok(tables
            .categories
            .values()
            .filter(|c| c.user_id == user_id && filter.matches(c))
            .cloned()
            .collect())
    }

    async fn update_category(&self, category: &Category) -> Result<()> {
        let mut tables = self.lock()?;
        let clash = tables.categories.values().any(|c| {
            c.id != category.id && c.user_id == category.user_id && c.name == category.name
        });
        if clash {
            return Err(BudgetError::AlreadyExists("Category"));
        }
        match tables.categories.get_mut(&category.id) {
            Some(slot) => *slot = category.clone(),
            None => return Err(BudgetError::NotFound("Category")),
        }

        debug!("Updated category: {} with id {}", category.name, category.id);
        Ok(())
    }

    async fn delete_category(&self, category_id: i64) -> Result<()> {
        let mut tables = self.lock()?;
        if tables.categories.remove(&category_id).is_none() {
            return Err(BudgetError::NotFound("Category"));
        }
        for tx in tables.transactions.values_mut() {
            if tx.category_id == Some(category_id) {
                tx.category_id = None;
            }
        }
        tables.plans.retain(|_, p| p.category_id != category_id);

        debug!("Deleted category with id {}", category_id);
        Ok(())
    }

    async fn create_month(&self, month: NewMonth) -> Result<Month> {
        let mut tables = self.lock()?;
        let duplicate = tables.months.values().any(|m| {
            m.user_id == month.user_id && m.year == month.year && m.month == month.month
        });
        if duplicate {
            return Err(BudgetError::AlreadyExists("Month"));
        }
        let id = tables.allocate_id();
        let month = Month {
            id,
            user_id: month.user_id,
            year: month.year,
            month: month.month,
            start_month_savings: month.start_month_savings,
            start_month_balance: month.start_month_balance,
        };
        tables.months.insert(id, month.clone());

        debug!("Created month: {:?} {} with id {}", month.month, month.year, id);
        Ok(month)
    }

    async fn get_month(&self, month_id: i64) -> Result<Option<Month>> {
        Ok(self.lock()?.months.get(&month_id).cloned())
    }

    async fn find_month(&self, user_id: i64, year: i32, month: MonthName) -> Result<Option<Month>> {
        let tables = self.lock()?;
        Ok(tables
            .months
            .values()
            .find(|m| m.user_id == user_id && m.year == year && m.month == month)
            .cloned())
    }

    async fn list_months(&self, user_id: i64, filter: &MonthFilter) -> Result<Vec<Month>> {
        let tables = self.lock()?;
        Ok(tables
            .months
            .values()
            .filter(|m| m.user_id == user_id && filter.matches(m))
            .cloned()
            .collect())
    }

    async fn update_month(&self, month: &Month) -> Result<()> {
        let mut tables = self.lock()?;
        match tables.months.get_mut(&month.id) {
            Some(slot) => *slot = month.clone(),
            None => return Err(BudgetError::NotFound("Month")),
        }

        debug!("Updated month with id {}", month.id);
        Ok(())
    }

    async fn delete_month(&self, month_id: i64) -> Result<()> {
        let mut tables = self.lock()?;
        if tables.months.remove(&month_id).is_none() {
            return Err(BudgetError::NotFound("Month"));
        }
        for tx in tables.transactions.values_mut() {
            if tx.month_id == Some(month_id) {
                tx.month_id = None;
            }
        }
        tables.plans.retain(|_, p| p.month_id != month_id);

        debug!("Deleted month with id {}", month_id);
        Ok(())
    }

    async fn create_transaction(&self, transaction: NewTransaction) -> Result<Transaction> {
        Ok(self.lock()?.insert_transaction(transaction))
    }

    async fn create_transactions(&self, transactions: Vec<NewTransaction>) -> Result<Vec<Transaction>> {
        let mut tables = self.lock()?;
        Ok(transactions
            .into_iter()
            .map(|t| tables.insert_transaction(t))
            .collect())
    }

    async fn get_transaction(&self, transaction_id: i64) -> Result<Option<Transaction>> {
        Ok(self.lock()?.transactions.get(&transaction_id).cloned())
    }

    async fn list_transactions(
        &self,
        user_id: i64,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>> {
        let tables = self.lock()?;
        Ok(tables
            .transactions
            .values()
            .filter(|t| t.user_id == user_id && filter.matches(t))
            .cloned()
            .collect())
    }

    async fn update_transaction(&self, transaction: &Transaction) -> Result<()> {
        let mut tables = self.lock()?;
        match tables.transactions.get_mut(&transaction.id) {
            Some(slot) => *slot = transaction.clone(),
            None => return Err(BudgetError::NotFound("Transaction")),
        }

        debug!("Updated transaction with id {}", transaction.id);
        Ok(())
    }

    async fn delete_transaction(&self, transaction_id: i64) -> Result<()> {
        let mut tables = self.lock()?;
        if tables.transactions.remove(&transaction_id).is_none() {
            return Err(BudgetError::NotFound("Transaction"));
        }

        debug!("Deleted transaction with id {}", transaction_id);
        Ok(())
    }

    async fn create_plan(&self, plan: NewPlan) -> Result<Plan> {
        let mut tables = self.lock()?;
        let duplicate = tables.plans.values().any(|p| {
            p.user_id == plan.user_id
                && p.category_id == plan.category_id
                && p.month_id == plan.month_id
        });
        if duplicate {
            return Err(BudgetError::AlreadyExists("Plan"));
        }
        if !tables.categories.contains_key(&plan.category_id) {
            return Err(BudgetError::NotFound("Category"));
        }
        if !tables.months.contains_key(&plan.month_id) {
            return Err(BudgetError::NotFound("Month"));
        }
        let id = tables.allocate_id();
        let plan = Plan {
            id,
            user_id: plan.user_id,
            category_id: plan.category_id,
            month_id: plan.month_id,
            planned_amount: plan.planned_amount,
        };
        tables.plans.insert(id, plan.clone());

        debug!("Created plan with id {}", id);
        Ok(plan)
    }

    async fn get_plan(&self, plan_id: i64) -> Result<Option<Plan>> {
        Ok(self.lock()?.plans.get(&plan_id).cloned())
    }

    async fn find_plan(&self, user_id: i64, category_id: i64, month_id: i64) -> Result<Option<Plan>> {
        let tables = self.lock()?;
        Ok(tables
            .plans
            .values()
            .find(|p| p.user_id == user_id && p.category_id == category_id && p.month_id == month_id)
            .cloned())
    }

    async fn list_plans(&self, user_id: i64, filter: &PlanFilter) -> Result<Vec<Plan>> {
        let tables = self.lock()?;
        Ok(tables
            .plans
            .values()
            .filter(|p| p.user_id == user_id && filter.matches(p))
            .cloned()
            .collect())
    }

    async fn update_plan(&self, plan: &Plan) -> Result<()> {
        let mut tables = self.lock()?;
        match tables.plans.get_mut(&plan.id) {
            Some(slot) => *slot = plan.clone(),
            None => return Err(BudgetError::NotFound("Plan")),
        }

        debug!("Updated plan with id {}", plan.id);
        Ok(())
    }

    async fn delete_plan(&self, plan_id: i64) -> Result<()> {
        let mut tables = self.lock()?;
        if tables.plans.remove(&plan_id).is_none() {
            return Err(BudgetError::NotFound("Plan"));
        }

        debug!("Deleted plan with id {}", plan_id);
        Ok(())
    }

    async fn get_categories_by_ids(&self, category_ids: Vec<i64>) -> Result<Vec<Category>> {
        let tables = self.lock()?;
        Ok(category_ids
            .iter()
            .filter_map(|id| tables.categories.get(id).cloned())
            .collect())
    }

    async fn get_months_by_ids(&self, month_ids: Vec<i64>) -> Result<Vec<Month>> {
        let tables = self.lock()?;
        Ok(month_ids
            .iter()
            .filter_map(|id| tables.months.get(id).cloned())
            .collect())
    }
}
