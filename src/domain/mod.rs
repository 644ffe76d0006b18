use async_graphql::{Enum, SimpleObject};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_CATEGORY_COLOR: &str = "gray";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password_hash: String,
}

/// Classification shared by categories and transactions.
#[derive(Enum, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[graphql(rename_items = "PascalCase")]
pub enum CategoryGroup {
    Expense,
    Income,
    Savings,
}

impl CategoryGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryGroup::Expense => "Expense",
            CategoryGroup::Income => "Income",
            CategoryGroup::Savings => "Savings",
        }
    }
}

impl fmt::Display for CategoryGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Expense" => Ok(CategoryGroup::Expense),
            "Income" => Ok(CategoryGroup::Income),
            "Savings" => Ok(CategoryGroup::Savings),
            other => Err(format!("unknown category group '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub group: CategoryGroup,
    pub color: String,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub user_id: i64,
    pub name: String,
    pub group: CategoryGroup,
    pub color: String,
}

#[derive(Enum, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[graphql(rename_items = "PascalCase")]
pub enum MonthName {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl MonthName {
    const ALL: [MonthName; 12] = [
        MonthName::January,
        MonthName::February,
        MonthName::March,
        MonthName::April,
        MonthName::May,
        MonthName::June,
        MonthName::July,
        MonthName::August,
        MonthName::September,
        MonthName::October,
        MonthName::November,
        MonthName::December,
    ];

    /// Calendar number, January is 1.
    pub fn number(&self) -> u32 {
        *self as u32 + 1
    }

    pub fn from_number(n: u32) -> Option<Self> {
        n.checked_sub(1)
            .and_then(|i| Self::ALL.get(i as usize))
            .copied()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Month {
    pub id: i64,
    pub user_id: i64,
    pub year: i32,
    pub month: MonthName,
    pub start_month_savings: i64,
    pub start_month_balance: i64,
}

#[derive(Debug, Clone)]
pub struct NewMonth {
    pub user_id: i64,
    pub year: i32,
    pub month: MonthName,
    pub start_month_savings: i64,
    pub start_month_balance: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub amount: i64,
    pub description: String,
    pub group: CategoryGroup,
    pub created_at: NaiveDate,
    pub category_id: Option<i64>,
    pub month_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: i64,
    pub amount: i64,
    pub description: String,
    pub group: CategoryGroup,
    pub created_at: NaiveDate,
    pub category_id: Option<i64>,
    pub month_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub id: i64,
    pub user_id: i64,
    pub category_id: i64,
    pub month_id: i64,
    pub planned_amount: i64,
}

#[derive(Debug, Clone)]
pub struct NewPlan {
    pub user_id: i64,
    pub category_id: i64,
    pub month_id: i64,
    pub planned_amount: i64,
}

/// Rows that belong to exactly one user.
pub trait Owned {
    const ENTITY: &'static str;

    fn owner_id(&self) -> i64;
}

macro_rules! impl_owned {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(impl Owned for $ty {
            const ENTITY: &'static str = $name;

            fn owner_id(&self) -> i64 {
                self.user_id
            }
        })*
    };
}

impl_owned!(
    Category => "Category",
    Month => "Month",
    Transaction => "Transaction",
    Plan => "Plan",
);

#[derive(Debug, Clone, Default)]
pub struct CategoryFilter {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub group: Option<CategoryGroup>,
}

impl CategoryFilter {
    pub fn matches(&self, category: &Category) -> bool {
        self.id.map_or(true, |id| category.id == id)
            && self.name.as_deref().map_or(true, |n| category.name == n)
            && self.group.map_or(true, |g| category.group == g)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MonthFilter {
    pub id: Option<i64>,
    pub year: Option<i32>,
    pub month: Option<MonthName>,
}

impl MonthFilter {
    pub fn matches(&self, month: &Month) -> bool {
        self.id.map_or(true, |id| month.id == id)
            && self.year.map_or(true, |y| month.year == y)
            && self.month.map_or(true, |m| month.month == m)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub created_at: Option<NaiveDate>,
    pub category_id: Option<i64>,
    pub month_id: Option<i64>,
    pub group: Option<CategoryGroup>,
}

impl TransactionFilter {
    pub fn matches(&self, tx: &Transaction) -> bool {
        self.created_at.map_or(true, |d| tx.created_at == d)
            && self.category_id.map_or(true, |c| tx.category_id == Some(c))
            && self.month_id.map_or(true, |m| tx.month_id == Some(m))
            && self.group.map_or(true, |g| tx.group == g)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlanFilter {
    pub category_id: Option<i64>,
    pub month_id: Option<i64>,
}

impl PlanFilter {
    pub fn matches(&self, plan: &Plan) -> bool {
        self.category_id.map_or(true, |c| plan.category_id == c)
            && self.month_id.map_or(true, |m| plan.month_id == m)
    }
}

/// Totals of a user's transactions, optionally restricted to one month.
#[derive(SimpleObject, Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_income: i64,
    pub total_expenses: i64,
    pub total_savings: i64,
    pub balance: i64,
}

impl Summary {
    /// Fails with a validation error when a total leaves the `i64` range.
    pub fn from_transactions<'a>(
        opening_balance: i64,
        transactions: impl IntoIterator<Item = &'a Transaction>,
    ) -> crate::error::Result<Self> {
        let overflow =
            || crate::error::BudgetError::validation("Totals exceed the supported amount range.");
        let mut summary = Summary::default();
        for tx in transactions {
            let total = match tx.group {
                CategoryGroup::Income => &mut summary.total_income,
                CategoryGroup::Expense => &mut summary.total_expenses,
                CategoryGroup::Savings => &mut summary.total_savings,
            };
            *total = total.checked_add(tx.amount).ok_or_else(overflow)?;
        }
        summary.balance = opening_balance
            .checked_add(summary.total_income)
            .and_then(|b| b.checked_sub(summary.total_expenses))
            .ok_or_else(overflow)?;
        Ok(summary)
    }
}
