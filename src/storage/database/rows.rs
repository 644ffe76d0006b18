use crate::domain::*;
use crate::error::BudgetError;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::Row;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub const USER_COLUMNS: &str = "id, email, username, password_hash, created_at";
pub const CATEGORY_COLUMNS: &str = "id, user_id, name, grp, color";
pub const MONTH_COLUMNS: &str =
    "id, user_id, year, month, start_month_savings, start_month_balance";
pub const TRANSACTION_COLUMNS: &str =
    "id, user_id, amount, description, grp, created_at, category_id, month_id";
pub const PLAN_COLUMNS: &str = "id, user_id, category_id, month_id, planned_amount";

fn conversion_error(
    idx: usize,
    err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.into())
}

fn group_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<CategoryGroup> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e: String| conversion_error(idx, e))
}

pub fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let created_at: String = row.get(4)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| conversion_error(4, e))?
        .with_timezone(&Utc);
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        username: row.get(2)?,
        password_hash: row.get(3)?,
        created_at,
    })
}

pub fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        group: group_at(row, 3)?,
        color: row.get(4)?,
    })
}

pub fn month_from_row(row: &Row<'_>) -> rusqlite::Result<Month> {
    let number: u32 = row.get(3)?;
    let month = MonthName::from_number(number)
        .ok_or_else(|| conversion_error(3, format!("month number {number} out of range")))?;
    Ok(Month {
        id: row.get(0)?,
        user_id: row.get(1)?,
        year: row.get(2)?,
        month,
        start_month_savings: row.get(4)?,
        start_month_balance: row.get(5)?,
    })
}

pub fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    let created_at: String = row.get(5)?;
    let created_at =
        NaiveDate::parse_from_str(&created_at, DATE_FORMAT).map_err(|e| conversion_error(5, e))?;
    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        amount: row.get(2)?,
        description: row.get(3)?,
        group: group_at(row, 4)?,
        created_at,
        category_id: row.get(6)?,
        month_id: row.get(7)?,
    })
}

pub fn plan_from_row(row: &Row<'_>) -> rusqlite::Result<Plan> {
    Ok(Plan {
        id: row.get(0)?,
        user_id: row.get(1)?,
        category_id: row.get(2)?,
        month_id: row.get(3)?,
        planned_amount: row.get(4)?,
    })
}

/// Translate constraint violations into domain errors; everything else stays
/// a database error.
pub fn constraint_error(err: rusqlite::Error, entity: &'static str) -> BudgetError {
    if let rusqlite::Error::SqliteFailure(ref failure, _) = err {
        match failure.extended_code {
            rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                return BudgetError::AlreadyExists(entity)
            }
            rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                return BudgetError::validation(format!("{entity} references a missing row."))
            }
            _ => {}
        }
    }
    BudgetError::Database(err)
}
