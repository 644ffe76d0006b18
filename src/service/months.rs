use super::{owned_by, visible_to, BudgetService};
use crate::auth::Viewer;
use crate::domain::{Month, MonthFilter, MonthName, NewMonth};
use crate::error::{BudgetError, Result};
use std::ops::RangeInclusive;
use tracing::info;

pub const YEAR_RANGE: RangeInclusive<i32> = 1900..=2200;

#[derive(Debug, Clone, Default)]
pub struct MonthPatch {
    pub start_month_savings: Option<i64>,
    pub start_month_balance: Option<i64>,
}

impl BudgetService {
    pub async fn months(&self, viewer: Viewer, filter: &MonthFilter) -> Result<Vec<Month>> {
        self.storage.list_months(viewer.user_id, filter).await
    }

    pub async fn month(&self, viewer: Viewer, id: i64) -> Result<Option<Month>> {
        Ok(visible_to(self.storage.get_month(id).await?, viewer))
    }

    pub async fn create_month(
        &self,
        viewer: Viewer,
        year: i32,
        month: MonthName,
        start_month_savings: Option<i64>,
        start_month_balance: Option<i64>,
    ) -> Result<Month> {
        if !YEAR_RANGE.contains(&year) {
            return Err(BudgetError::validation(format!(
                "Year must be between {} and {}.",
                YEAR_RANGE.start(),
                YEAR_RANGE.end()
            )));
        }
        if self
            .storage
            .find_month(viewer.user_id, year, month)
            .await?
            .is_some()
        {
            return Err(BudgetError::AlreadyExists("Month"));
        }

        let created = self
            .storage
            .create_month(NewMonth {
                user_id: viewer.user_id,
                year,
                month,
                start_month_savings: start_month_savings.unwrap_or(0),
                start_month_balance: start_month_balance.unwrap_or(0),
            })
            .await?;
        info!("User {} created month {} ({:?} {})", viewer.user_id, created.id, month, year);
        Ok(created)
    }

    pub async fn update_month(&self, viewer: Viewer, id: i64, patch: MonthPatch) -> Result<Month> {
        let mut month = owned_by(self.storage.get_month(id).await?, viewer)?;
        if let Some(savings) = patch.start_month_savings {
            month.start_month_savings = savings;
        }
        if let Some(balance) = patch.start_month_balance {
            month.start_month_balance = balance;
        }
        self.storage.update_month(&month).await?;
        info!("User {} updated month {}", viewer.user_id, month.id);
        Ok(month)
    }

    pub async fn delete_month(&self, viewer: Viewer, id: i64) -> Result<i64> {
        let month = owned_by(self.storage.get_month(id).await?, viewer)?;
        self.storage.delete_month(month.id).await?;
        info!("User {} deleted month {}", viewer.user_id, month.id);
        Ok(month.id)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{service, viewer};
    use super::super::TransactionDraft;
    use super::*;
    use crate::domain::{CategoryGroup, PlanFilter};

    #[tokio::test]
    async fn month_is_unique_per_user_and_period() {
        let service = service();
        let alice = viewer(&service, "alice").await;
        let bob = viewer(&service, "bob").await;

        let jan = service
            .create_month(alice, 2021, MonthName::January, None, Some(500))
            .await
            .unwrap();
        assert_eq!(jan.start_month_savings, 0);
        assert_eq!(jan.start_month_balance, 500);

        let err = service
            .create_month(alice, 2021, MonthName::January, None, None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Month already exists.");

        service
            .create_month(bob, 2021, MonthName::January, None, None)
            .await
            .unwrap();
        service
            .create_month(alice, 2022, MonthName::January, None, None)
            .await
            .unwrap();
        assert_eq!(service.months(alice, &MonthFilter::default()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn filter_by_year_and_name() {
        let service = service();
        let alice = viewer(&service, "alice").await;
        for name in [MonthName::January, MonthName::February] {
            service.create_month(alice, 2021, name, None, None).await.unwrap();
        }
        let filter = MonthFilter {
            year: Some(2021),
            month: Some(MonthName::February),
            ..Default::default()
        };
        let found = service.months(alice, &filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].month, MonthName::February);
    }

    #[tokio::test]
    async fn out_of_range_year_is_rejected() {
        let service = service();
        let alice = viewer(&service, "alice").await;
        let err = service
            .create_month(alice, 1800, MonthName::March, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, BudgetError::Validation(_)));
    }

    #[tokio::test]
    async fn only_the_owner_may_patch() {
        let service = service();
        let alice = viewer(&service, "alice").await;
        let bob = viewer(&service, "bob").await;
        let month = service
            .create_month(alice, 2021, MonthName::May, None, None)
            .await
            .unwrap();

        let patch = MonthPatch {
            start_month_balance: Some(100),
            ..Default::default()
        };
        assert!(matches!(
            service.update_month(bob, month.id, patch.clone()).await,
            Err(BudgetError::Forbidden("Month"))
        ));
        let updated = service.update_month(alice, month.id, patch).await.unwrap();
        assert_eq!(updated.start_month_balance, 100);
        assert_eq!(updated.start_month_savings, 0);
    }

    #[tokio::test]
    async fn deleting_a_month_unlinks_transactions_and_drops_plans() {
        let service = service();
        let alice = viewer(&service, "alice").await;
        let bob = viewer(&service, "bob").await;
        let food = service
            .create_category(alice, "Food", CategoryGroup::Expense, None)
            .await
            .unwrap();
        let month = service
            .create_month(alice, 2021, MonthName::June, None, None)
            .await
            .unwrap();
        let tx = service
            .create_transaction(
                alice,
                TransactionDraft {
                    amount: 75,
                    category_id: Some(food.id),
                    month_id: Some(month.id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        service.create_plan(alice, food.id, month.id, 300).await.unwrap();

        assert!(matches!(
            service.delete_month(bob, month.id).await,
            Err(BudgetError::Forbidden("Month"))
        ));
        assert_eq!(service.delete_month(alice, month.id).await.unwrap(), month.id);

        assert!(service.month(alice, month.id).await.unwrap().is_none());
        let tx = service.transaction(alice, tx.id).await.unwrap().unwrap();
        assert_eq!(tx.month_id, None);
        assert_eq!(tx.category_id, Some(food.id));
        assert!(service
            .plans(alice, &PlanFilter::default())
            .await
            .unwrap()
            .is_empty());
        assert!(matches!(
            service.delete_month(alice, month.id).await,
            Err(BudgetError::NotFound("Month"))
        ));
    }
}
