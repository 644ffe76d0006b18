use super::{owned_by, visible_to, BudgetService};
use crate::auth::Viewer;
use crate::domain::{NewPlan, Plan, PlanFilter, Summary, TransactionFilter};
use crate::error::{BudgetError, Result};
use tracing::info;

impl BudgetService {
    pub async fn plans(&self, viewer: Viewer, filter: &PlanFilter) -> Result<Vec<Plan>> {
        self.storage.list_plans(viewer.user_id, filter).await
    }

    pub async fn plan(&self, viewer: Viewer, id: i64) -> Result<Option<Plan>> {
        Ok(visible_to(self.storage.get_plan(id).await?, viewer))
    }

    pub async fn create_plan(
        &self,
        viewer: Viewer,
        category_id: i64,
        month_id: i64,
        planned_amount: i64,
    ) -> Result<Plan> {
        let category = visible_to(self.storage.get_category(category_id).await?, viewer)
            .ok_or(BudgetError::NotFound("Category"))?;
        let month = visible_to(self.storage.get_month(month_id).await?, viewer)
            .ok_or(BudgetError::NotFound("Month"))?;
        if self
            .storage
            .find_plan(viewer.user_id, category.id, month.id)
            .await?
            .is_some()
        {
            return Err(BudgetError::AlreadyExists("Plan"));
        }

        let plan = self
            .storage
            .create_plan(NewPlan {
                user_id: viewer.user_id,
                category_id: category.id,
                month_id: month.id,
                planned_amount,
            })
            .await?;
        info!(
            "User {} planned {} for category {} in month {}",
            viewer.user_id, planned_amount, category.id, month.id
        );
        Ok(plan)
    }

    pub async fn update_plan(&self, viewer: Viewer, id: i64, planned_amount: Option<i64>) -> Result<Plan> {
        let mut plan = owned_by(self.storage.get_plan(id).await?, viewer)?;
        if let Some(amount) = planned_amount {
            plan.planned_amount = amount;
        }
        self.storage.update_plan(&plan).await?;
        info!("User {} updated plan {}", viewer.user_id, plan.id);
        Ok(plan)
    }

    pub async fn delete_plan(&self, viewer: Viewer, id: i64) -> Result<i64> {
        let plan = owned_by(self.storage.get_plan(id).await?, viewer)?;
        self.storage.delete_plan(plan.id).await?;
        info!("User {} deleted plan {}", viewer.user_id, plan.id);
        Ok(plan.id)
    }

    /// Income, expense and savings totals of the viewer's transactions. With a
    /// month, only its transactions count and its opening balance is added.
    pub async fn summary(&self, viewer: Viewer, month_id: Option<i64>) -> Result<Summary> {
        let opening_balance = match month_id {
            Some(id) => {
                visible_to(self.storage.get_month(id).await?, viewer)
                    .ok_or(BudgetError::NotFound("Month"))?
                    .start_month_balance
            }
            None => 0,
        };
        let filter = TransactionFilter {
            month_id,
            ..Default::default()
        };
        let transactions = self.storage.list_transactions(viewer.user_id, &filter).await?;
        Summary::from_transactions(opening_balance, &transactions)
    }
}
