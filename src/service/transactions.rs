use super::{owned_by, visible_to, BudgetService};
use crate::auth::Viewer;
use crate::domain::{CategoryGroup, Category, Month, NewTransaction, Transaction, TransactionFilter};
use crate::error::{BudgetError, Result};
use chrono::Utc;
use tracing::info;

pub const MAX_DESCRIPTION_LEN: usize = 100;

/// Input for a new transaction.
#[derive(Debug, Clone, Default)]
pub struct TransactionDraft {
    pub amount: i64,
    pub description: Option<String>,
    pub group: Option<CategoryGroup>,
    pub category_id: Option<i64>,
    pub month_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct TransactionPatch {
    pub amount: Option<i64>,
    pub description: Option<String>,
    pub group: Option<CategoryGroup>,
    pub category_id: Option<i64>,
    pub month_id: Option<i64>,
}

fn check_description(description: &str) -> Result<()> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(BudgetError::validation(format!(
            "Description must be at most {MAX_DESCRIPTION_LEN} characters."
        )));
    }
    Ok(())
}

impl BudgetService {
    pub async fn transactions(
        &self,
        viewer: Viewer,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>> {
        self.storage.list_transactions(viewer.user_id, filter).await
    }

    pub async fn transaction(&self, viewer: Viewer, id: i64) -> Result<Option<Transaction>> {
        Ok(visible_to(self.storage.get_transaction(id).await?, viewer))
    }

    /// The viewer's category with this id; anything else resolves to `None`.
    async fn linkable_category(&self, viewer: Viewer, id: Option<i64>) -> Result<Option<Category>> {
        match id {
            Some(id) => Ok(visible_to(self.storage.get_category(id).await?, viewer)),
            None => Ok(None),
        }
    }

    async fn linkable_month(&self, viewer: Viewer, id: Option<i64>) -> Result<Option<Month>> {
        match id {
            Some(id) => Ok(visible_to(self.storage.get_month(id).await?, viewer)),
            None => Ok(None),
        }
    }

    async fn prepare_transaction(&self, viewer: Viewer, draft: TransactionDraft) -> Result<NewTransaction> {
        let description = draft.description.unwrap_or_default();
        check_description(&description)?;

        let category = self.linkable_category(viewer, draft.category_id).await?;
        let month = self.linkable_month(viewer, draft.month_id).await?;
        let group = draft
            .group
            .or(category.as_ref().map(|c| c.group))
            .unwrap_or(CategoryGroup::Expense);

        Ok(NewTransaction {
            user_id: viewer.user_id,
            amount: draft.amount,
            description,
            group,
            created_at: Utc::now().date_naive(),
            category_id: category.map(|c| c.id),
            month_id: month.map(|m| m.id),
        })
    }

    pub async fn create_transaction(&self, viewer: Viewer, draft: TransactionDraft) -> Result<Transaction> {
        let new = self.prepare_transaction(viewer, draft).await?;
        let transaction = self.storage.create_transaction(new).await?;
        info!(
            "User {} created transaction {} ({} {})",
            viewer.user_id, transaction.id, transaction.group, transaction.amount
        );
        Ok(transaction)
    }

    /// Every draft is validated before anything is stored, and the rows are
    /// inserted together or not at all.
    pub async fn create_transactions(
        &self,
        viewer: Viewer,
        drafts: Vec<TransactionDraft>,
    ) -> Result<Vec<Transaction>> {
        let mut prepared = Vec::with_capacity(drafts.len());
        for draft in drafts {
            prepared.push(self.prepare_transaction(viewer, draft).await?);
        }

        let created = self.storage.create_transactions(prepared).await?;
        info!("User {} created {} transactions", viewer.user_id, created.len());
        Ok(created)
    }

    pub async fn update_transaction(
        &self,
        viewer: Viewer,
        id: i64,
        patch: TransactionPatch,
    ) -> Result<Transaction> {
        let mut transaction = owned_by(self.storage.get_transaction(id).await?, viewer)?;

        if let Some(description) = patch.description {
            check_description(&description)?;
            transaction.description = description;
        }
        if let Some(amount) = patch.amount {
            transaction.amount = amount;
        }
        if let Some(group) = patch.group {
            transaction.group = group;
        }
        if let Some(category) = self.linkable_category(viewer, patch.category_id).await? {
            transaction.category_id = Some(category.id);
        }
        if let Some(month) = self.linkable_month(viewer, patch.month_id).await? {
            transaction.month_id = Some(month.id);
        }

        self.storage.update_transaction(&transaction).await?;
        info!("User {} updated transaction {}", viewer.user_id, transaction.id);
        Ok(transaction)
    }

    pub async fn delete_transaction(&self, viewer: Viewer, id: i64) -> Result<i64> {
        let transaction = owned_by(self.storage.get_transaction(id).await?, viewer)?;
        self.storage.delete_transaction(transaction.id).await?;
        info!("User {} deleted transaction {}", viewer.user_id, transaction.id);
        Ok(transaction.id)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{service, viewer};
    use super::*;
    use crate::domain::{CategoryFilter, MonthName, PlanFilter};

    #[tokio::test]
    async fn group_falls_back_to_category_then_expense() {
        let service = service();
        let alice = viewer(&service, "alice").await;
        let salary = service
            .create_category(alice, "Salary", CategoryGroup::Income, None)
            .await
            .unwrap();

        let linked = service
            .create_transaction(
                alice,
                TransactionDraft {
                    amount: 3000,
                    category_id: Some(salary.id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(linked.group, CategoryGroup::Income);
        assert_eq!(linked.description, "");

        let bare = service
            .create_transaction(alice, TransactionDraft { amount: 20, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(bare.group, CategoryGroup::Expense);
        assert_eq!(bare.created_at, Utc::now().date_naive());
    }

    #[tokio::test]
    async fn foreign_references_are_left_unlinked() {
        let service = service();
        let alice = viewer(&service, "alice").await;
        let bob = viewer(&service, "bob").await;
        let bobs_category = service
            .create_category(bob, "Bills", CategoryGroup::Income, None)
            .await
            .unwrap();
        let bobs_month = service
            .create_month(bob, 2021, MonthName::June, None, None)
            .await
            .unwrap();

        let tx = service
            .create_transaction(
                alice,
                TransactionDraft {
                    amount: 5,
                    category_id: Some(bobs_category.id),
                    month_id: Some(bobs_month.id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(tx.category_id, None);
        assert_eq!(tx.month_id, None);
        assert_eq!(tx.group, CategoryGroup::Expense);

        // A foreign id in a filter matches nothing for the viewer.
        let filter = TransactionFilter {
            category_id: Some(bobs_category.id),
            ..Default::default()
        };
        assert!(service.transactions(alice, &filter).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_keeps_link_when_reference_is_foreign() {
        let service = service();
        let alice = viewer(&service, "alice").await;
        let bob = viewer(&service, "bob").await;
        let food = service
            .create_category(alice, "Food", CategoryGroup::Expense, None)
            .await
            .unwrap();
        let bobs = service
            .create_category(bob, "Food", CategoryGroup::Expense, None)
            .await
            .unwrap();
        let tx = service
            .create_transaction(
                alice,
                TransactionDraft {
                    amount: 12,
                    category_id: Some(food.id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let updated = service
            .update_transaction(
                alice,
                tx.id,
                TransactionPatch {
                    amount: Some(15),
                    category_id: Some(bobs.id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.amount, 15);
        assert_eq!(updated.category_id, Some(food.id));

        assert!(matches!(
            service.delete_transaction(bob, tx.id).await,
            Err(BudgetError::Forbidden("Transaction"))
        ));
        assert!(service.transaction(alice, tx.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn bulk_create_validates_everything_first() {
        let service = service();
        let alice = viewer(&service, "alice").await;
        let drafts = vec![
            TransactionDraft { amount: 1, ..Default::default() },
            TransactionDraft {
                amount: 2,
                description: Some("x".repeat(MAX_DESCRIPTION_LEN + 1)),
                ..Default::default()
            },
        ];
        assert!(matches!(
            service.create_transactions(alice, drafts).await,
            Err(BudgetError::Validation(_))
        ));
        let all = service
            .transactions(alice, &TransactionFilter::default())
            .await
            .unwrap();
        assert!(all.is_empty());

        let drafts = vec![
            TransactionDraft { amount: 1, ..Default::default() },
            TransactionDraft { amount: 2, group: Some(CategoryGroup::Savings), ..Default::default() },
        ];
        let created = service.create_transactions(alice, drafts).await.unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(created[1].group, CategoryGroup::Savings);
    }

    #[tokio::test]
    async fn deleting_a_category_unlinks_transactions_and_drops_plans() {
        let service = service();
        let alice = viewer(&service, "alice").await;
        let food = service
            .create_category(alice, "Food", CategoryGroup::Expense, None)
            .await
            .unwrap();
        let month = service
            .create_month(alice, 2021, MonthName::July, None, None)
            .await
            .unwrap();
        service.create_plan(alice, food.id, month.id, 400).await.unwrap();
        let tx = service
            .create_transaction(
                alice,
                TransactionDraft {
                    amount: 40,
                    category_id: Some(food.id),
                    month_id: Some(month.id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        service.delete_category(alice, food.id).await.unwrap();

        let tx = service.transaction(alice, tx.id).await.unwrap().unwrap();
        assert_eq!(tx.category_id, None);
        assert_eq!(tx.month_id, Some(month.id));
        assert!(service.plans(alice, &PlanFilter::default()).await.unwrap().is_empty());
        assert!(service
            .categories(alice, &CategoryFilter::default())
            .await
            .unwrap()
            .is_empty());
    }
}
