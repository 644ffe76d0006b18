use super::{owned_by, visible_to, BudgetService};
use crate::auth::Viewer;
use crate::domain::{Category, CategoryFilter, CategoryGroup, NewCategory, DEFAULT_CATEGORY_COLOR};
use crate::error::{BudgetError, Result};
use tracing::info;

pub const MAX_CATEGORY_NAME_LEN: usize = 50;

#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub group: Option<CategoryGroup>,
    pub color: Option<String>,
}

fn clean_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(BudgetError::validation("Category name must not be blank."));
    }
    if name.chars().count() > MAX_CATEGORY_NAME_LEN {
        return Err(BudgetError::validation(format!(
            "Category name must be at most {MAX_CATEGORY_NAME_LEN} characters."
        )));
    }
    Ok(name.to_string())
}

fn clean_color(color: Option<String>) -> String {
    color
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string())
}

impl BudgetService {
    pub async fn categories(&self, viewer: Viewer, filter: &CategoryFilter) -> Result<Vec<Category>> {
        self.storage.list_categories(viewer.user_id, filter).await
    }

    pub async fn category(&self, viewer: Viewer, id: i64) -> Result<Option<Category>> {
        Ok(visible_to(self.storage.get_category(id).await?, viewer))
    }

    pub async fn create_category(
        &self,
        viewer: Viewer,
        name: &str,
        group: CategoryGroup,
        color: Option<String>,
    ) -> Result<Category> {
        let name = clean_name(name)?;
        if self
            .storage
            .find_category_by_name(viewer.user_id, &name)
            .await?
            .is_some()
        {
            return Err(BudgetError::AlreadyExists("Category"));
        }

        let category = self
            .storage
            .create_category(NewCategory {
                user_id: viewer.user_id,
                name,
                group,
                color: clean_color(color),
            })
            .await?;
        info!("User {} created category {} '{}'", viewer.user_id, category.id, category.name);
        Ok(category)
    }

    pub async fn update_category(&self, viewer: Viewer, id: i64, patch: CategoryPatch) -> Result<Category> {
        let mut category = owned_by(self.storage.get_category(id).await?, viewer)?;

        if let Some(name) = patch.name {
            let name = clean_name(&name)?;
            if let Some(existing) = self.storage.find_category_by_name(viewer.user_id, &name).await? {
                if existing.id != category.id {
                    return Err(BudgetError::AlreadyExists("Category"));
                }
            }
            category.name = name;
        }
        if let Some(group) = patch.group {
            category.group = group;
        }
        if patch.color.is_some() {
            category.color = clean_color(patch.color);
        }

        self.storage.update_category(&category).await?;
        info!("User {} updated category {}", viewer.user_id, category.id);
        Ok(category)
    }

    pub async fn delete_category(&self, viewer: Viewer, id: i64) -> Result<i64> {
        let category = owned_by(self.storage.get_category(id).await?, viewer)?;
        self.storage.delete_category(category.id).await?;
        info!("User {} deleted category {}", viewer.user_id, category.id);
        Ok(category.id)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{service, viewer};
    use super::*;

    #[tokio::test]
    async fn duplicate_name_fails_without_a_second_row() {
        let service = service();
        let alice = viewer(&service, "alice").await;
        service
            .create_category(alice, "Groceries", CategoryGroup::Expense, None)
            .await
            .unwrap();

        let err = service
            .create_category(alice, "Groceries", CategoryGroup::Income, None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Category already exists.");
        let all = service.categories(alice, &CategoryFilter::default()).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].color, "gray");
    }

    #[tokio::test]
    async fn same_name_is_allowed_for_different_users() {
        let service = service();
        let alice = viewer(&service, "alice").await;
        let bob = viewer(&service, "bob").await;
        service
            .create_category(alice, "Rent", CategoryGroup::Expense, None)
            .await
            .unwrap();
        service
            .create_category(bob, "Rent", CategoryGroup::Expense, Some("red".into()))
            .await
            .unwrap();

        let bobs = service.categories(bob, &CategoryFilter::default()).await.unwrap();
        assert_eq!(bobs.len(), 1);
        assert_eq!(bobs[0].color, "red");
    }

    #[tokio::test]
    async fn foreign_category_is_invisible_and_immutable() {
        let service = service();
        let alice = viewer(&service, "alice").await;
        let bob = viewer(&service, "bob").await;
        let rent = service
            .create_category(alice, "Rent", CategoryGroup::Expense, None)
            .await
            .unwrap();

        assert!(service.category(bob, rent.id).await.unwrap().is_none());
        let patch = CategoryPatch {
            name: Some("Mine".into()),
            ..Default::default()
        };
        let err = service.update_category(bob, rent.id, patch).await.unwrap_err();
        assert!(matches!(err, BudgetError::Forbidden("Category")));
        let err = service.delete_category(bob, rent.id).await.unwrap_err();
        assert!(matches!(err, BudgetError::Forbidden("Category")));

        let unchanged = service.category(alice, rent.id).await.unwrap().unwrap();
        assert_eq!(unchanged.name, "Rent");
    }

    #[tokio::test]
    async fn rename_onto_an_existing_name_is_rejected() {
        let service = service();
        let alice = viewer(&service, "alice").await;
        service
            .create_category(alice, "Rent", CategoryGroup::Expense, None)
            .await
            .unwrap();
        let food = service
            .create_category(alice, "Food", CategoryGroup::Expense, None)
            .await
            .unwrap();

        let patch = CategoryPatch {
            name: Some("Rent".into()),
            ..Default::default()
        };
        assert!(matches!(
            service.update_category(alice, food.id, patch).await,
            Err(BudgetError::AlreadyExists("Category"))
        ));

        // Keeping its own name is fine.
        let patch = CategoryPatch {
            name: Some("Food".into()),
            group: Some(CategoryGroup::Savings),
            color: None,
        };
        let updated = service.update_category(alice, food.id, patch).await.unwrap();
        assert_eq!(updated.group, CategoryGroup::Savings);
    }

    #[tokio::test]
    async fn missing_category_is_not_found() {
        let service = service();
        let alice = viewer(&service, "alice").await;
        assert!(matches!(
            service.delete_category(alice, 999).await,
            Err(BudgetError::NotFound("Category"))
        ));
        assert!(service
            .create_category(alice, "   ", CategoryGroup::Expense, None)
            .await
            .is_err());
    }
}
