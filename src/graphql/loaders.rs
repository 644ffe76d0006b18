use crate::domain::{Category, Month};
use crate::storage::Storage;
use async_graphql::dataloader::{DataLoader, Loader};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// DataLoader for batching category lookups
pub struct CategoryLoader {
    storage: Arc<dyn Storage>,
}

impl CategoryLoader {
    pub fn new(storage: Arc<dyn Storage>) -> DataLoader<Self> {
        DataLoader::new(Self { storage }, tokio::spawn)
    }
}

#[async_trait]
impl Loader<i64> for CategoryLoader {
    type Value = Category;
    type Error = String;

    async fn load(&self, keys: &[i64]) -> Result<HashMap<i64, Self::Value>, Self::Error> {
        let categories = self
            .storage
            .get_categories_by_ids(keys.to_vec())
            .await
            .map_err(|e| e.to_string())?;

        Ok(categories.into_iter().map(|c| (c.id, c)).collect())
    }
}

/// DataLoader for batching month lookups
pub struct MonthLoader {
    storage: Arc<dyn Storage>,
}

impl MonthLoader {
    pub fn new(storage: Arc<dyn Storage>) -> DataLoader<Self> {
        DataLoader::new(Self { storage }, tokio::spawn)
    }
}

#[async_trait]
impl Loader<i64> for MonthLoader {
    type Value = Month;
    type Error = String;

    async fn load(&self, keys: &[i64]) -> Result<HashMap<i64, Self::Value>, Self::Error> {
        let months = self
            .storage
            .get_months_by_ids(keys.to_vec())
            .await
            .map_err(|e| e.to_string())?;

        Ok(months.into_iter().map(|m| (m.id, m)).collect())
    }
}
