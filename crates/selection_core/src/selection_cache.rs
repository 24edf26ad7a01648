use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use shared::{domain::ItemId, protocol::SelectionSnapshot};
use storage::Storage;
use tokio::sync::Mutex;

use crate::SelectionCache;

pub const SNAPSHOT_KEY: &str = "itemsStore";

/// Selection snapshot kept in the local sqlite store.
pub struct DurableSelectionCache {
    store: Storage,
    key: String,
}

impl DurableSelectionCache {
    pub async fn initialize(database_url: &str) -> Result<Self> {
        let store = Storage::new(database_url)
            .await
            .with_context(|| format!("failed to initialize selection cache at '{database_url}'"))?;
        Ok(Self::with_storage(store))
    }

    pub fn with_storage(store: Storage) -> Self {
        Self {
            store,
            key: SNAPSHOT_KEY.to_string(),
        }
    }

    pub fn sqlite_url_for_data_dir(base_dir: &Path) -> String {
        format!("sqlite://{}", base_dir.join("selection_cache.sqlite3").display())
    }

    pub fn storage(&self) -> &Storage {
        &self.store
    }
}

#[async_trait]
impl SelectionCache for DurableSelectionCache {
    async fn save(&self, ids: &[ItemId]) -> Result<()> {
        let encoded = serde_json::to_string(&SelectionSnapshot {
            selected_ids: ids.to_vec(),
        })?;
        self.store.put_snapshot(&self.key, &encoded).await
    }

    async fn load(&self) -> Result<Option<Vec<ItemId>>> {
        let Some(stored) = self.store.get_snapshot(&self.key).await? else {
            return Ok(None);
        };
        let snapshot: SelectionSnapshot = serde_json::from_str(&stored.value)
            .with_context(|| format!("corrupt selection snapshot under '{}'", self.key))?;
        Ok(Some(snapshot.selected_ids))
    }
}

#[derive(Default)]
pub struct InMemorySelectionCache {
    ids: Mutex<Option<Vec<ItemId>>>,
}

#[async_trait]
impl SelectionCache for InMemorySelectionCache {
    async fn save(&self, ids: &[ItemId]) -> Result<()> {
        *self.ids.lock().await = Some(ids.to_vec());
        Ok(())
    }

    async fn load(&self) -> Result<Option<Vec<ItemId>>> {
        Ok(self.ids.lock().await.clone())
    }
}

#[cfg(test)]
#[path = "tests/selection_cache_tests.rs"]
mod tests;
