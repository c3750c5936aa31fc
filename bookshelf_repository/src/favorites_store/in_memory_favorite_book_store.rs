use std::collections::BTreeMap;

use tokio::sync::watch;

use crate::api::{BookId, FavoriteBookRecord};
use crate::error::LocalError;
use crate::favorites_store::FavoriteBookStore;

pub struct InMemoryFavoriteBookStore {
    records: parking_lot::RwLock<BTreeMap<BookId, FavoriteBookRecord>>,
    snapshot: watch::Sender<Vec<FavoriteBookRecord>>,
    /// Maximum number of records, inserting beyond it fails with `LocalError::DiskFull`
    capacity: Option<usize>,
}

impl Default for InMemoryFavoriteBookStore {
    fn default() -> Self {
        Self {
            records: Default::default(),
            snapshot: watch::channel(Vec::new()).0,
            capacity: None,
        }
    }
}

impl InMemoryFavoriteBookStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    fn publish(&self, records: &BTreeMap<BookId, FavoriteBookRecord>) {
        self.snapshot.send_replace(records.values().cloned().collect());
    }
}

#[async_trait::async_trait]
impl FavoriteBookStore for InMemoryFavoriteBookStore {
    async fn upsert(&self, record: FavoriteBookRecord) -> Result<(), LocalError> {
        let mut locked_records = self.records.write();
        if let Some(capacity) = self.capacity {
            if !locked_records.contains_key(&record.id) && locked_records.len() >= capacity {
                return Err(LocalError::DiskFull);
            }
        }
        locked_records.insert(record.id.clone(), record);
        self.publish(&locked_records);
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<FavoriteBookRecord>, LocalError> {
        Ok(self.records.read().get(id).cloned())
    }

    async fn delete(&self, id: &str) -> Result<(), LocalError> {
        let mut locked_records = self.records.write();
        if locked_records.remove(id).is_some() {
            self.publish(&locked_records);
        }
        Ok(())
    }

    fn observe_all(&self) -> watch::Receiver<Vec<FavoriteBookRecord>> {
        self.snapshot.subscribe()
    }
}
