pub use in_memory_favorite_book_store::InMemoryFavoriteBookStore;
pub use postgres_favorite_book_store::{
    PostgresFavoriteBookStore, PostgresFavoriteBookStoreConfig,
};

use tokio::sync::watch;

use crate::api::FavoriteBookRecord;
use crate::error::LocalError;

mod in_memory_favorite_book_store;
mod postgres_favorite_book_store;

/// Local table of favorite books keyed by book id
#[async_trait::async_trait]
pub trait FavoriteBookStore: Send + Sync {
    /// Inserts the record or replaces the one stored under the same id
    async fn upsert(&self, record: FavoriteBookRecord) -> Result<(), LocalError>;
    /// Retrieves the record stored under `id`, None if there is none
    async fn get_by_id(&self, id: &str) -> Result<Option<FavoriteBookRecord>, LocalError>;
    /// Removes the record stored under `id`, removing a missing id is not an error
    async fn delete(&self, id: &str) -> Result<(), LocalError>;
    /// Live view of the whole table, every successful write publishes a full snapshot
    fn observe_all(&self) -> watch::Receiver<Vec<FavoriteBookRecord>>;
}
