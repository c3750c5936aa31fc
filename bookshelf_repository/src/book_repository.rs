use std::sync::Arc;

use futures_util::stream::{BoxStream, StreamExt};

use crate::api::{Book, BookId, FavoriteBookRecord};
use crate::error::{DataError, LocalError, RemoteError};
use crate::favorites_store::FavoriteBookStore;
use crate::live;
use crate::remote_data_source::RemoteBookDataSource;

/// Books as seen by the screens: remote search merged with the local favorites
#[async_trait::async_trait]
pub trait BookRepository: Send + Sync {
    /// Searches the remote catalogue, favorites are not mixed into the results
    async fn search_books(&self, query: &str) -> Result<Vec<Book>, RemoteError>;
    /// Description of the book, taken from the stored favorite when there is one,
    /// otherwise fetched remotely
    async fn get_book_description(&self, book_id: &str) -> Result<Option<String>, DataError>;
    /// All favorite books, re-emitted as a full list on every change
    fn observe_favorites(&self) -> BoxStream<'static, Vec<Book>>;
    /// Whether `book_id` is a favorite, re-evaluated on every change of the favorites
    fn observe_is_favorite(&self, book_id: &str) -> BoxStream<'static, bool>;
    /// Stores the book as a favorite, replacing a previously stored copy
    async fn mark_favorite(&self, book: &Book) -> Result<(), LocalError>;
    /// Removes the book from favorites, does nothing if it is not one
    async fn unmark_favorite(&self, book_id: &str) -> Result<(), LocalError>;
}

pub struct DefaultBookRepository {
    remote: Arc<dyn RemoteBookDataSource>,
    favorites: Arc<dyn FavoriteBookStore>,
    search_result_limit: Option<u32>,
}

impl DefaultBookRepository {
    pub fn new(
        remote: Arc<dyn RemoteBookDataSource>,
        favorites: Arc<dyn FavoriteBookStore>,
    ) -> Self {
        Self {
            remote,
            favorites,
            search_result_limit: None,
        }
    }

    pub fn with_search_result_limit(mut self, search_result_limit: Option<u32>) -> Self {
        self.search_result_limit = search_result_limit;
        self
    }
}

#[async_trait::async_trait]
impl BookRepository for DefaultBookRepository {
    #[tracing::instrument(skip(self))]
    async fn search_books(&self, query: &str) -> Result<Vec<Book>, RemoteError> {
        let response = self
            .remote
            .search_books(query, self.search_result_limit)
            .await?;
        Ok(response.results.into_iter().map(Book::from).collect())
    }

    #[tracing::instrument(skip(self))]
    async fn get_book_description(&self, book_id: &str) -> Result<Option<String>, DataError> {
        // A stored favorite always answers, even without a description
        match self.favorites.get_by_id(book_id).await? {
            Some(record) => {
                tracing::debug!("Description of {} served from favorites", book_id);
                Ok(record.description)
            }
            None => Ok(self.remote.get_book_details(book_id).await?.description),
        }
    }

    fn observe_favorites(&self) -> BoxStream<'static, Vec<Book>> {
        live::snapshots(self.favorites.observe_all())
            .map(|records| records.into_iter().map(Book::from).collect())
            .boxed()
    }

    fn observe_is_favorite(&self, book_id: &str) -> BoxStream<'static, bool> {
        let book_id: BookId = book_id.to_string();
        live::snapshots(self.favorites.observe_all())
            .map(move |records| records.iter().any(|record| record.id == book_id))
            .boxed()
    }

    #[tracing::instrument(skip(self, book), fields(book_id = %book.id))]
    async fn mark_favorite(&self, book: &Book) -> Result<(), LocalError> {
        self.favorites
            .upsert(FavoriteBookRecord::from(book))
            .await
            .inspect_err(|err| tracing::error!("Failed to mark favorite {}", err))
    }

    #[tracing::instrument(skip(self))]
    async fn unmark_favorite(&self, book_id: &str) -> Result<(), LocalError> {
        self.favorites
            .delete(book_id)
            .await
            .inspect_err(|err| tracing::error!("Failed to unmark favorite {}", err))
    }
}
