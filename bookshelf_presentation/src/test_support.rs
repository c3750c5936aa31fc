use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bookshelf_repository::api::Book;
use bookshelf_repository::book_repository::{BookRepository, DefaultBookRepository};
use bookshelf_repository::error::RemoteError;
use bookshelf_repository::favorites_store::{FavoriteBookStore, InMemoryFavoriteBookStore};
use bookshelf_repository::remote_data_source::{
    BookWorkDto, RemoteBookDataSource, SearchResponseDto, SearchedBookDto,
};

pub fn book(id: &str, title: &str) -> Book {
    Book::from(searched_book(id, title))
}

fn searched_book(id: &str, title: &str) -> SearchedBookDto {
    SearchedBookDto {
        id: format!("/works/{id}"),
        title: title.to_string(),
        ..SearchedBookDto::default()
    }
}

#[derive(Clone)]
struct ScriptedSearch {
    delay: Duration,
    response: Result<Vec<(String, String)>, RemoteError>,
}

/// Remote with scripted answers per query that records every call.
/// Unscripted queries answer with no books after 10ms.
#[derive(Default)]
pub struct FakeRemote {
    searches: parking_lot::Mutex<HashMap<String, ScriptedSearch>>,
    descriptions: parking_lot::Mutex<HashMap<String, String>>,
    failing_details: parking_lot::Mutex<HashMap<String, RemoteError>>,
    search_calls: parking_lot::Mutex<Vec<String>>,
    detail_calls: parking_lot::Mutex<Vec<String>>,
}

impl FakeRemote {
    pub fn with_search(self, query: &str, delay_ms: u64, books: &[(&str, &str)]) -> Self {
        self.searches.lock().insert(
            query.to_string(),
            ScriptedSearch {
                delay: Duration::from_millis(delay_ms),
                response: Ok(books
                    .iter()
                    .map(|(id, title)| (id.to_string(), title.to_string()))
                    .collect()),
            },
        );
        self
    }

    pub fn with_failing_search(self, query: &str, error: RemoteError) -> Self {
        self.searches.lock().insert(
            query.to_string(),
            ScriptedSearch {
                delay: Duration::from_millis(10),
                response: Err(error),
            },
        );
        self
    }

    pub fn with_description(self, id: &str, description: &str) -> Self {
        self.descriptions
            .lock()
            .insert(id.to_string(), description.to_string());
        self
    }

    pub fn with_failing_description(self, id: &str, error: RemoteError) -> Self {
        self.failing_details.lock().insert(id.to_string(), error);
        self
    }

    pub fn search_calls(&self) -> Vec<String> {
        self.search_calls.lock().clone()
    }

    pub fn detail_calls(&self) -> Vec<String> {
        self.detail_calls.lock().clone()
    }
}

#[async_trait::async_trait]
impl RemoteBookDataSource for FakeRemote {
    async fn search_books(
        &self,
        query: &str,
        _result_limit: Option<u32>,
    ) -> Result<SearchResponseDto, RemoteError> {
        self.search_calls.lock().push(query.to_string());
        let scripted = self
            .searches
            .lock()
            .get(query)
            .cloned()
            .unwrap_or(ScriptedSearch {
                delay: Duration::from_millis(10),
                response: Ok(vec![]),
            });
        tokio::time::sleep(scripted.delay).await;
        scripted.response.map(|books| SearchResponseDto {
            results: books
                .iter()
                .map(|(id, title)| searched_book(id, title))
                .collect(),
        })
    }

    async fn get_book_details(&self, work_id: &str) -> Result<BookWorkDto, RemoteError> {
        self.detail_calls.lock().push(work_id.to_string());
        tokio::time::sleep(Duration::from_millis(10)).await;
        if let Some(error) = self.failing_details.lock().get(work_id).cloned() {
            return Err(error);
        }
        Ok(BookWorkDto {
            description: self.descriptions.lock().get(work_id).cloned(),
        })
    }
}

pub fn repository_with(
    remote: Arc<FakeRemote>,
    store: Arc<dyn FavoriteBookStore>,
) -> Arc<dyn BookRepository> {
    Arc::new(DefaultBookRepository::new(remote, store))
}

pub fn repository(remote: Arc<FakeRemote>) -> Arc<dyn BookRepository> {
    repository_with(remote, Arc::new(InMemoryFavoriteBookStore::default()))
}
