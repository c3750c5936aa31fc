//! Search and favorites list screen.
//!
//! [`BookListViewModel`] owns one [`BookListState`] published on a watch channel.
//! Actions and the results of background work are applied through the channel's
//! write lock, so no two updates interleave their read-modify-write.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::watch;

use bookshelf_repository::api::Book;
use bookshelf_repository::book_repository::BookRepository;

use crate::navigation::BookNavigation;
use crate::query_pipeline::{
    debounce_queries, QueryPipelineConfig, SearchGeneration, SearchGenerations, SettledQuery,
};
use crate::screen_scope::ScreenScope;
use crate::ui_error::UiError;

pub const DEFAULT_SEED_QUERY: &str = "Kotlin";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BookListTab {
    #[default]
    Search,
    Favorites,
}

impl BookListTab {
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(BookListTab::Search),
            1 => Some(BookListTab::Favorites),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        match self {
            BookListTab::Search => 0,
            BookListTab::Favorites => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookListState {
    pub search_query: String,
    pub search_results: Vec<Book>,
    pub favorite_books: Vec<Book>,
    /// Only true while the search of the current generation is outstanding
    pub is_loading: bool,
    pub selected_tab: BookListTab,
    pub error: Option<UiError>,
}

impl BookListState {
    /// Starts out loading, the seed query is searched as soon as the screen opens
    pub fn new(seed_query: &str) -> Self {
        Self {
            search_query: seed_query.to_string(),
            search_results: vec![],
            favorite_books: vec![],
            is_loading: true,
            selected_tab: BookListTab::Search,
            error: None,
        }
    }

    /// Books of the selected tab
    pub fn visible_books(&self) -> &[Book] {
        match self.selected_tab {
            BookListTab::Search => &self.search_results,
            BookListTab::Favorites => &self.favorite_books,
        }
    }
}

impl Default for BookListState {
    fn default() -> Self {
        Self::new(DEFAULT_SEED_QUERY)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BookListAction {
    QueryChanged(String),
    TabSelected(usize),
    BookClicked(Book),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookListConfig {
    pub seed_query: String,
    pub pipeline: QueryPipelineConfig,
}

impl Default for BookListConfig {
    fn default() -> Self {
        Self {
            seed_query: DEFAULT_SEED_QUERY.to_string(),
            pipeline: QueryPipelineConfig::default(),
        }
    }
}

struct BookListInner {
    repository: Arc<dyn BookRepository>,
    state: watch::Sender<BookListState>,
    query: watch::Sender<String>,
    /// Results of the seed search, shown again when the query is cleared
    base_results: parking_lot::RwLock<Option<Vec<Book>>>,
    /// Set by the first edit of the query, searches settled after it are no seed searches
    query_edited: AtomicBool,
    searches: SearchGenerations,
    pipeline: QueryPipelineConfig,
    scope: ScreenScope,
}

pub struct BookListViewModel {
    inner: Arc<BookListInner>,
    navigation: BookNavigation,
}

impl BookListViewModel {
    /// Opens the screen: starts the query pipeline and the favorites subscription.
    /// Both live until the view model is closed or dropped.
    pub fn new(
        repository: Arc<dyn BookRepository>,
        navigation: BookNavigation,
        config: BookListConfig,
    ) -> Self {
        let inner = Arc::new(BookListInner {
            repository,
            state: watch::channel(BookListState::new(&config.seed_query)).0,
            query: watch::channel(config.seed_query.clone()).0,
            base_results: Default::default(),
            query_edited: AtomicBool::new(false),
            searches: Default::default(),
            pipeline: config.pipeline,
            scope: Default::default(),
        });

        let pipeline_inner = inner.clone();
        let queries = inner.query.subscribe();
        inner.scope.spawn(async move {
            let window = pipeline_inner.pipeline.debounce;
            debounce_queries(queries, window, |query| {
                pipeline_inner.clone().on_query_settled(query)
            })
            .await
        });

        let favorites_inner = inner.clone();
        inner.scope.spawn(async move {
            let mut favorites = favorites_inner.repository.observe_favorites();
            while let Some(favorite_books) = favorites.next().await {
                favorites_inner
                    .state
                    .send_modify(|state| state.favorite_books = favorite_books);
            }
        });

        Self { inner, navigation }
    }

    pub fn on_action(&self, action: BookListAction) {
        match action {
            BookListAction::QueryChanged(query) => {
                if *self.inner.query.borrow() != query {
                    self.inner.query_edited.store(true, Ordering::SeqCst);
                }
                self.inner.state.send_if_modified(|state| {
                    if state.search_query == query {
                        return false;
                    }
                    state.search_query = query.clone();
                    true
                });
                self.inner.query.send_if_modified(|current| {
                    if *current == query {
                        return false;
                    }
                    *current = query;
                    true
                });
            }
            BookListAction::TabSelected(index) => match BookListTab::from_index(index) {
                Some(tab) => {
                    self.inner.state.send_if_modified(|state| {
                        let changed = state.selected_tab != tab;
                        state.selected_tab = tab;
                        changed
                    });
                }
                None => tracing::warn!("Ignoring selection of unknown tab {}", index),
            },
            BookListAction::BookClicked(book) => {
                self.navigation.open_detail(book);
            }
        }
    }

    /// Live state, a new receiver sees the current state first
    pub fn state(&self) -> watch::Receiver<BookListState> {
        self.inner.state.subscribe()
    }

    pub fn current_state(&self) -> BookListState {
        self.inner.state.borrow().clone()
    }

    /// Stops the pipeline, the outstanding search and the favorites subscription
    pub fn close(&self) {
        self.inner.scope.close();
    }
}

impl Drop for BookListViewModel {
    fn drop(&mut self) {
        self.close();
    }
}

impl BookListInner {
    fn on_query_settled(self: Arc<Self>, query: String) {
        match self.pipeline.classify(&query) {
            SettledQuery::Blank => {
                self.searches.cancel_current();
                let base_results = self.base_results.read().clone().unwrap_or_default();
                self.state.send_modify(|state| {
                    state.error = None;
                    state.is_loading = false;
                    state.search_results = base_results;
                });
            }
            SettledQuery::TooShort => {
                tracing::debug!(%query, "Query too short, keeping current results");
            }
            SettledQuery::Search(query) => {
                let is_seed = !self.query_edited.load(Ordering::SeqCst);
                let generation = self.searches.start(self.scope.token());
                let inner = self.clone();
                self.scope.spawn(inner.search(query, generation, is_seed));
            }
        }
    }

    async fn search(self: Arc<Self>, query: String, generation: SearchGeneration, is_seed: bool) {
        let started = self.state.send_if_modified(|state| {
            if !generation.is_current() {
                return false;
            }
            state.is_loading = true;
            true
        });
        if !started {
            return;
        }
        tracing::info!(generation = generation.id, %query, "Searching books");

        let result = tokio::select! {
            _ = generation.superseded() => {
                tracing::debug!(generation = generation.id, "Search dropped before completion");
                return;
            }
            result = self.repository.search_books(&query) => result,
        };

        let applied = self.state.send_if_modified(|state| {
            if !generation.is_current() {
                return false;
            }
            state.is_loading = false;
            match &result {
                Ok(books) => {
                    state.error = None;
                    state.search_results = books.clone();
                }
                Err(err) => {
                    state.search_results = vec![];
                    state.error = Some(UiError::from(err));
                }
            }
            true
        });

        match result {
            Ok(books) if applied => {
                tracing::info!(generation = generation.id, found = books.len(), "Search finished");
                if is_seed {
                    *self.base_results.write() = Some(books);
                }
            }
            Err(err) if applied => {
                tracing::warn!(generation = generation.id, "Search failed {}", err)
            }
            _ => tracing::debug!(generation = generation.id, "Stale search result discarded"),
        }
    }
}
