//! Detail screen of a single book.
//!
//! `is_favorite` is never written by the favorite toggle itself. The toggle only
//! issues the store write, the flag follows the favorites subscription, so a failed
//! write never shows up as a flipped flag.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::watch;

use bookshelf_repository::api::{Book, BookId};
use bookshelf_repository::book_repository::BookRepository;

use crate::navigation::{BookNavigation, Route};
use crate::screen_scope::ScreenScope;
use crate::ui_error::UiError;

#[derive(Debug, Clone, PartialEq)]
pub struct BookDetailState {
    pub book: Option<Book>,
    pub is_favorite: bool,
    /// True until the description lookup finished
    pub is_loading: bool,
    pub description_error: Option<UiError>,
    /// Outcome of the last favorite toggle
    pub favorite_error: Option<UiError>,
}

impl Default for BookDetailState {
    fn default() -> Self {
        Self {
            book: None,
            is_favorite: false,
            is_loading: true,
            description_error: None,
            favorite_error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BookDetailAction {
    FavoriteToggled,
    SelectedBookChanged(Book),
    BackClicked,
}

struct BookDetailInner {
    repository: Arc<dyn BookRepository>,
    book_id: BookId,
    state: watch::Sender<BookDetailState>,
    /// Result of the description lookup, applied to books selected after it finished
    fetched_description: parking_lot::Mutex<Option<String>>,
    scope: ScreenScope,
}

pub struct BookDetailViewModel {
    inner: Arc<BookDetailInner>,
    navigation: BookNavigation,
}

impl BookDetailViewModel {
    /// Opens the detail of the book the navigation currently points at.
    /// Returns None when the navigation is not on a book detail.
    pub fn open(repository: Arc<dyn BookRepository>, navigation: BookNavigation) -> Option<Self> {
        let Route::BookDetail { id: book_id } = navigation.current_route() else {
            tracing::warn!("No book selected, detail not opened");
            return None;
        };
        let book = navigation
            .selected_book()
            .current()
            .filter(|book| book.id == book_id);

        let inner = Arc::new(BookDetailInner {
            repository,
            book_id,
            state: watch::channel(BookDetailState {
                book,
                ..BookDetailState::default()
            })
            .0,
            fetched_description: Default::default(),
            scope: Default::default(),
        });

        let description_inner = inner.clone();
        inner
            .scope
            .spawn(async move { description_inner.fetch_description().await });

        let favorite_inner = inner.clone();
        inner.scope.spawn(async move {
            let mut is_favorite = favorite_inner
                .repository
                .observe_is_favorite(&favorite_inner.book_id);
            while let Some(is_favorite) = is_favorite.next().await {
                favorite_inner.state.send_if_modified(|state| {
                    let changed = state.is_favorite != is_favorite;
                    state.is_favorite = is_favorite;
                    changed
                });
            }
        });

        let selection_inner = inner.clone();
        let mut selection = navigation.selected_book().subscribe();
        inner.scope.spawn(async move {
            while selection.changed().await.is_ok() {
                let selected = selection.borrow_and_update().clone();
                if let Some(book) = selected {
                    selection_inner.on_selected_book_changed(book);
                }
            }
        });

        Some(Self { inner, navigation })
    }

    pub fn on_action(&self, action: BookDetailAction) {
        match action {
            BookDetailAction::FavoriteToggled => {
                let inner = self.inner.clone();
                self.inner
                    .scope
                    .spawn(async move { inner.toggle_favorite().await });
            }
            BookDetailAction::SelectedBookChanged(book) => {
                self.inner.on_selected_book_changed(book);
            }
            BookDetailAction::BackClicked => {
                self.close();
                self.navigation.back_to_list();
            }
        }
    }

    /// Live state, a new receiver sees the current state first
    pub fn state(&self) -> watch::Receiver<BookDetailState> {
        self.inner.state.subscribe()
    }

    pub fn current_state(&self) -> BookDetailState {
        self.inner.state.borrow().clone()
    }

    pub fn close(&self) {
        self.inner.scope.close();
    }
}

impl Drop for BookDetailViewModel {
    fn drop(&mut self) {
        self.close();
    }
}

impl BookDetailInner {
    async fn fetch_description(&self) {
        let result = self.repository.get_book_description(&self.book_id).await;
        self.state.send_modify(|state| {
            state.is_loading = false;
            match &result {
                Ok(description) => {
                    *self.fetched_description.lock() = description.clone();
                    if let Some(book) = state.book.as_mut() {
                        book.description = description.clone();
                    }
                }
                Err(err) => state.description_error = Some(UiError::from(err)),
            }
        });
        if let Err(err) = result {
            tracing::warn!(book_id = %self.book_id, "Failed to get description {}", err);
        }
    }

    async fn toggle_favorite(&self) {
        let (is_favorite, book) = {
            let state = self.state.borrow();
            (state.is_favorite, state.book.clone())
        };
        let result = if is_favorite {
            self.repository.unmark_favorite(&self.book_id).await
        } else if let Some(book) = book {
            self.repository.mark_favorite(&book).await
        } else {
            tracing::debug!(book_id = %self.book_id, "Book not loaded yet, toggle ignored");
            return;
        };
        self.state.send_modify(|state| {
            state.favorite_error = result.as_ref().err().map(UiError::from);
        });
    }

    fn on_selected_book_changed(&self, book: Book) {
        if book.id != self.book_id {
            tracing::warn!(book_id = %book.id, "Selection of another book ignored");
            return;
        }
        self.state.send_modify(|state| {
            let known_description = state
                .book
                .as_mut()
                .and_then(|b| b.description.take())
                .or_else(|| self.fetched_description.lock().clone());
            state.book = Some(Book {
                description: book.description.or(known_description),
                ..book
            });
        });
    }
}

#[cfg(test)]
mod book_detail_view_model_tests {
    use std::time::Duration;

    use bookshelf_repository::error::RemoteError;
    use bookshelf_repository::favorites_store::InMemoryFavoriteBookStore;

    use super::*;
    use crate::test_support::{book, repository, repository_with, FakeRemote};

    async fn wait_for_state(
        view_model: &BookDetailViewModel,
        predicate: impl FnMut(&BookDetailState) -> bool,
    ) -> BookDetailState {
        let mut state = view_model.state();
        let result = tokio::time::timeout(Duration::from_secs(30), state.wait_for(predicate))
            .await
            .expect("State never matched")
            .expect("State channel closed")
            .clone();
        result
    }

    fn navigation_to(book: Book) -> BookNavigation {
        let navigation = BookNavigation::default();
        navigation.open_detail(book);
        navigation
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_to_open_without_selection() {
        let remote = Arc::new(FakeRemote::default());
        assert!(BookDetailViewModel::open(repository(remote), BookNavigation::default()).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_description_fetched_remotely_for_non_favorite() {
        let remote = Arc::new(FakeRemote::default().with_description("b1", "Desert planet"));
        let view_model =
            BookDetailViewModel::open(repository(remote.clone()), navigation_to(book("b1", "Dune")))
                .expect("Detail should open");

        let initial = view_model.current_state();
        assert!(initial.is_loading);
        assert_eq!(initial.book, Some(book("b1", "Dune")));

        let state = wait_for_state(&view_model, |s| !s.is_loading).await;
        assert_eq!(
            state.book.and_then(|b| b.description),
            Some("Desert planet".to_string())
        );
        assert!(!state.is_favorite);
        assert_eq!(remote.detail_calls(), vec!["b1".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    /// A stored favorite without description is shown as is, the remote one is never asked for
    async fn test_favorite_description_served_locally() {
        let remote = Arc::new(FakeRemote::default().with_description("b1", "Desert planet"));
        let repository = repository(remote.clone());
        repository
            .mark_favorite(&book("b1", "Dune"))
            .await
            .unwrap();

        let view_model =
            BookDetailViewModel::open(repository, navigation_to(book("b1", "Dune")))
                .expect("Detail should open");
        let state = wait_for_state(&view_model, |s| !s.is_loading && s.is_favorite).await;

        assert_eq!(state.book.and_then(|b| b.description), None);
        assert!(remote.detail_calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_follows_store_projection() {
        let remote = Arc::new(FakeRemote::default());
        let repository = repository(remote);
        let view_model =
            BookDetailViewModel::open(repository.clone(), navigation_to(book("b1", "Dune")))
                .expect("Detail should open");
        wait_for_state(&view_model, |s| !s.is_loading).await;

        view_model.on_action(BookDetailAction::FavoriteToggled);
        wait_for_state(&view_model, |s| s.is_favorite).await;
        let favorites = repository.observe_favorites().next().await.unwrap();
        assert_eq!(
            favorites.iter().map(|b| b.id.as_str()).collect::<Vec<_>>(),
            vec!["b1"]
        );

        view_model.on_action(BookDetailAction::FavoriteToggled);
        let state = wait_for_state(&view_model, |s| !s.is_favorite).await;
        assert_eq!(state.favorite_error, None);
        assert_eq!(repository.observe_favorites().next().await, Some(vec![]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_mark_is_surfaced_without_flipping_flag() {
        let remote = Arc::new(FakeRemote::default());
        let repository =
            repository_with(remote, Arc::new(InMemoryFavoriteBookStore::with_capacity(0)));
        let view_model = BookDetailViewModel::open(repository, navigation_to(book("b1", "Dune")))
            .expect("Detail should open");
        wait_for_state(&view_model, |s| !s.is_loading).await;

        view_model.on_action(BookDetailAction::FavoriteToggled);
        let state = wait_for_state(&view_model, |s| s.favorite_error.is_some()).await;

        assert_eq!(state.favorite_error, Some(UiError::DiskFull));
        assert!(!state.is_favorite);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_without_book_is_ignored() {
        let remote = Arc::new(FakeRemote::default());
        let repository = repository(remote);
        let navigation = navigation_to(book("b1", "Dune"));
        navigation.selected_book().select(None);

        let view_model = BookDetailViewModel::open(repository.clone(), navigation)
            .expect("Route still points at the book");
        wait_for_state(&view_model, |s| !s.is_loading).await;
        assert_eq!(view_model.current_state().book, None);

        view_model.on_action(BookDetailAction::FavoriteToggled);
        tokio::time::sleep(Duration::from_secs(1)).await;

        let state = view_model.current_state();
        assert!(!state.is_favorite);
        assert_eq!(state.favorite_error, None);
        assert_eq!(repository.observe_favorites().next().await, Some(vec![]));
    }

    #[tokio::test(start_paused = true)]
    /// The book arrives through the selection only after its description was fetched
    async fn test_description_applied_to_book_selected_later() {
        let remote = Arc::new(FakeRemote::default().with_description("b1", "Desert planet"));
        let navigation = navigation_to(book("b1", "Dune"));
        navigation.selected_book().select(None);
        let view_model = BookDetailViewModel::open(repository(remote.clone()), navigation.clone())
            .expect("Route still points at the book");
        wait_for_state(&view_model, |s| !s.is_loading).await;

        tokio::time::sleep(Duration::from_secs(1)).await;
        navigation.selected_book().select(Some(book("b1", "Dune")));

        let state = wait_for_state(&view_model, |s| s.book.is_some()).await;
        assert_eq!(
            state.book.and_then(|b| b.description),
            Some("Desert planet".to_string())
        );
        assert_eq!(remote.detail_calls(), vec!["b1".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_toggle_keeps_description_error() {
        let remote = Arc::new(
            FakeRemote::default().with_failing_description("b1", RemoteError::ServerError),
        );
        let view_model =
            BookDetailViewModel::open(repository(remote), navigation_to(book("b1", "Dune")))
                .expect("Detail should open");
        let state = wait_for_state(&view_model, |s| !s.is_loading).await;
        assert_eq!(state.description_error, Some(UiError::ServerError));

        view_model.on_action(BookDetailAction::FavoriteToggled);
        let state = wait_for_state(&view_model, |s| s.is_favorite).await;

        assert_eq!(state.description_error, Some(UiError::ServerError));
        assert_eq!(state.favorite_error, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_selected_book_change_keeps_fetched_description() {
        let remote = Arc::new(FakeRemote::default().with_description("b1", "Desert planet"));
        let view_model =
            BookDetailViewModel::open(repository(remote), navigation_to(book("b1", "Dune")))
                .expect("Detail should open");
        wait_for_state(&view_model, |s| !s.is_loading).await;

        let renamed = Book {
            title: "Dune (40th anniversary)".to_string(),
            ..book("b1", "Dune")
        };
        view_model.on_action(BookDetailAction::SelectedBookChanged(renamed));
        view_model.on_action(BookDetailAction::SelectedBookChanged(book("b2", "Hyperion")));

        let state = view_model.current_state();
        let shown = state.book.expect("Book should be shown");
        assert_eq!(shown.title, "Dune (40th anniversary)");
        assert_eq!(shown.description.as_deref(), Some("Desert planet"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_clears_selection_and_stops_screen() {
        let remote = Arc::new(FakeRemote::default());
        let repository = repository(remote);
        let navigation = navigation_to(book("b1", "Dune"));
        let view_model = BookDetailViewModel::open(repository.clone(), navigation.clone())
            .expect("Detail should open");

        view_model.on_action(BookDetailAction::BackClicked);
        assert_eq!(navigation.current_route(), Route::BookList);
        assert_eq!(navigation.selected_book().current(), None);

        repository
            .mark_favorite(&book("b1", "Dune"))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!view_model.current_state().is_favorite);
    }
}
