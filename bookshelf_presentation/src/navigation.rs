use std::sync::Arc;

use tokio::sync::watch;

use bookshelf_repository::api::{Book, BookId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    BookList,
    BookDetail { id: BookId },
}

/// Book the user navigated to, shared by the list and detail screens of one navigation graph.
/// Only [`BookNavigation`] writes it, both screens read it.
#[derive(Clone)]
pub struct SelectedBook {
    slot: Arc<watch::Sender<Option<Book>>>,
}

impl SelectedBook {
    fn new() -> Self {
        Self {
            slot: Arc::new(watch::channel(None).0),
        }
    }

    pub(crate) fn select(&self, book: Option<Book>) {
        self.slot.send_replace(book);
    }

    pub fn current(&self) -> Option<Book> {
        self.slot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Book>> {
        self.slot.subscribe()
    }
}

/// The list <-> detail navigation edge
#[derive(Clone)]
pub struct BookNavigation {
    selected: SelectedBook,
    route: Arc<watch::Sender<Route>>,
}

impl Default for BookNavigation {
    fn default() -> Self {
        Self {
            selected: SelectedBook::new(),
            route: Arc::new(watch::channel(Route::BookList).0),
        }
    }
}

impl BookNavigation {
    /// Selects `book` and moves to its detail
    pub fn open_detail(&self, book: Book) -> Route {
        let route = Route::BookDetail {
            id: book.id.clone(),
        };
        tracing::info!(book_id = %book.id, "Opening book detail");
        self.selected.select(Some(book));
        self.route.send_replace(route.clone());
        route
    }

    /// Moves back to the list, the selection does not outlive the detail screen
    pub fn back_to_list(&self) {
        self.selected.select(None);
        self.route.send_replace(Route::BookList);
    }

    pub fn selected_book(&self) -> &SelectedBook {
        &self.selected
    }

    pub fn current_route(&self) -> Route {
        self.route.borrow().clone()
    }
}
