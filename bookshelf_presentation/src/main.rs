use std::future::pending;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

use bookshelf_presentation::app_config::AppSettings;
use bookshelf_presentation::book_detail::{BookDetailAction, BookDetailState, BookDetailViewModel};
use bookshelf_presentation::book_list::{BookListAction, BookListViewModel};
use bookshelf_presentation::navigation::BookNavigation;
use bookshelf_presentation::telemetry::{init_telemetry, shutdown_telemetry};
use bookshelf_presentation::terminal::{parse_command, render_detail, render_list, Command};
use bookshelf_repository::book_repository::{BookRepository, DefaultBookRepository};
use bookshelf_repository::client::OpenLibraryClient;
use bookshelf_repository::favorites_store::{
    FavoriteBookStore, InMemoryFavoriteBookStore, PostgresFavoriteBookStore,
};

async fn init_repository(settings: &AppSettings) -> anyhow::Result<Arc<dyn BookRepository>> {
    let remote = Arc::new(
        OpenLibraryClient::new(settings.open_library_client_config())
            .context("Failed to create Open Library client")?,
    );
    let favorites: Arc<dyn FavoriteBookStore> = if settings.use_in_memory_db {
        Arc::new(InMemoryFavoriteBookStore::default())
    } else {
        Arc::new(
            PostgresFavoriteBookStore::init(settings.postgres_config())
                .await
                .context("Failed to init postgres")?,
        )
    };
    Ok(Arc::new(
        DefaultBookRepository::new(remote, favorites)
            .with_search_result_limit(settings.search_result_limit),
    ))
}

async fn detail_changed(detail_state: &mut Option<watch::Receiver<BookDetailState>>) {
    match detail_state {
        Some(receiver) => {
            if receiver.changed().await.is_err() {
                pending::<()>().await
            }
        }
        None => pending().await,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = AppSettings::load()?;
    init_telemetry(&settings)?;
    tracing::info!("Starting bookshelf");

    let repository = init_repository(&settings).await?;
    let navigation = BookNavigation::default();
    let list = BookListViewModel::new(
        repository.clone(),
        navigation.clone(),
        settings.list_config(),
    );
    let mut list_state = list.state();
    let mut detail: Option<BookDetailViewModel> = None;
    let mut detail_state: Option<watch::Receiver<BookDetailState>> = None;

    println!("{}", render_list(&list_state.borrow_and_update()));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                let command = match parse_command(&line) {
                    Ok(command) => command,
                    Err(err) => {
                        println!("{}", err);
                        continue;
                    }
                };
                match command {
                    Command::Quit => break,
                    Command::Query(query) => list.on_action(BookListAction::QueryChanged(query)),
                    Command::Tab(tab) => list.on_action(BookListAction::TabSelected(tab.index())),
                    Command::Open(position) => {
                        let book = list.current_state().visible_books().get(position - 1).cloned();
                        let Some(book) = book else {
                            println!("No book number {}", position);
                            continue;
                        };
                        list.on_action(BookListAction::BookClicked(book));
                        detail = BookDetailViewModel::open(repository.clone(), navigation.clone());
                        detail_state = detail.as_ref().map(|detail| detail.state());
                        if let Some(receiver) = detail_state.as_mut() {
                            println!("{}", render_detail(&receiver.borrow_and_update()));
                        }
                    }
                    Command::ToggleFavorite => match &detail {
                        Some(detail) => detail.on_action(BookDetailAction::FavoriteToggled),
                        None => println!("Open a book first"),
                    },
                    Command::Back => {
                        if let Some(detail) = detail.take() {
                            detail.on_action(BookDetailAction::BackClicked);
                            detail_state = None;
                            println!("{}", render_list(&list_state.borrow_and_update()));
                        }
                    }
                }
            }
            changed = list_state.changed(), if detail.is_none() => {
                if changed.is_err() {
                    break;
                }
                println!("{}", render_list(&list_state.borrow_and_update()));
            }
            _ = detail_changed(&mut detail_state) => {
                if let Some(receiver) = detail_state.as_mut() {
                    println!("{}", render_detail(&receiver.borrow_and_update()));
                }
            }
        }
    }

    if let Some(detail) = detail.take() {
        detail.close();
    }
    list.close();
    tracing::info!("Bookshelf closed");
    shutdown_telemetry(&settings);
    Ok(())
}
