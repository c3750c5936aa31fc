//! Line oriented commands and plain text rendering of the `bookshelf` binary.

use std::fmt::Write;

use bookshelf_repository::api::Book;

use crate::book_detail::BookDetailState;
use crate::book_list::{BookListState, BookListTab};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Any line not starting with `:` replaces the search query
    Query(String),
    Tab(BookListTab),
    /// 1 based position in the visible list
    Open(usize),
    ToggleFavorite,
    Back,
    Quit,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command `{0}`, try :tab, :open, :fav, :back or :quit")]
    Unknown(String),
    #[error("Unknown tab `{0}`, expected `search` or `favorites`")]
    InvalidTab(String),
    #[error("`{0}` is not a book number")]
    InvalidPosition(String),
}

pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let Some(command) = line.trim_end().strip_prefix(':') else {
        return Ok(Command::Query(line.to_string()));
    };
    let (name, argument) = match command.split_once(char::is_whitespace) {
        Some((name, argument)) => (name, argument.trim()),
        None => (command, ""),
    };
    match name {
        "tab" => match argument {
            "search" => Ok(Command::Tab(BookListTab::Search)),
            "favorites" => Ok(Command::Tab(BookListTab::Favorites)),
            other => Err(CommandError::InvalidTab(other.to_string())),
        },
        "open" => match argument.parse::<usize>() {
            Ok(position) if position > 0 => Ok(Command::Open(position)),
            _ => Err(CommandError::InvalidPosition(argument.to_string())),
        },
        "fav" => Ok(Command::ToggleFavorite),
        "back" => Ok(Command::Back),
        "quit" | "q" => Ok(Command::Quit),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

pub fn render_list(state: &BookListState) -> String {
    let mut out = String::new();
    let tab = match state.selected_tab {
        BookListTab::Search => "search",
        BookListTab::Favorites => "favorites",
    };
    let _ = writeln!(out, "== [{}] query: \"{}\"", tab, state.search_query);
    if state.is_loading {
        let _ = writeln!(out, "   loading...");
    }
    if let Some(error) = &state.error {
        let _ = writeln!(out, "   ! {}", error);
    }
    let books = state.visible_books();
    if books.is_empty() && !state.is_loading {
        let _ = writeln!(out, "   (no books)");
    }
    for (position, book) in books.iter().enumerate() {
        let _ = writeln!(out, "{:>3}. {}", position + 1, book_line(book));
    }
    out
}

pub fn render_detail(state: &BookDetailState) -> String {
    let mut out = String::new();
    let Some(book) = &state.book else {
        let _ = writeln!(out, "== (book not available)");
        return out;
    };
    let marker = if state.is_favorite { "*" } else { " " };
    let _ = writeln!(out, "=={} {}", marker, book_line(book));
    if !book.languages.is_empty() {
        let _ = writeln!(out, "   languages: {}", book.languages.join(", "));
    }
    if let Some(rating) = book.average_rating {
        let _ = writeln!(
            out,
            "   rating: {:.1} ({} votes)",
            rating,
            book.rating_count.unwrap_or_default()
        );
    }
    if let Some(pages) = book.num_pages {
        let _ = writeln!(out, "   pages: {}", pages);
    }
    let _ = writeln!(out, "   editions: {}", book.num_editions);
    match (&book.description, state.is_loading) {
        (_, true) => {
            let _ = writeln!(out, "   loading description...");
        }
        (Some(description), false) => {
            let _ = writeln!(out, "\n{}", description);
        }
        (None, false) => {
            let _ = writeln!(out, "   (no description)");
        }
    }
    for error in [&state.description_error, &state.favorite_error]
        .into_iter()
        .flatten()
    {
        let _ = writeln!(out, "   ! {}", error);
    }
    out
}

fn book_line(book: &Book) -> String {
    let mut line = book.title.clone();
    if !book.authors.is_empty() {
        line.push_str(" by ");
        line.push_str(&book.authors.join(", "));
    }
    if let Some(year) = &book.first_publish_year {
        line.push_str(&format!(" ({})", year));
    }
    line
}
