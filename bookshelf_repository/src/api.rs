use serde::{Deserialize, Serialize};

/// Open Library work identifier, e.g. `OL45804W`
pub type BookId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A book as shown on the list and detail screens.
/// Two books are the same entry when their ids match, other fields may differ between sources.
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub image_url: String,
    pub authors: Vec<String>,
    /// Only known after the detail was fetched or when the book is a favorite
    pub description: Option<String>,
    pub languages: Vec<String>,
    pub first_publish_year: Option<String>,
    pub average_rating: Option<f64>,
    pub rating_count: Option<u32>,
    pub num_pages: Option<u32>,
    pub num_editions: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Persisted form of a favorite book.
/// Keeps every field needed to redisplay the book without network, description included.
pub struct FavoriteBookRecord {
    pub id: BookId,
    pub title: String,
    pub image_url: String,
    #[serde(default)]
    pub authors: Vec<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    pub first_publish_year: Option<String>,
    pub average_rating: Option<f64>,
    pub rating_count: Option<u32>,
    pub num_pages: Option<u32>,
    pub num_editions: u32,
}

impl From<&Book> for FavoriteBookRecord {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id.clone(),
            title: book.title.clone(),
            image_url: book.image_url.clone(),
            authors: book.authors.clone(),
            description: book.description.clone(),
            languages: book.languages.clone(),
            first_publish_year: book.first_publish_year.clone(),
            average_rating: book.average_rating,
            rating_count: book.rating_count,
            num_pages: book.num_pages,
            num_editions: book.num_editions,
        }
    }
}

impl From<FavoriteBookRecord> for Book {
    fn from(record: FavoriteBookRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            image_url: record.image_url,
            authors: record.authors,
            description: record.description,
            languages: record.languages,
            first_publish_year: record.first_publish_year,
            average_rating: record.average_rating,
            rating_count: record.rating_count,
            num_pages: record.num_pages,
            num_editions: record.num_editions,
        }
    }
}
