pub use dto::{BookWorkDto, SearchResponseDto, SearchedBookDto};

use crate::error::RemoteError;

mod dto;
mod mappers;

/// Remote catalogue the books are searched in
#[async_trait::async_trait]
pub trait RemoteBookDataSource: Send + Sync {
    /// Searches the catalogue, `result_limit` caps the number of returned documents
    async fn search_books(
        &self,
        query: &str,
        result_limit: Option<u32>,
    ) -> Result<SearchResponseDto, RemoteError>;

    /// Fetches the work behind `work_id`, this is the only place descriptions come from
    async fn get_book_details(&self, work_id: &str) -> Result<BookWorkDto, RemoteError>;
}
