use crate::api::Book;
use crate::remote_data_source::SearchedBookDto;

const COVERS_URL: &str = "https://covers.openlibrary.org/b";

impl From<SearchedBookDto> for Book {
    fn from(dto: SearchedBookDto) -> Self {
        let image_url = match (&dto.cover_key, dto.cover_alternative_key) {
            (Some(cover_key), _) => format!("{COVERS_URL}/olid/{cover_key}-L.jpg"),
            (None, Some(cover_id)) => format!("{COVERS_URL}/id/{cover_id}-L.jpg"),
            (None, None) => String::new(),
        };
        Self {
            id: dto
                .id
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string(),
            title: dto.title,
            image_url,
            authors: dto.author_names.unwrap_or_default(),
            description: None,
            languages: dto.languages.unwrap_or_default(),
            first_publish_year: dto.first_publish_year.map(|year| year.to_string()),
            average_rating: dto.average_rating,
            rating_count: dto.rating_count,
            num_pages: dto.num_pages_median,
            num_editions: dto.num_editions.unwrap_or_default(),
        }
    }
}
