use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchResponseDto {
    #[serde(rename = "docs", default)]
    pub results: Vec<SearchedBookDto>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchedBookDto {
    /// Path-like key, e.g. `/works/OL45804W`
    #[serde(rename = "key")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "language")]
    pub languages: Option<Vec<String>>,
    #[serde(rename = "cover_i")]
    pub cover_alternative_key: Option<i64>,
    #[serde(rename = "author_key")]
    pub author_keys: Option<Vec<String>>,
    #[serde(rename = "author_name")]
    pub author_names: Option<Vec<String>>,
    #[serde(rename = "cover_edition_key")]
    pub cover_key: Option<String>,
    pub first_publish_year: Option<i32>,
    #[serde(rename = "ratings_average")]
    pub average_rating: Option<f64>,
    #[serde(rename = "ratings_count")]
    pub rating_count: Option<u32>,
    #[serde(rename = "number_of_pages_median")]
    pub num_pages_median: Option<u32>,
    #[serde(rename = "edition_count")]
    pub num_editions: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BookWorkDto {
    #[serde(default, deserialize_with = "deserialize_description")]
    pub description: Option<String>,
}

/// Open Library sends descriptions either as a plain string or as `{"type": .., "value": ..}`
#[derive(Deserialize)]
#[serde(untagged)]
enum DescriptionDto {
    Plain(String),
    Typed { value: String },
}

fn deserialize_description<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<DescriptionDto>::deserialize(deserializer)?.map(|description| match description {
            DescriptionDto::Plain(value) => value,
            DescriptionDto::Typed { value } => value,
        }),
    )
}
