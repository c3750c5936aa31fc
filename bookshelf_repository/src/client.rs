use std::time::Duration;

use anyhow::Context;
use reqwest::StatusCode;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_retry::policies::ExponentialBackoff;
use reqwest_retry::RetryTransientMiddleware;
use reqwest_tracing::TracingMiddleware;
use serde::de::DeserializeOwned;

use crate::error::RemoteError;
use crate::remote_data_source::{BookWorkDto, RemoteBookDataSource, SearchResponseDto};

/// Fields requested from the search endpoint, everything a `Book` is built from
const SEARCH_FIELDS: &str = "key,title,author_name,author_key,cover_edition_key,cover_i,ratings_average,ratings_count,first_publish_year,language,number_of_pages_median,edition_count";
const SEARCH_LANGUAGE: &str = "eng";

pub struct OpenLibraryClientConfig {
    pub url: String,
    pub request_timeout: Duration,
    pub max_retries: u32,
}

impl Default for OpenLibraryClientConfig {
    fn default() -> Self {
        Self {
            url: "https://openlibrary.org".to_string(),
            request_timeout: Duration::from_secs(20),
            max_retries: 2,
        }
    }
}

pub struct OpenLibraryClient {
    url: String,
    client: ClientWithMiddleware,
}

impl OpenLibraryClient {
    pub fn new(config: OpenLibraryClientConfig) -> anyhow::Result<Self> {
        let reqwest_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("Failed to build reqwest client")?;
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(reqwest_client)
            // Insert the tracing middleware
            .with(TracingMiddleware::default())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            url: config.url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RemoteError> {
        let response = request.send().await.map_err(|err| match err {
            reqwest_middleware::Error::Reqwest(err) => remote_error_from_reqwest(&err),
            reqwest_middleware::Error::Middleware(err) => {
                tracing::warn!("Request middleware failed {:#}", err);
                RemoteError::Unknown
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Open Library responded with {}", status);
            return Err(remote_error_from_status(status));
        }

        response.json().await.map_err(|err| {
            tracing::warn!("Failed to read Open Library response {}", err);
            remote_error_from_reqwest(&err)
        })
    }
}

#[async_trait::async_trait]
impl RemoteBookDataSource for OpenLibraryClient {
    /// Calls GET /search.json
    #[tracing::instrument(skip(self))]
    async fn search_books(
        &self,
        query: &str,
        result_limit: Option<u32>,
    ) -> Result<SearchResponseDto, RemoteError> {
        let mut request = self
            .client
            .get(format!("{}/search.json", self.url))
            .query(&[
                ("q", query),
                ("language", SEARCH_LANGUAGE),
                ("fields", SEARCH_FIELDS),
            ]);
        if let Some(limit) = result_limit {
            request = request.query(&[("limit", limit)]);
        }
        self.fetch(request).await
    }

    /// Calls GET /works/{work_id}.json
    #[tracing::instrument(skip(self))]
    async fn get_book_details(&self, work_id: &str) -> Result<BookWorkDto, RemoteError> {
        let request = self
            .client
            .get(format!("{}/works/{}.json", self.url, work_id));
        self.fetch(request).await
    }
}

fn remote_error_from_status(status: StatusCode) -> RemoteError {
    match status.as_u16() {
        408 => RemoteError::RequestTimeout,
        429 => RemoteError::TooManyRequests,
        500..=599 => RemoteError::ServerError,
        _ => RemoteError::Unknown,
    }
}

fn remote_error_from_reqwest(err: &reqwest::Error) -> RemoteError {
    if err.is_timeout() {
        RemoteError::RequestTimeout
    } else if err.is_connect() {
        RemoteError::NoInternet
    } else if err.is_decode() {
        RemoteError::Serialization
    } else if let Some(status) = err.status() {
        remote_error_from_status(status)
    } else {
        RemoteError::Unknown
    }
}
