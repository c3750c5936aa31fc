use std::time::Duration;

use anyhow::Context;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment};
use serde::Deserialize;

use bookshelf_repository::client::OpenLibraryClientConfig;
use bookshelf_repository::favorites_store::PostgresFavoriteBookStoreConfig;

use crate::book_list::{BookListConfig, DEFAULT_SEED_QUERY};
use crate::query_pipeline::{QueryPipelineConfig, DEFAULT_DEBOUNCE, DEFAULT_MIN_QUERY_LEN};

const ENV_PREFIX: &str = "BOOKSHELF";

/// Settings of the `bookshelf` binary, every field can be overridden with a
/// `BOOKSHELF_<FIELD>` environment variable, e.g. `BOOKSHELF_USE_IN_MEMORY_DB=false`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AppSettings {
    pub openlibrary_url: String,
    pub search_result_limit: Option<u32>,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub use_in_memory_db: bool,
    pub db_host: String,
    pub db_username: String,
    pub db_password: String,
    pub seed_query: String,
    pub debounce_ms: u64,
    pub min_query_len: usize,
    pub jaeger_enabled: bool,
}

impl AppSettings {
    pub fn load() -> anyhow::Result<Self> {
        Self::from_builder(
            defaults()?.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true)),
        )
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
        builder
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")
    }

    pub fn list_config(&self) -> BookListConfig {
        BookListConfig {
            seed_query: self.seed_query.clone(),
            pipeline: QueryPipelineConfig {
                debounce: Duration::from_millis(self.debounce_ms),
                min_query_len: self.min_query_len,
            },
        }
    }

    pub fn open_library_client_config(&self) -> OpenLibraryClientConfig {
        OpenLibraryClientConfig {
            url: self.openlibrary_url.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            max_retries: self.max_retries,
        }
    }

    pub fn postgres_config(&self) -> PostgresFavoriteBookStoreConfig {
        PostgresFavoriteBookStoreConfig {
            hostname: self.db_host.clone(),
            username: self.db_username.clone(),
            password: self.db_password.clone(),
        }
    }
}

fn defaults() -> anyhow::Result<ConfigBuilder<DefaultState>> {
    let client = OpenLibraryClientConfig::default();
    Ok(Config::builder()
        .set_default("openlibrary_url", client.url)?
        .set_default("request_timeout_secs", client.request_timeout.as_secs() as i64)?
        .set_default("max_retries", client.max_retries as i64)?
        .set_default("use_in_memory_db", true)?
        .set_default("db_host", "127.0.0.1")?
        .set_default("db_username", "postgres")?
        .set_default("db_password", "postgres")?
        .set_default("seed_query", DEFAULT_SEED_QUERY)?
        .set_default("debounce_ms", DEFAULT_DEBOUNCE.as_millis() as i64)?
        .set_default("min_query_len", DEFAULT_MIN_QUERY_LEN as i64)?
        .set_default("jaeger_enabled", false)?)
}

#[cfg(test)]
mod app_config_tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_defaults() {
        let settings = AppSettings::from_builder(defaults().unwrap()).unwrap();

        assert_eq!(settings.openlibrary_url, "https://openlibrary.org");
        assert_eq!(settings.search_result_limit, None);
        assert!(settings.use_in_memory_db);
        assert!(!settings.jaeger_enabled);
        assert_eq!(settings.list_config(), BookListConfig::default());
        assert_eq!(
            settings.open_library_client_config().request_timeout,
            Duration::from_secs(20)
        );
    }

    #[test]
    fn test_environment_overrides_defaults() {
        let env = HashMap::from([
            ("BOOKSHELF_SEARCH_RESULT_LIMIT".to_string(), "25".to_string()),
            ("BOOKSHELF_USE_IN_MEMORY_DB".to_string(), "false".to_string()),
            ("BOOKSHELF_DB_HOST".to_string(), "db.local".to_string()),
            ("BOOKSHELF_DEBOUNCE_MS".to_string(), "250".to_string()),
            ("OTHER_DB_HOST".to_string(), "ignored".to_string()),
        ]);
        let builder = defaults().unwrap().add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .source(Some(env)),
        );

        let settings = AppSettings::from_builder(builder).unwrap();

        assert_eq!(settings.search_result_limit, Some(25));
        assert!(!settings.use_in_memory_db);
        assert_eq!(settings.postgres_config().hostname, "db.local");
        assert_eq!(
            settings.list_config().pipeline.debounce,
            Duration::from_millis(250)
        );
    }

    #[test]
    fn test_invalid_value_is_rejected() {
        let builder = defaults()
            .unwrap()
            .set_override("max_retries", "many")
            .unwrap();

        assert!(AppSettings::from_builder(builder).is_err());
    }
}
