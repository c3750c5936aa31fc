use anyhow::Context;
use serde_json::json;
use tokio::sync::watch;
use tokio_postgres::{Client, NoTls, Statement};

use crate::api::FavoriteBookRecord;
use crate::error::LocalError;
use crate::favorites_store::FavoriteBookStore;

pub struct PostgresFavoriteBookStoreConfig {
    pub hostname: String,
    pub username: String,
    pub password: String,
}

pub struct PostgresFavoriteBookStore {
    client: Client,
    /// Serializes writes so that published snapshots follow write order
    write_lock: tokio::sync::Mutex<()>,
    snapshot: watch::Sender<Vec<FavoriteBookRecord>>,
}

impl PostgresFavoriteBookStore {
    pub async fn init(config: PostgresFavoriteBookStoreConfig) -> anyhow::Result<Self> {
        let connection_str = format!(
            "postgresql://{}:{}@{}",
            config.username, config.password, config.hostname
        );
        tracing::info!("Postgres connection to {}", config.hostname);
        let (client, connection) = tokio_postgres::connect(&connection_str, NoTls)
            .await
            .context("Failed to start postgres")?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("Postgres connection error: {}", e);
            }
        });

        client
            .batch_execute(
                "
        CREATE TABLE IF NOT EXISTS favorite_books (
            id              TEXT PRIMARY KEY,
            params          JSONB NOT NULL
            )
        ",
            )
            .await
            .context("Failed to setup table")?;

        let initial = load_all(&client)
            .await
            .context("Failed to load favorite books")?;

        Ok(Self {
            client,
            write_lock: Default::default(),
            snapshot: watch::channel(initial).0,
        })
    }

    /// Applies a stored record to the published snapshot, which stays ordered by id
    fn publish_upsert(&self, record: FavoriteBookRecord) {
        self.snapshot.send_modify(|records| {
            match records.binary_search_by(|stored| stored.id.cmp(&record.id)) {
                Ok(index) => records[index] = record,
                Err(index) => records.insert(index, record),
            }
        });
    }

    fn publish_delete(&self, id: &str) {
        self.snapshot.send_if_modified(|records| {
            let before = records.len();
            records.retain(|record| record.id != id);
            records.len() != before
        });
    }
}

async fn load_all(client: &Client) -> Result<Vec<FavoriteBookRecord>, LocalError> {
    let stmt: Statement = client
        .prepare("SELECT params FROM favorite_books")
        .await?;

    let rows = client.query(&stmt, &[]).await?;

    let mut records = rows
        .iter()
        .map(|row| -> Result<FavoriteBookRecord, LocalError> {
            let params: serde_json::Value = row.try_get(0)?;
            Ok(serde_json::from_value(params)?)
        })
        .collect::<Result<Vec<_>, _>>()?;
    // byte order of ids, independent of the database collation
    records.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(records)
}

#[async_trait::async_trait]
impl FavoriteBookStore for PostgresFavoriteBookStore {
    async fn upsert(&self, record: FavoriteBookRecord) -> Result<(), LocalError> {
        let _write_guard = self.write_lock.lock().await;
        let stmt: Statement = self
            .client
            .prepare(
                "INSERT INTO favorite_books (id, params) VALUES ($1, $2)
                 ON CONFLICT (id) DO UPDATE SET params = EXCLUDED.params",
            )
            .await?;

        self.client
            .execute(&stmt, &[&record.id, &json!(record)])
            .await?;
        self.publish_upsert(record);
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<FavoriteBookRecord>, LocalError> {
        let stmt: Statement = self
            .client
            .prepare("SELECT params FROM favorite_books WHERE id = ($1)")
            .await?;

        let rows = self.client.query(&stmt, &[&id]).await?;

        match rows.first() {
            Some(row) => {
                let params: serde_json::Value = row.try_get(0)?;
                Ok(Some(serde_json::from_value(params)?))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &str) -> Result<(), LocalError> {
        let _write_guard = self.write_lock.lock().await;
        let stmt: Statement = self
            .client
            .prepare("DELETE FROM favorite_books WHERE id = ($1)")
            .await?;

        self.client.execute(&stmt, &[&id]).await?;
        self.publish_delete(id);
        Ok(())
    }

    fn observe_all(&self) -> watch::Receiver<Vec<FavoriteBookRecord>> {
        self.snapshot.subscribe()
    }
}
