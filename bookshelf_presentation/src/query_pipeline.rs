//! Debounced query handling for the search screen.
//!
//! Query edits arrive on a watch channel. A value is acted upon once it stayed
//! unchanged for the debounce window and differs from the previously settled one.
//! Searches launched for settled values are tracked by [`SearchGenerations`] so
//! that only the youngest one may write its outcome.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);
pub const DEFAULT_MIN_QUERY_LEN: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPipelineConfig {
    pub debounce: Duration,
    /// Shortest non blank query that is searched for
    pub min_query_len: usize,
}

impl Default for QueryPipelineConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            min_query_len: DEFAULT_MIN_QUERY_LEN,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettledQuery {
    /// Nothing but whitespace, the base results are restored
    Blank,
    /// Too short to search, current results stay
    TooShort,
    Search(String),
}

impl QueryPipelineConfig {
    pub fn classify(&self, query: &str) -> SettledQuery {
        if query.trim().is_empty() {
            SettledQuery::Blank
        } else if query.chars().count() < self.min_query_len {
            SettledQuery::TooShort
        } else {
            SettledQuery::Search(query.to_string())
        }
    }
}

/// Trailing-edge debounce over `queries`.
///
/// The value current when the loop starts is treated as the first edit. Every edit
/// restarts the window, `on_settled` receives a value once the window elapses without
/// a newer edit. A settled value equal to the previous settled one is skipped.
/// Returns when the sending side of `queries` is dropped.
pub async fn debounce_queries<F>(
    mut queries: watch::Receiver<String>,
    window: Duration,
    mut on_settled: F,
) where
    F: FnMut(String),
{
    let mut last_settled: Option<String> = None;
    let mut candidate = queries.borrow_and_update().clone();
    let mut deadline = Some(Instant::now() + window);

    loop {
        let changed = match deadline {
            Some(at) => {
                tokio::select! {
                    changed = queries.changed() => changed,
                    _ = tokio::time::sleep_until(at) => {
                        deadline = None;
                        if last_settled.as_ref() != Some(&candidate) {
                            last_settled = Some(candidate.clone());
                            on_settled(candidate.clone());
                        }
                        continue;
                    }
                }
            }
            None => queries.changed().await,
        };
        if changed.is_err() {
            return;
        }

        let next = queries.borrow_and_update().clone();
        if next != candidate {
            candidate = next;
            deadline = Some(Instant::now() + window);
        }
    }
}

/// One attempt of the search, identified by a monotonically increasing id
#[derive(Debug, Clone)]
pub struct SearchGeneration {
    pub id: u64,
    token: CancellationToken,
}

impl SearchGeneration {
    /// False once a younger generation started or the owning screen closed
    pub fn is_current(&self) -> bool {
        !self.token.is_cancelled()
    }

    pub async fn superseded(&self) {
        self.token.cancelled().await
    }
}

/// Keeps track of the single outstanding search
#[derive(Default)]
pub struct SearchGenerations {
    current: parking_lot::Mutex<Option<SearchGeneration>>,
    counter: AtomicU64,
}

impl SearchGenerations {
    /// Starts a new generation and cancels the previous one.
    /// The generation is also cancelled together with `parent`.
    pub fn start(&self, parent: &CancellationToken) -> SearchGeneration {
        let mut current = self.current.lock();
        if let Some(previous) = current.take() {
            previous.token.cancel();
            tracing::debug!(generation = previous.id, "Search superseded");
        }
        let generation = SearchGeneration {
            id: self.counter.fetch_add(1, Ordering::SeqCst) + 1,
            token: parent.child_token(),
        };
        *current = Some(generation.clone());
        generation
    }

    /// Cancels the outstanding search, if any
    pub fn cancel_current(&self) {
        if let Some(previous) = self.current.lock().take() {
            previous.token.cancel();
            tracing::debug!(generation = previous.id, "Search cancelled");
        }
    }
}
