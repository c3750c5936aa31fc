use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Lifetime of one screen.
/// Tasks spawned through the scope stop when it is closed or dropped.
pub struct ScreenScope {
    token: CancellationToken,
    tasks: parking_lot::Mutex<Vec<JoinHandle<()>>>,
}

impl Default for ScreenScope {
    fn default() -> Self {
        Self {
            token: CancellationToken::new(),
            tasks: Default::default(),
        }
    }
}

impl ScreenScope {
    /// Token cancelled together with the scope
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.is_closed() {
            tracing::debug!("Screen already closed, task not started");
            return;
        }
        let token = self.token.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = future => {}
            }
        });
        let mut tasks = self.tasks.lock();
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
    }

    pub fn close(&self) {
        self.token.cancel();
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
    }
}

impl Drop for ScreenScope {
    fn drop(&mut self) {
        self.close();
    }
}
