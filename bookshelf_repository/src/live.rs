use futures_util::stream::{self, BoxStream, StreamExt};
use tokio::sync::watch;

/// Turns a watch receiver into a stream of snapshots.
/// The value current at subscription time is yielded first, then every later one.
/// The stream ends once the sending side is gone.
pub fn snapshots<T>(receiver: watch::Receiver<T>) -> BoxStream<'static, T>
where
    T: Clone + Send + Sync + 'static,
{
    stream::unfold((receiver, true), |(mut receiver, first)| async move {
        if !first && receiver.changed().await.is_err() {
            return None;
        }
        let value = receiver.borrow_and_update().clone();
        Some((value, (receiver, false)))
    })
    .boxed()
}
