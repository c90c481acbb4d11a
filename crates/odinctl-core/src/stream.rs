// ── Reactive display streams ──
//
// Subscription types for consuming display changes from the store.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// A subscription to one displayed resource.
///
/// `None` means nothing has been received yet.
pub struct DisplayStream<T: Send + Sync + 'static> {
    current: Option<Arc<T>>,
    receiver: watch::Receiver<Option<Arc<T>>>,
}

impl<T: Send + Sync + 'static> DisplayStream<T> {
    pub(crate) fn new(receiver: watch::Receiver<Option<Arc<T>>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// Value captured at creation or at the last `changed()`.
    pub fn current(&self) -> Option<&Arc<T>> {
        self.current.as_ref()
    }

    /// Latest value, which may be newer than `current()`.
    pub fn latest(&self) -> Option<Arc<T>> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change. Returns `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<Option<Arc<T>>> {
        self.receiver.changed().await.ok()?;
        let value = self.receiver.borrow_and_update().clone();
        self.current.clone_from(&value);
        Some(value)
    }

    pub fn into_stream(self) -> DisplayWatchStream<T> {
        DisplayWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter yielding every value the resource takes.
pub struct DisplayWatchStream<T: Send + Sync + 'static> {
    inner: WatchStream<Option<Arc<T>>>,
}

impl<T: Send + Sync + 'static> Stream for DisplayWatchStream<T> {
    type Item = Option<Arc<T>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
