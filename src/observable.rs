// ABOUTME: Single-writer, multi-reader observable cell built on a tokio watch channel
// ABOUTME: Services publish state changes here and UI surfaces subscribe to them
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// Observable piece of shared state.
///
/// Only code inside this crate can publish. Everyone else gets read access
/// through `get` and `subscribe`, so the owning service stays the single
/// writer.
#[derive(Debug)]
pub struct ObservableCell<T> {
    tx: watch::Sender<T>,
}

impl<T: Clone> ObservableCell<T> {
    /// Create a cell holding `initial`
    #[must_use]
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Clone of the current value
    #[must_use]
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Receiver that sees the current value and every later publish
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    /// Current value followed by every later publish, as a stream
    #[must_use]
    pub fn stream(&self) -> WatchStream<T>
    where
        T: Send + Sync + 'static,
    {
        WatchStream::new(self.tx.subscribe())
    }

    /// Number of live subscribers
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Replace the value and wake subscribers; succeeds with no subscribers
    pub(crate) fn publish(&self, value: T) {
        self.tx.send_replace(value);
    }
}

impl<T: Clone + Default> Default for ObservableCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_stream::StreamExt;

    #[tokio::test]
    async fn stream_yields_current_then_published_values() {
        let cell = ObservableCell::new(1_u32);
        let mut values = cell.stream();
        assert_eq!(values.next().await, Some(1));

        cell.publish(2);
        assert_eq!(values.next().await, Some(2));
        assert_eq!(cell.subscriber_count(), 1);
    }
}
