// ABOUTME: Push notification events and sinks for session transitions and proactive advice
// ABOUTME: Broadcast, tracing, and fan-out sinks behind a synchronous non-blocking trait
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{AdvicePriority, AdviceType, FastingType, TriggerKind};

/// Default capacity of the broadcast sink
pub const NOTIFICATION_CHANNEL_CAPACITY: usize = 128;

/// Event pushed to the user's device
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NotificationEvent {
    /// A fast began
    SessionStarted {
        /// Owner
        user_id: Uuid,
        /// Session id
        session_id: Uuid,
        /// Fasting protocol
        fasting_type: FastingType,
        /// When the session is expected to reach its target
        target_end: DateTime<Utc>,
    },
    /// A fast was paused
    SessionPaused {
        /// Owner
        user_id: Uuid,
        /// Session id
        session_id: Uuid,
    },
    /// A paused fast was resumed
    SessionResumed {
        /// Owner
        user_id: Uuid,
        /// Session id
        session_id: Uuid,
    },
    /// A fast ended successfully
    SessionCompleted {
        /// Owner
        user_id: Uuid,
        /// Session id
        session_id: Uuid,
        /// Fasted hours, pauses excluded
        elapsed_hours: f64,
    },
    /// A fast was stopped early
    SessionAbandoned {
        /// Owner
        user_id: Uuid,
        /// Session id
        session_id: Uuid,
        /// Fasted hours, pauses excluded
        elapsed_hours: f64,
    },
    /// Proactive advice is waiting
    AdviceReady {
        /// Owner
        user_id: Uuid,
        /// Advice id
        advice_id: Uuid,
        /// Advice type
        advice_type: AdviceType,
        /// Advice priority
        priority: AdvicePriority,
        /// Rule that produced it
        trigger: Option<TriggerKind>,
        /// Headline shown in the notification
        title: String,
    },
}

impl NotificationEvent {
    /// The user this event is addressed to
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        match self {
            Self::SessionStarted { user_id, .. }
            | Self::SessionPaused { user_id, .. }
            | Self::SessionResumed { user_id, .. }
            | Self::SessionCompleted { user_id, .. }
            | Self::SessionAbandoned { user_id, .. }
            | Self::AdviceReady { user_id, .. } => *user_id,
        }
    }

    /// Short event name for logs
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SessionStarted { .. } => "session_started",
            Self::SessionPaused { .. } => "session_paused",
            Self::SessionResumed { .. } => "session_resumed",
            Self::SessionCompleted { .. } => "session_completed",
            Self::SessionAbandoned { .. } => "session_abandoned",
            Self::AdviceReady { .. } => "advice_ready",
        }
    }
}

/// Destination for notification events.
///
/// `push` must not block; callers invoke it while holding per-user locks.
pub trait NotificationSink: Send + Sync {
    /// Deliver or enqueue an event
    fn push(&self, event: NotificationEvent);
}

/// Sink backed by a tokio broadcast channel
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<NotificationEvent>,
}

impl BroadcastSink {
    /// Create a sink with the given buffer capacity
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Receive every event pushed after this call
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.tx.subscribe()
    }

    /// Events pushed after this call as a stream. A subscriber that falls
    /// behind skips the overwritten events and keeps going.
    pub fn stream(&self) -> impl Stream<Item = NotificationEvent> + Send + 'static {
        BroadcastStream::new(self.tx.subscribe()).filter_map(|item| match item {
            Ok(event) => Some(event),
            Err(lagged) => {
                warn!(error = %lagged, "notification stream lagged");
                None
            }
        })
    }
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::new(NOTIFICATION_CHANNEL_CAPACITY)
    }
}

impl NotificationSink for BroadcastSink {
    fn push(&self, event: NotificationEvent) {
        // Dropped when no receiver is attached
        let _ = self.tx.send(event);
    }
}

/// Sink that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn push(&self, event: NotificationEvent) {
        info!(
            user.id = %event.user_id(),
            notification = event.name(),
            "notification pushed"
        );
    }
}

/// Sink that forwards each event to several sinks in order
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl FanoutSink {
    /// Create an empty fan-out
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a downstream sink
    #[must_use]
    pub fn with(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl NotificationSink for FanoutSink {
    fn push(&self, event: NotificationEvent) {
        if let Some((last, rest)) = self.sinks.split_last() {
            for sink in rest {
                sink.push(event.clone());
            }
            last.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fanout_reaches_every_sink() {
        let a = BroadcastSink::default();
        let b = BroadcastSink::default();
        let mut rx_a = a.subscribe();
        let mut rx_b = b.subscribe();
        let fanout = FanoutSink::new()
            .with(Arc::new(a))
            .with(Arc::new(b))
            .with(Arc::new(TracingSink));

        let user_id = Uuid::new_v4();
        fanout.push(NotificationEvent::SessionPaused {
            user_id,
            session_id: Uuid::new_v4(),
        });

        assert_eq!(rx_a.try_recv().unwrap().user_id(), user_id);
        assert_eq!(rx_b.try_recv().unwrap().name(), "session_paused");
    }

    #[tokio::test]
    async fn stream_skips_lagged_events() {
        let sink = BroadcastSink::new(2);
        let stream = sink.stream();
        tokio::pin!(stream);
        let user_id = Uuid::new_v4();
        for _ in 0..3 {
            sink.push(NotificationEvent::SessionPaused {
                user_id,
                session_id: Uuid::new_v4(),
            });
        }
        sink.push(NotificationEvent::SessionResumed {
            user_id,
            session_id: Uuid::new_v4(),
        });

        let names: Vec<&str> = [stream.next().await, stream.next().await]
            .into_iter()
            .map(|e| e.unwrap().name())
            .collect();
        assert_eq!(names, vec!["session_paused", "session_resumed"]);
    }

    #[test]
    fn broadcast_without_receivers_does_not_fail() {
        let sink = BroadcastSink::new(4);
        sink.push(NotificationEvent::SessionResumed {
            user_id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
        });
    }
}
