//! Event Bus - pub/sub for loop events
//!
//! Uses a tokio broadcast channel: components emit, consumers subscribe.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::types::LoopEvent;
use crate::backend::SessionId;
use crate::r#loop::LoopRegistry;

/// Default channel capacity (events)
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1_024;

/// Central event bus for loop activity
pub struct EventBus {
    tx: broadcast::Sender<LoopEvent>,
}

impl EventBus {
    /// Create a new event bus with the given capacity
    pub fn new(capacity: usize) -> Self {
        debug!(capacity, "EventBus::new: creating event bus");
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Create a new event bus with default capacity
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Emit an event to all subscribers
    ///
    /// Fire-and-forget: with no subscribers the event is dropped.
    pub fn emit(&self, event: LoopEvent) {
        debug!(event_type = event.event_type(), loop_id = ?event.loop_id(), "EventBus::emit");
        let _ = self.tx.send(event);
    }

    /// Subscribe to events emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<LoopEvent> {
        debug!("EventBus::subscribe: new subscriber");
        self.tx.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Keep the registry's hint list in sync with `TodoUpdated` events
///
/// With a `session_filter`, updates for other sessions are ignored. The task
/// ends when the bus is dropped.
pub fn spawn_hint_listener(
    bus: &EventBus,
    registry: LoopRegistry,
    session_filter: Option<SessionId>,
) -> JoinHandle<()> {
    debug!(?session_filter, "spawn_hint_listener: called");
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(LoopEvent::TodoUpdated { session_id, todos }) => {
                    if let Some(filter) = &session_filter
                        && *filter != session_id
                    {
                        debug!(%session_id, "spawn_hint_listener: ignoring other session");
                        continue;
                    }
                    debug!(%session_id, count = todos.len(), "spawn_hint_listener: replacing hints");
                    registry.set_hints(todos).await;
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(n, "spawn_hint_listener: lagged behind, some todo updates were missed");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("Event bus closed, hint listener exiting");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HintEntry, HintStatus};
    use std::time::Duration;

    #[tokio::test]
    async fn test_emit_without_subscribers_is_ok() {
        let bus = EventBus::new(8);
        bus.emit(LoopEvent::LoopFinished {
            loop_id: "l".to_string(),
            completed: 0,
            failed: 0,
        });
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_events() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        bus.emit(LoopEvent::LoopStarted {
            loop_id: "l".to_string(),
            prompt: "p".to_string(),
            task_count: 2,
        });
        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type(), "loop_started");
    }

    async fn wait_for_hints(registry: &LoopRegistry, expected: usize) -> Vec<HintEntry> {
        for _ in 0..50 {
            let hints = registry.hints().await;
            if hints.len() == expected {
                return hints;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        registry.hints().await
    }

    #[tokio::test]
    async fn test_hint_listener_replaces_hints() {
        let bus = EventBus::new(8);
        let registry = LoopRegistry::new();
        let handle = spawn_hint_listener(&bus, registry.clone(), None);

        bus.emit(LoopEvent::TodoUpdated {
            session_id: SessionId::new("ses_1"),
            todos: vec![
                HintEntry::new("1", "a", HintStatus::Pending),
                HintEntry::new("2", "b", HintStatus::Completed),
            ],
        });
        assert_eq!(wait_for_hints(&registry, 2).await.len(), 2);

        bus.emit(LoopEvent::TodoUpdated {
            session_id: SessionId::new("ses_1"),
            todos: vec![HintEntry::new("3", "c", HintStatus::Pending)],
        });
        let hints = wait_for_hints(&registry, 1).await;
        assert_eq!(hints.len(), 1);
        assert_eq!(hints[0].id, "3");

        handle.abort();
    }

    #[tokio::test]
    async fn test_hint_listener_session_filter() {
        let bus = EventBus::new(8);
        let registry = LoopRegistry::new();
        let handle = spawn_hint_listener(&bus, registry.clone(), Some(SessionId::new("mine")));

        bus.emit(LoopEvent::TodoUpdated {
            session_id: SessionId::new("other"),
            todos: vec![HintEntry::new("x", "ignored", HintStatus::Pending)],
        });
        bus.emit(LoopEvent::TodoUpdated {
            session_id: SessionId::new("mine"),
            todos: vec![
                HintEntry::new("1", "kept", HintStatus::Pending),
                HintEntry::new("2", "kept too", HintStatus::Pending),
            ],
        });

        let hints = wait_for_hints(&registry, 2).await;
        assert_eq!(hints.len(), 2);
        assert_eq!(hints[0].content, "kept");

        handle.abort();
    }
}
