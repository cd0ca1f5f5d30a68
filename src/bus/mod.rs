//! The event-typed bus: assigns ids and timestamps, appends to a durable
//! log, and fans out to live subscribers. Grounded in the host project's
//! `tokio::sync::broadcast` fan-out channel in `main.rs` plus its
//! `SignalStorage` ring buffer for the durable side.

mod log;

pub use log::{InMemoryEventLog, SqliteEventLog};

use crate::models::{Event, EventType};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Durable append-only record of every event ever emitted. At-least-once:
/// `append` must not lose events even if no subscriber is listening.
pub trait EventLog: Send + Sync {
    fn append(&self, event: Event);
    fn recent(&self, limit: usize) -> Vec<Event>;
}

/// Capacity of the best-effort live fan-out channel. A subscriber that
/// falls more than this many events behind gets `RecvError::Lagged` and
/// must resynchronize via `EventBus::recent` rather than block the bus.
const BROADCAST_CAPACITY: usize = 4096;

pub struct EventBus {
    log: Box<dyn EventLog>,
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new(log: Box<dyn EventLog>) -> Self {
        let (sender, _rx) = broadcast::channel(BROADCAST_CAPACITY);
        Self { log, sender }
    }

    pub fn in_memory(capacity: usize) -> Self {
        Self::new(Box::new(InMemoryEventLog::new(capacity)))
    }

    /// Assign an id and timestamp, append to the durable log, and
    /// best-effort fan out to subscribers. Returns the assigned id.
    pub fn emit(&self, event_type: EventType, source: &str, payload: serde_json::Value) -> String {
        let event = Event {
            id: Uuid::new_v4().to_string(),
            event_type,
            source: source.to_string(),
            payload,
            timestamp: crate::time::now(),
        };
        let id = event.id.clone();
        self.log.append(event.clone());
        // A lagging or absent subscriber is not an error: fan-out is
        // best-effort, the durable log is the recovery path.
        let _ = self.sender.send(event);
        id
    }

    pub fn emit_typed<T: Serialize>(
        &self,
        event_type: EventType,
        source: &str,
        payload: &T,
    ) -> String {
        let value = serde_json::to_value(payload).unwrap_or(serde_json::Value::Null);
        self.emit(event_type, source, value)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    pub fn recent(&self, limit: usize) -> Vec<Event> {
        self.log.recent(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventType;

    #[test]
    fn emit_then_recent_round_trips_modulo_timestamp() {
        let bus = EventBus::in_memory(100);
        let id = bus.emit(
            EventType::ShockSpike,
            "gdelt",
            serde_json::json!({"score": 3.2}),
        );
        let recent = bus.recent(10);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, id);
        assert_eq!(recent[0].event_type, EventType::ShockSpike);
        assert_eq!(recent[0].source, "gdelt");
        assert_eq!(recent[0].payload["score"], 3.2);
    }

    #[test]
    fn recent_respects_limit_and_most_recent_first_or_last_is_consistent() {
        let bus = EventBus::in_memory(100);
        for i in 0..5 {
            bus.emit(EventType::IndexUpdate, "wits", serde_json::json!({"i": i}));
        }
        let recent = bus.recent(2);
        assert_eq!(recent.len(), 2);
    }

    #[tokio::test]
    async fn subscribers_receive_emitted_events() {
        let bus = EventBus::in_memory(100);
        let mut rx = bus.subscribe();
        bus.emit(EventType::RiskThrottleOn, "risk", serde_json::json!({}));
        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type, EventType::RiskThrottleOn);
    }
}
