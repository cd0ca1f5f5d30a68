use super::EventLog;
use crate::models::{Event, EventType};
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::collections::VecDeque;

/// Capacity-bounded ring buffer, the default durable log. Mirrors the
/// host project's `SignalStorage` (`signals::storage`): a `VecDeque`
/// behind a lock, oldest entries dropped once full.
pub struct InMemoryEventLog {
    events: Mutex<VecDeque<Event>>,
    capacity: usize,
}

impl InMemoryEventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }
}

impl EventLog for InMemoryEventLog {
    fn append(&self, event: Event) {
        let mut events = self.events.lock();
        if events.len() >= self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    fn recent(&self, limit: usize) -> Vec<Event> {
        let events = self.events.lock();
        events.iter().rev().take(limit).cloned().collect()
    }
}

/// Optional relational backend for the `events` table (§6), selected when
/// `DATABASE_URL` names a sqlite file. WAL mode and connection handling
/// follow the host project's `signals::db_storage` schema pragmas.
pub struct SqliteEventLog {
    conn: Mutex<Connection>,
}

impl SqliteEventLog {
    pub fn open(path: &str) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            CREATE TABLE IF NOT EXISTS events (
                id TEXT PRIMARY KEY,
                event_type TEXT NOT NULL,
                source TEXT NOT NULL,
                payload TEXT NOT NULL,
                ts TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_events_ts ON events(ts);
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn event_type_from_str(s: &str) -> Option<EventType> {
        // Round-trips every variant's Serialize/Display string back into the enum.
        serde_json::from_value(serde_json::Value::String(s.to_string())).ok()
    }
}

impl EventLog for SqliteEventLog {
    fn append(&self, event: Event) {
        let conn = self.conn.lock();
        let payload = event.payload.to_string();
        let ts = crate::time::to_iso8601(event.timestamp);
        if let Err(e) = conn.execute(
            "INSERT OR REPLACE INTO events (id, event_type, source, payload, ts) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![event.id, event.event_type.as_str(), event.source, payload, ts],
        ) {
            tracing::warn!(error = %e, "failed to persist event to sqlite log");
        }
    }

    fn recent(&self, limit: usize) -> Vec<Event> {
        let conn = self.conn.lock();
        let mut stmt = match conn
            .prepare("SELECT id, event_type, source, payload, ts FROM events ORDER BY ts DESC LIMIT ?1")
        {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "failed to prepare recent() query");
                return Vec::new();
            }
        };
        let rows = stmt.query_map(params![limit as i64], |row| {
            let id: String = row.get(0)?;
            let type_str: String = row.get(1)?;
            let source: String = row.get(2)?;
            let payload_str: String = row.get(3)?;
            let ts_str: String = row.get(4)?;
            Ok((id, type_str, source, payload_str, ts_str))
        });

        let mut out = Vec::new();
        let rows = match rows {
            Ok(r) => r,
            Err(_) => return out,
        };
        for row in rows.flatten() {
            let (id, type_str, source, payload_str, ts_str) = row;
            let Some(event_type) = Self::event_type_from_str(&type_str) else {
                continue;
            };
            let payload = serde_json::from_str(&payload_str).unwrap_or(serde_json::Value::Null);
            let timestamp = chrono::DateTime::parse_from_rfc3339(&ts_str)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .unwrap_or_else(|_| crate::time::now());
            out.push(Event {
                id,
                event_type,
                source,
                payload,
                timestamp,
            });
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventType;

    #[test]
    fn in_memory_log_evicts_oldest_past_capacity() {
        let log = InMemoryEventLog::new(2);
        for i in 0..3 {
            log.append(Event {
                id: format!("id-{i}"),
                event_type: EventType::IndexUpdate,
                source: "test".into(),
                payload: serde_json::json!({}),
                timestamp: crate::time::now(),
            });
        }
        let recent = log.recent(10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, "id-2");
        assert_eq!(recent[1].id, "id-1");
    }

    #[test]
    fn sqlite_log_round_trips() {
        let log = SqliteEventLog::open(":memory:").unwrap();
        log.append(Event {
            id: "abc".into(),
            event_type: EventType::OrderFilled,
            source: "router".into(),
            payload: serde_json::json!({"venue": "pyth"}),
            timestamp: crate::time::now(),
        });
        let recent = log.recent(10);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, "abc");
        assert_eq!(recent[0].event_type, EventType::OrderFilled);
        assert_eq!(recent[0].payload["venue"], "pyth");
    }
}
