//! SQLite journal implementation.

use crate::{Error, Event, EventKind, Result, RunId};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, params};
use std::path::Path;

/// One line of [`EventStore::list_runs`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub id: RunId,
    pub request: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub tool_calls: u32,
    pub limit_reached: Option<bool>,
}

/// SQLite-backed event store.
pub struct EventStore {
    conn: Connection,
}

impl EventStore {
    /// Open or create an event store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory event store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                run_id TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                kind TEXT NOT NULL,
                data TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_events_run
                ON events(run_id, seq);
            "#,
        )?;
        Ok(())
    }

    /// Append an event to the store.
    pub fn append(&self, event: &Event) -> Result<()> {
        self.conn.execute(
            "INSERT INTO events (id, run_id, timestamp, kind, data) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                event.id.to_string(),
                event.run_id.to_string(),
                event.timestamp.to_rfc3339(),
                event.kind.name(),
                serde_json::to_string(&event.kind)?,
            ],
        )?;
        Ok(())
    }

    /// Load all events for a run in append order.
    pub fn load_run(&self, run_id: RunId) -> Result<Vec<Event>> {
        self.load_events(run_id, None)
    }

    /// Load events for a run, optionally restricted to one kind name.
    pub fn load_events(&self, run_id: RunId, kind: Option<&str>) -> Result<Vec<Event>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, timestamp, data FROM events
             WHERE run_id = ?1 AND (?2 IS NULL OR kind = ?2) ORDER BY seq",
        )?;

        let rows = stmt.query_map(params![run_id.to_string(), kind], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (id, run_id, timestamp, data) = row?;
            events.push(Event {
                id: id.parse().map_err(|_| Error::Corrupt(format!("event id {id}")))?,
                run_id: run_id
                    .parse()
                    .map_err(|_| Error::Corrupt(format!("run id {run_id}")))?,
                timestamp: parse_timestamp(&timestamp)?,
                kind: serde_json::from_str(&data)?,
            });
        }
        Ok(events)
    }

    /// Summaries of every run, newest first.
    pub fn list_runs(&self) -> Result<Vec<RunSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT run_id,
                    MAX(CASE WHEN kind = 'run_start' THEN data END),
                    MIN(timestamp),
                    MAX(CASE WHEN kind = 'run_end' THEN data END),
                    MAX(CASE WHEN kind = 'run_end' THEN timestamp END),
                    SUM(CASE WHEN kind = 'tool_call' THEN 1 ELSE 0 END)
             FROM events GROUP BY run_id ORDER BY MIN(seq) DESC",
        )?;

        let rows = stmt.query_map([], summary_columns)?;
        let mut runs = Vec::new();
        for row in rows {
            let (run_id, start, started_at, end, ended_at, tool_calls) = row?;
            let request = match decode_kind(start)? {
                Some(EventKind::RunStart { request }) => Some(request),
                _ => None,
            };
            let limit_reached = match decode_kind(end)? {
                Some(EventKind::RunEnd { limit_reached, .. }) => Some(limit_reached),
                _ => None,
            };
            runs.push(RunSummary {
                id: run_id
                    .parse()
                    .map_err(|_| Error::Corrupt(format!("run id {run_id}")))?,
                request,
                started_at: parse_timestamp(&started_at)?,
                ended_at: ended_at.as_deref().map(parse_timestamp).transpose()?,
                tool_calls,
                limit_reached,
            });
        }
        Ok(runs)
    }

    /// Find a run whose id starts with `prefix`.
    ///
    /// Returns every match so callers can report ambiguity.
    pub fn find_runs(&self, prefix: &str) -> Result<Vec<RunId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT run_id FROM events WHERE run_id LIKE ?1 || '%'")?;
        let ids = stmt
            .query_map([prefix], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        ids.into_iter()
            .map(|id| {
                id.parse()
                    .map_err(|_| Error::Corrupt(format!("run id {id}")))
            })
            .collect()
    }
}

type SummaryColumns = (
    String,
    Option<String>,
    String,
    Option<String>,
    Option<String>,
    u32,
);

fn summary_columns(row: &Row<'_>) -> rusqlite::Result<SummaryColumns> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn decode_kind(data: Option<String>) -> Result<Option<EventKind>> {
    Ok(data.map(|d| serde_json::from_str(&d)).transpose()?)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    raw.parse()
        .map_err(|_| Error::Corrupt(format!("timestamp {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    fn seed_run(store: &EventStore, request: &str, finish: bool) -> RunId {
        let run = RunId::new();
        store
            .append(&Event::new(
                run,
                EventKind::RunStart {
                    request: request.into(),
                },
            ))
            .unwrap();
        store
            .append(&Event::new(
                run,
                EventKind::ToolCall {
                    call_id: "toolu_1".into(),
                    name: "list_interviews".into(),
                    input: serde_json::json!({}),
                },
            ))
            .unwrap();
        store
            .append(&Event::new(
                run,
                EventKind::ToolResult {
                    call_id: "toolu_1".into(),
                    name: "list_interviews".into(),
                    output: "[]".into(),
                    is_error: false,
                },
            ))
            .unwrap();
        store
            .append(&Event::message(run, Role::Assistant, "done"))
            .unwrap();
        if finish {
            store
                .append(&Event::new(
                    run,
                    EventKind::RunEnd {
                        iterations: 2,
                        limit_reached: false,
                    },
                ))
                .unwrap();
        }
        run
    }

    #[test]
    fn events_round_trip_in_order() {
        let store = EventStore::in_memory().unwrap();
        let run = seed_run(&store, "List all interviews", true);

        let events = store.load_run(run).unwrap();
        let kinds: Vec<_> = events.iter().map(|e| e.kind.name()).collect();
        assert_eq!(
            kinds,
            vec!["run_start", "tool_call", "tool_result", "message", "run_end"]
        );
        assert!(events.iter().all(|e| e.run_id == run));
    }

    #[test]
    fn filter_by_kind() {
        let store = EventStore::in_memory().unwrap();
        let run = seed_run(&store, "List all interviews", true);

        let calls = store.load_events(run, Some("tool_call")).unwrap();
        assert_eq!(calls.len(), 1);
        assert!(matches!(
            &calls[0].kind,
            EventKind::ToolCall { name, .. } if name == "list_interviews"
        ));
    }

    #[test]
    fn list_runs_newest_first() {
        let store = EventStore::in_memory().unwrap();
        let first = seed_run(&store, "first", true);
        let second = seed_run(&store, "second", false);

        let runs = store.list_runs().unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].id, second);
        assert_eq!(runs[0].request.as_deref(), Some("second"));
        assert!(runs[0].ended_at.is_none());
        assert_eq!(runs[0].limit_reached, None);
        assert_eq!(runs[1].id, first);
        assert_eq!(runs[1].tool_calls, 1);
        assert_eq!(runs[1].limit_reached, Some(false));
    }

    #[test]
    fn find_runs_by_prefix() {
        let store = EventStore::in_memory().unwrap();
        let run = seed_run(&store, "only", true);
        let prefix = &run.to_string()[..8];

        assert_eq!(store.find_runs(prefix).unwrap(), vec![run]);
        assert!(store.find_runs("zzzz").unwrap().is_empty());
    }
}
