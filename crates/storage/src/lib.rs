//! SQLite-backed journal of draftsmith agent runs.
//!
//! Every agent run can be recorded as an ordered list of events: the
//! request that started it, the text the model produced, each tool call
//! with its result, and how the run ended. The journal answers "why did
//! the agent file that draft?" after the fact. It is write-only from the
//! agent's point of view; nothing in the loop reads it back.
//!
//! # Example
//!
//! ```no_run
//! use storage::{Event, EventKind, EventStore, Role, RunId};
//!
//! let store = EventStore::open("runs.db")?;
//! let run = RunId::new();
//! store.append(&Event::new(run, EventKind::RunStart { request: "List all interviews".into() }))?;
//! store.append(&Event::message(run, Role::Assistant, "You have two interviews."))?;
//!
//! for summary in store.list_runs()? {
//!     println!("{}: {} tool calls", summary.id, summary.tool_calls);
//! }
//! # Ok::<(), storage::Error>(())
//! ```

mod error;
mod event;
mod store;

pub use error::{Error, Result};
pub use event::{Event, EventKind, Role, RunId};
pub use store::{EventStore, RunSummary};
