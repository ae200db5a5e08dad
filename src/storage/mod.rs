//! Append-only journal of chat messages, bot responses and location shares.

pub mod journal;
pub mod sqlite;

pub use journal::{best_effort, Journal};
pub use sqlite::{JournalCounts, SqliteJournal};
