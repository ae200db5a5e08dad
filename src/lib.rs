//! relaybot library root.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod script;
pub mod storage;
pub mod telegram;

pub use config::{load_settings, Settings};
pub use self::core::{Dispatcher, EventKind, InboundEvent};
pub use error::{Error, Result};
pub use script::{ScriptError, ScriptRunner};
pub use storage::{Journal, SqliteJournal};
pub use telegram::run_telegram_bot;
