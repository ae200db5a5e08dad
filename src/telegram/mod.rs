//! Telegram bot integration.

pub mod client;
pub mod outbox;

pub use client::{event_from_message, run_telegram_bot};
pub use outbox::TelegramOutbox;
