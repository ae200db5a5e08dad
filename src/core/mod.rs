//! Core event routing: inbound events, the reply port and the dispatcher.

pub mod dispatcher;
pub mod event;
pub mod outbox;

pub use dispatcher::Dispatcher;
pub use event::{BotCommand, EventKind, InboundEvent};
pub use outbox::Outbox;
