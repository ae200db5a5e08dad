//! The reply port used by the dispatcher.

use async_trait::async_trait;

use crate::error::Result;

#[async_trait]
pub trait Outbox: Send + Sync {
    /// Send plain text to a chat.
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()>;

    /// Send `prompt` with a one-shot button asking the user for their location.
    async fn request_location(&self, chat_id: i64, prompt: &str) -> Result<()>;
}
