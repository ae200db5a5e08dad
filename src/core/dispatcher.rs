//! Routes inbound events to their handlers.
//!
//! Every handler follows the same order: record the inbound event, send the
//! reply, record the reply. Failures are turned into a user-visible reply
//! inside the handler; whatever is left (usually a reply that could not be
//! delivered) is logged by [`Dispatcher::dispatch`] and never propagated.

use std::sync::Arc;

use super::event::{now_timestamp, BotCommand, EventKind, InboundEvent};
use super::outbox::Outbox;
use crate::error::{Error, Result};
use crate::script::ScriptRunner;
use crate::storage::{best_effort, Journal};

pub const GREETING: &str = "Bot started! Send a message.";
pub const LOCATION_PROMPT: &str = "Please share your location:";
pub const APOLOGY: &str = "Sorry, an error occurred.";
pub const INVALID_SCRIPT: &str = "Invalid or unauthorized script.";

pub struct Dispatcher {
    journal: Arc<dyn Journal>,
    outbox: Arc<dyn Outbox>,
    scripts: ScriptRunner,
}

impl Dispatcher {
    pub fn new(journal: Arc<dyn Journal>, outbox: Arc<dyn Outbox>, scripts: ScriptRunner) -> Self {
        Self {
            journal,
            outbox,
            scripts,
        }
    }

    /// Handle one event. Never fails; leftover errors are logged.
    pub async fn dispatch(&self, event: InboundEvent) {
        let result = match &event.kind {
            EventKind::Text(text) => self.handle_text(&event, text).await,
            EventKind::Location {
                latitude,
                longitude,
            } => self.handle_location(&event, *latitude, *longitude).await,
            EventKind::Command(BotCommand::Start) => self.handle_start(&event).await,
            EventKind::Command(BotCommand::RunScript(name)) => {
                self.handle_run_script(&event, name.as_deref()).await
            }
            EventKind::Command(BotCommand::ShareLocation) => {
                self.handle_share_location(&event).await
            }
            EventKind::Command(BotCommand::Unknown(name)) => {
                tracing::debug!("Ignoring unknown command /{} in chat {}", name, event.chat_id);
                Ok(())
            }
        };

        if let Err(e) = result {
            tracing::error!("Failed to handle event in chat {}: {}", event.chat_id, e);
        }
    }

    async fn handle_start(&self, event: &InboundEvent) -> Result<()> {
        self.outbox.send_text(event.chat_id, GREETING).await?;
        best_effort(
            self.journal
                .record_response(event.chat_id, event.user_id, GREETING, &now_timestamp())
                .await,
            "start response",
        );
        Ok(())
    }

    async fn handle_share_location(&self, event: &InboundEvent) -> Result<()> {
        self.outbox
            .request_location(event.chat_id, LOCATION_PROMPT)
            .await
    }

    async fn handle_text(&self, event: &InboundEvent, text: &str) -> Result<()> {
        let timestamp = event.timestamp();
        let echo = format!("Echo: {} (Timestamp: {})", text, timestamp);

        let delivered: Result<()> = async {
            let id = self
                .journal
                .record_message(event.chat_id, event.user_id, text, &timestamp, false)
                .await?;
            tracing::debug!("Recorded message #{} from chat {}", id, event.chat_id);
            self.outbox.send_text(event.chat_id, &echo).await
        }
        .await;

        match delivered {
            Ok(()) => {
                best_effort(
                    self.journal
                        .record_response(event.chat_id, event.user_id, &echo, &now_timestamp())
                        .await,
                    "echo response",
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!("Error handling message: {}", e);
                self.outbox.send_text(event.chat_id, APOLOGY).await
            }
        }
    }

    async fn handle_location(&self, event: &InboundEvent, latitude: f64, longitude: f64) -> Result<()> {
        let delivered: Result<()> = async {
            let id = self
                .journal
                .record_location(event.chat_id, event.user_id, latitude, longitude, &event.timestamp())
                .await?;
            tracing::debug!("Recorded location #{} from chat {}", id, event.chat_id);
            self.outbox
                .send_text(
                    event.chat_id,
                    &format!("Location received: Latitude {:?}, Longitude {:?}", latitude, longitude),
                )
                .await
        }
        .await;

        if let Err(e) = delivered {
            tracing::error!("Error logging location: {}", e);
            self.outbox
                .send_text(event.chat_id, &format!("Error logging location: {}", e))
                .await?;
        }
        Ok(())
    }

    async fn handle_run_script(&self, event: &InboundEvent, name: Option<&str>) -> Result<()> {
        let Some(name) = name else {
            return self.outbox.send_text(event.chat_id, &self.scripts.usage()).await;
        };

        let path = match self.scripts.resolve(name) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!("Rejected /run_script from chat {}: {}", event.chat_id, e);
                return self.outbox.send_text(event.chat_id, INVALID_SCRIPT).await;
            }
        };

        let outcome: Result<()> = async {
            self.journal
                .record_message(
                    event.chat_id,
                    event.user_id,
                    &format!("/run_script {}", name),
                    &now_timestamp(),
                    false,
                )
                .await?;
            let reply = self.scripts.run(&path).await?.reply_text();
            self.outbox.send_text(event.chat_id, &reply).await?;
            self.journal
                .record_response(event.chat_id, event.user_id, &reply, &now_timestamp())
                .await?;
            Ok::<_, Error>(())
        }
        .await;

        if let Err(e) = outcome {
            tracing::error!("Error in run_script: {}", e);
            let error_msg = format!("Error: {}", e);
            self.outbox.send_text(event.chat_id, &error_msg).await?;
            self.journal
                .record_response(event.chat_id, event.user_id, &error_msg, &now_timestamp())
                .await?;
        }
        Ok(())
    }
}
