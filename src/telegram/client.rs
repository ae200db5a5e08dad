//! Telegram bot client - long polling via `teloxide::repl`.

use std::sync::Arc;

use teloxide::prelude::*;

use crate::config::Settings;
use crate::core::{BotCommand, Dispatcher, InboundEvent, Outbox};
use crate::error::Result;
use crate::script::ScriptRunner;
use crate::storage::{Journal, SqliteJournal};

use super::outbox::TelegramOutbox;

/// Convert a Telegram message into an inbound event.
///
/// Returns `None` for messages that carry neither text nor a location.
pub fn event_from_message(msg: &Message) -> Option<InboundEvent> {
    let chat_id = msg.chat.id.0;
    let user_id = msg.from.as_ref().map(|u| u.id.0 as i64).unwrap_or(0);

    if let Some(location) = msg.location() {
        return Some(InboundEvent::location(
            chat_id,
            user_id,
            msg.date,
            location.latitude,
            location.longitude,
        ));
    }

    msg.text()
        .map(|text| InboundEvent::from_text(chat_id, user_id, msg.date, text))
}

/// Run the relay until the process receives Ctrl-C.
pub async fn run_telegram_bot(settings: &Settings, token: String) -> Result<()> {
    tracing::info!("Starting Telegram bot...");

    let bot = Bot::new(token);

    let commands = BotCommand::descriptions()
        .iter()
        .map(|(command, description)| teloxide::types::BotCommand::new(*command, *description))
        .collect::<Vec<_>>();
    if let Err(e) = bot.set_my_commands(commands).await {
        tracing::warn!("Failed to set commands: {}", e);
    } else {
        tracing::info!("Telegram bot commands set");
    }

    let journal: Arc<dyn Journal> = Arc::new(SqliteJournal::new(settings.storage.database_path.clone()));
    let outbox: Arc<dyn Outbox> = Arc::new(TelegramOutbox::new(bot.clone()));
    let dispatcher = Arc::new(Dispatcher::new(
        journal,
        outbox,
        ScriptRunner::new(&settings.scripts),
    ));

    tracing::info!(
        "Journal at {}, scripts from {}",
        settings.storage.database_path.display(),
        settings.scripts.directory.display()
    );

    teloxide::repl(bot, move |msg: Message| {
        let dispatcher = dispatcher.clone();
        async move {
            match event_from_message(&msg) {
                Some(event) => dispatcher.dispatch(event).await,
                None => tracing::debug!("Ignoring unsupported message {} in chat {}", msg.id.0, msg.chat.id.0),
            }
            respond(())
        }
    })
    .await;

    tracing::info!("Telegram bot stopped");
    Ok(())
}
