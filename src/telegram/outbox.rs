//! Reply port backed by the Telegram Bot API.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ButtonRequest, KeyboardButton, KeyboardMarkup};

use crate::core::Outbox;
use crate::error::Result;

const LOCATION_BUTTON: &str = "Share Location";

#[derive(Clone)]
pub struct TelegramOutbox {
    bot: Bot,
}

impl TelegramOutbox {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn location_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![
        KeyboardButton::new(LOCATION_BUTTON).request(ButtonRequest::Location)
    ]])
    .one_time_keyboard()
    .resize_keyboard()
}

#[async_trait]
impl Outbox for TelegramOutbox {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()> {
        self.bot.send_message(ChatId(chat_id), text).await?;
        Ok(())
    }

    async fn request_location(&self, chat_id: i64, prompt: &str) -> Result<()> {
        self.bot
            .send_message(ChatId(chat_id), prompt)
            .reply_markup(location_keyboard())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyboard_has_single_location_button() {
        let keyboard = location_keyboard();
        assert_eq!(keyboard.keyboard.len(), 1);
        assert_eq!(keyboard.keyboard[0].len(), 1);
        assert_eq!(keyboard.keyboard[0][0].text, LOCATION_BUTTON);
        assert!(matches!(keyboard.keyboard[0][0].request, Some(ButtonRequest::Location)));
    }
}
