//! Inbound events, independent of the messaging platform.

use chrono::{DateTime, SecondsFormat, Utc};

/// Commands the bot understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    /// `/run_script [name]`; `None` when no argument was given.
    RunScript(Option<String>),
    ShareLocation,
    /// Anything else that looks like a command. Ignored by the dispatcher.
    Unknown(String),
}

impl BotCommand {
    /// Parse `/name[@bot] args...`. Returns `None` for text that is not a command.
    pub fn parse(text: &str) -> Option<Self> {
        let rest = text.strip_prefix('/')?;
        let mut parts = rest.split_whitespace();
        let head = parts.next()?;
        let name = head.split('@').next().unwrap_or(head);

        let command = match name {
            "start" => BotCommand::Start,
            "run_script" => BotCommand::RunScript(parts.next().map(ToString::to_string)),
            "share_location" => BotCommand::ShareLocation,
            other => BotCommand::Unknown(other.to_string()),
        };
        Some(command)
    }

    /// Menu entries registered with the platform.
    pub fn descriptions() -> &'static [(&'static str, &'static str)] {
        &[
            ("start", "Start the bot"),
            ("run_script", "Run an allow-listed script"),
            ("share_location", "Share your location"),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    Text(String),
    Command(BotCommand),
    Location { latitude: f64, longitude: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    pub chat_id: i64,
    pub user_id: i64,
    /// Platform-assigned send time.
    pub date: DateTime<Utc>,
    pub kind: EventKind,
}

impl InboundEvent {
    /// Classify message text: a leading `/` makes it a command.
    pub fn from_text(chat_id: i64, user_id: i64, date: DateTime<Utc>, text: &str) -> Self {
        let kind = match BotCommand::parse(text) {
            Some(cmd) => EventKind::Command(cmd),
            None => EventKind::Text(text.to_string()),
        };
        Self {
            chat_id,
            user_id,
            date,
            kind,
        }
    }

    pub fn location(
        chat_id: i64,
        user_id: i64,
        date: DateTime<Utc>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            chat_id,
            user_id,
            date,
            kind: EventKind::Location {
                latitude,
                longitude,
            },
        }
    }

    /// ISO-8601 rendering of the platform timestamp.
    pub fn timestamp(&self) -> String {
        self.date.to_rfc3339()
    }
}

/// ISO-8601 timestamp for records the bot writes itself.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_known_commands() {
        assert_eq!(BotCommand::parse("/start"), Some(BotCommand::Start));
        assert_eq!(BotCommand::parse("/start@relay_bot"), Some(BotCommand::Start));
        assert_eq!(BotCommand::parse("/share_location"), Some(BotCommand::ShareLocation));
        assert_eq!(
            BotCommand::parse("/run_script  hello.py extra"),
            Some(BotCommand::RunScript(Some("hello.py".to_string())))
        );
        assert_eq!(BotCommand::parse("/run_script"), Some(BotCommand::RunScript(None)));
    }

    #[test]
    fn unknown_and_plain_text() {
        assert_eq!(
            BotCommand::parse("/weather today"),
            Some(BotCommand::Unknown("weather".to_string()))
        );
        assert_eq!(BotCommand::parse("hello /start"), None);
        assert_eq!(BotCommand::parse("/"), None);
        // Only a leading slash marks a command.
        assert_eq!(BotCommand::parse("  /start"), None);
    }

    #[test]
    fn event_classification() {
        let date = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let text = InboundEvent::from_text(1, 2, date, "hi there");
        assert_eq!(text.kind, EventKind::Text("hi there".to_string()));
        assert_eq!(text.timestamp(), "2024-01-01T12:00:00+00:00");

        let cmd = InboundEvent::from_text(1, 2, date, "/start");
        assert_eq!(cmd.kind, EventKind::Command(BotCommand::Start));

        let indented = InboundEvent::from_text(1, 2, date, "  /start");
        assert_eq!(indented.kind, EventKind::Text("  /start".to_string()));
    }
}
