//! The persistence port used by the dispatcher.

use async_trait::async_trait;

use crate::error::Result;

/// Append-only sink for message and location records.
///
/// Every call is an independent durable write and returns the surrogate id
/// assigned to the new row.
#[async_trait]
pub trait Journal: Send + Sync {
    /// Record one message. `is_response` marks bot-originated text.
    async fn record_message(
        &self,
        chat_id: i64,
        user_id: i64,
        text: &str,
        timestamp: &str,
        is_response: bool,
    ) -> Result<i64>;

    /// Record a bot response.
    async fn record_response(
        &self,
        chat_id: i64,
        user_id: i64,
        text: &str,
        timestamp: &str,
    ) -> Result<i64> {
        self.record_message(chat_id, user_id, text, timestamp, true)
            .await
    }

    /// Record one location share.
    async fn record_location(
        &self,
        chat_id: i64,
        user_id: i64,
        latitude: f64,
        longitude: f64,
        timestamp: &str,
    ) -> Result<i64>;
}

/// Swallow a failed side write, reporting it through tracing.
pub fn best_effort(result: Result<i64>, what: &str) -> Option<i64> {
    match result {
        Ok(id) => {
            tracing::debug!("Recorded {} #{}", what, id);
            Some(id)
        }
        Err(e) => {
            tracing::error!("Error logging {}: {}", what, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn best_effort_keeps_id_and_drops_error() {
        assert_eq!(best_effort(Ok(7), "response"), Some(7));
        assert_eq!(
            best_effort(Err(Error::Storage("disk full".to_string())), "response"),
            None
        );
    }
}
