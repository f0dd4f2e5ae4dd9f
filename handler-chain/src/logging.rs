//! Request logging as a handler: logs each message in before() and the outcome in after().

use async_trait::async_trait;
use memebot_core::{Handler, HandlerResponse, Message, Result};
use tracing::{debug, info, instrument};

/// Logs each message in before() and the response in after(); always continues.
pub struct LoggingHandler;

#[async_trait]
impl Handler for LoggingHandler {
    #[instrument(skip(self, message))]
    async fn before(&self, message: &Message) -> Result<bool> {
        info!(
            user_id = %message.sender.id,
            username = %message.sender.username.as_deref().unwrap_or("unknown"),
            chat_id = message.chat.id,
            segments = message.segments.len(),
            message_content = %message.text,
            "Received message"
        );
        Ok(true)
    }

    #[instrument(skip(self, message, response))]
    async fn after(&self, message: &Message, response: &HandlerResponse) -> Result<()> {
        debug!(
            message_id = %message.id,
            response = ?response,
            "Processed message"
        );
        Ok(())
    }
}
