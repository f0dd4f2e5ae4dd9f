//! # Handler chain
//!
//! Runs an ordered list of handlers for each message: every `before` in order (any `false`
//! stops the chain), then `handle` until one returns Stop, then every `after` in reverse order.

mod logging;

pub use logging::LoggingHandler;

use memebot_core::{Handler, HandlerResponse, Message, Result};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Ordered handlers shared by every message task; cloning is cheap.
#[derive(Clone, Default)]
pub struct HandlerChain {
    handlers: Vec<Arc<dyn Handler>>,
}

impl HandlerChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler (runs in order; first Stop ends the handle phase).
    pub fn add_handler(mut self, handler: Arc<dyn Handler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Runs the three phases for one message and returns Stop if any handler consumed it.
    #[instrument(skip(self, message), fields(message_id = %message.id))]
    pub async fn handle(&self, message: &Message) -> Result<HandlerResponse> {
        debug!(
            user_id = %message.sender.id,
            chat_id = message.chat.id,
            handlers = self.handlers.len(),
            "handler chain started"
        );

        for handler in &self.handlers {
            if !handler.before(message).await? {
                info!(
                    user_id = %message.sender.id,
                    handler = %std::any::type_name_of_val(handler.as_ref()),
                    "handler before returned false, chain stopped"
                );
                return Ok(HandlerResponse::Stop);
            }
        }

        let mut final_response = HandlerResponse::Continue;
        for handler in &self.handlers {
            let response = handler.handle(message).await?;
            if response == HandlerResponse::Stop {
                debug!(
                    handler = %std::any::type_name_of_val(handler.as_ref()),
                    "message consumed"
                );
                final_response = response;
                break;
            }
        }

        for handler in self.handlers.iter().rev() {
            handler.after(message, &final_response).await?;
        }

        debug!(response = ?final_response, "handler chain finished");
        Ok(final_response)
    }
}

// Integration tests live in tests/handler_chain_test.rs
