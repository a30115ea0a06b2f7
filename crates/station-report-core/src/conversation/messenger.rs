//! Messaging collaborator interface.

use super::keyboard::{Keyboard, MessageId, Prompt};
use crate::error::Result;
use crate::session::UserId;
use async_trait::async_trait;

/// Delivers prompts to a user over some chat transport.
///
/// Implementations map [`Keyboard`] onto whatever the transport offers
/// (reply keyboards, inline grids, plain numbered options).
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Sends a message and returns the id the transport assigned to it.
    async fn send_prompt(&self, user: UserId, prompt: &Prompt) -> Result<MessageId>;

    /// Replaces the inline keyboard of a previously sent message.
    async fn edit_keyboard(
        &self,
        user: UserId,
        message_id: MessageId,
        keyboard: &Keyboard,
    ) -> Result<()>;

    async fn delete_message(&self, user: UserId, message_id: MessageId) -> Result<()>;
}
