use std::sync::Arc;
use crate::core::{ledger::RelationshipLedger, CoreError};
use crate::models::{ConversationMessage, Message};
use crate::services::MessageStore;

/// Authorizes chat between two users from their relationship state
#[derive(Clone)]
pub struct ConversationGate {
    ledger: RelationshipLedger,
    messages: Arc<dyn MessageStore>,
}

impl ConversationGate {
    pub fn new(ledger: RelationshipLedger, messages: Arc<dyn MessageStore>) -> Self {
        Self { ledger, messages }
    }

    /// True when an edge in either direction is matched or a superlike
    pub async fn is_authorized(&self, a: i64, b: i64) -> Result<bool, CoreError> {
        Ok(self.ledger.is_match(a, b).await?)
    }

    async fn ensure_authorized(&self, viewer_id: i64, partner_id: i64) -> Result<(), CoreError> {
        if self.is_authorized(viewer_id, partner_id).await? {
            Ok(())
        } else {
            tracing::debug!("Chat denied between {} and {}", viewer_id, partner_id);
            Err(CoreError::Forbidden("no chat permission".to_string()))
        }
    }

    /// Conversation between the viewer and a partner, oldest first
    pub async fn list_messages(
        &self,
        viewer_id: i64,
        partner_id: i64,
    ) -> Result<Vec<ConversationMessage>, CoreError> {
        self.ensure_authorized(viewer_id, partner_id).await?;

        let messages = self.messages.list_between(viewer_id, partner_id).await?;

        Ok(messages
            .into_iter()
            .map(|m| ConversationMessage {
                id: m.id,
                is_from_viewer: m.from_user == viewer_id,
                body: m.body,
                created_at: m.created_at,
            })
            .collect())
    }

    /// Send a message from the viewer to a partner
    pub async fn send_message(
        &self,
        viewer_id: i64,
        partner_id: i64,
        body: &str,
    ) -> Result<Message, CoreError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(CoreError::InvalidOperation("empty message".to_string()));
        }

        self.ensure_authorized(viewer_id, partner_id).await?;

        let message = self.messages.append(viewer_id, partner_id, body).await?;

        tracing::debug!("Message {} sent {} -> {}", message.id, viewer_id, partner_id);

        Ok(message)
    }
}
