// Scripted support chat: keyword rules with canned fallbacks

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

pub const INTENT_CREATE_TICKET_START: &str = "CREATE_TICKET_START";
pub const INTENT_GATHER_INFO_FINANCE_APP: &str = "GATHER_INFO_FINANCE_APP";

const PASSWORD_RESET_REPLY: &str = "I can help with that. To reset your password, please go to \
     the login page and click on 'Forgot Password'. Would you like me to create a ticket for \
     this issue if that doesn't work?";
const CREATE_TICKET_REPLY: &str =
    "Okay, I can help you create a ticket. What is the title of your issue?";
const FINANCE_APP_REPLY: &str = "I understand you're having an issue with the finance app. \
     Can you describe the error message or what happens?";

/// Number of fallback replies `fallback_reply` can produce
pub const FALLBACK_COUNT: usize = 3;

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub reply: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
}

impl ChatReply {
    fn text(reply: &str) -> Self {
        Self { reply: reply.to_string(), intent: None }
    }

    fn with_intent(reply: &str, intent: &str) -> Self {
        Self { reply: reply.to_string(), intent: Some(intent.to_string()) }
    }
}

/// Stateless keyword responder
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatResponder;

impl ChatResponder {
    pub fn new() -> Self {
        Self
    }

    /// Answer `message`, picking a random fallback when no rule matches
    pub fn respond(&self, message: &str, user_id: Option<Uuid>) -> ChatReply {
        self.respond_with_rng(message, user_id, &mut rand::thread_rng())
    }

    pub fn respond_with_rng<R: Rng>(
        &self,
        message: &str,
        user_id: Option<Uuid>,
        rng: &mut R,
    ) -> ChatReply {
        debug!(user_id = ?user_id, message_len = message.len(), "Chat interaction");

        match keyword_reply(message) {
            Some(reply) => reply,
            None => fallback_reply(message, rng.gen_range(0..FALLBACK_COUNT)),
        }
    }
}

/// Keyword rules, checked in order on the lowercased message
pub fn keyword_reply(message: &str) -> Option<ChatReply> {
    let lowered = message.to_lowercase();

    if lowered.contains("password reset") {
        Some(ChatReply::text(PASSWORD_RESET_REPLY))
    } else if lowered.contains("create ticket") || lowered.contains("new issue") {
        Some(ChatReply::with_intent(CREATE_TICKET_REPLY, INTENT_CREATE_TICKET_START))
    } else if lowered.contains("finance app error") {
        Some(ChatReply::with_intent(FINANCE_APP_REPLY, INTENT_GATHER_INFO_FINANCE_APP))
    } else {
        None
    }
}

/// Fallback reply `index % FALLBACK_COUNT`; the last one echoes the message
pub fn fallback_reply(message: &str, index: usize) -> ChatReply {
    match index % FALLBACK_COUNT {
        0 => ChatReply::text(
            "I'm still learning! Can you please rephrase that? Or I can create a ticket for you.",
        ),
        1 => ChatReply::text(
            "Thanks for your message. A human expert will review this shortly if I can't help. \
             What else can I do?",
        ),
        _ => ChatReply {
            reply: format!("I've noted your request: '{}'. Is there anything else?", message),
            intent: None,
        },
    }
}
