//! Chat transcript kept by the caller.
//!
//! The session itself is stateless; whatever front end drives it owns the
//! conversation history.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Monotonic position in the conversation
    pub timestamp: u64,
}

/// Ordered conversation history.
#[derive(Debug, Default, Serialize)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    counter: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a question and its answer. The counter advances by two.
    pub fn record_exchange(&mut self, question: &str, answer: &str) {
        self.push(Role::User, question);
        self.push(Role::Assistant, answer);
    }

    fn push(&mut self, role: Role, content: &str) {
        self.messages.push(ChatMessage {
            role,
            content: content.to_string(),
            timestamp: self.counter,
        });
        self.counter += 1;
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Questions offered to a new user.
pub const SAMPLE_QUESTIONS: &[&str] = &[
    "What's their background?",
    "What programming languages do they know?",
    "Tell me about their most recent internship",
    "What projects have they worked on?",
    "What's their educational background?",
    "Do they have cloud experience?",
    "What technologies do they use?",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_timestamps_are_monotonic() {
        let mut transcript = Transcript::new();
        assert!(transcript.is_empty());

        transcript.record_exchange("Skills?", "Rust and Go.");
        transcript.record_exchange("Education?", "BSc Physics.");

        let messages = transcript.messages();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[3].content, "BSc Physics.");
        let stamps: Vec<u64> = messages.iter().map(|m| m.timestamp).collect();
        assert_eq!(stamps, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_serializes_roles_lowercase() {
        let mut transcript = Transcript::new();
        transcript.record_exchange("Hi", "Hello");
        let json = serde_json::to_value(transcript.messages()).unwrap();
        assert_eq!(json[0]["role"], "user");
        assert_eq!(json[1]["role"], "assistant");
    }
}
