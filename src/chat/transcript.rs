use serde::{Deserialize, Serialize};

/// Greeting that seeds every new transcript.
pub const GREETING: &str = "こんにちは！ご用件をどうぞ。";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    /// Role name in the chat-completion vocabulary.
    pub fn role(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub sender: Sender,
    pub text: String,
}

/// Ordered conversation history for one session. Append-only: turns are
/// never edited or removed, and the greeting turn is always present.
#[derive(Debug, Clone)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            turns: vec![Turn {
                sender: Sender::Assistant,
                text: GREETING.to_string(),
            }],
        }
    }

    pub fn push_user(&mut self, text: &str) {
        self.turns.push(Turn {
            sender: Sender::User,
            text: text.to_string(),
        });
    }

    pub fn push_assistant(&mut self, text: &str) {
        self.turns.push(Turn {
            sender: Sender::Assistant,
            text: text.to_string(),
        });
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn last(&self) -> &Turn {
        // Safe: the transcript is seeded and never shrinks.
        self.turns.last().expect("transcript is never empty")
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}
