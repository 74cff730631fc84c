//! Turn domain types.
//!
//! A turn is the unit that flows through the whole bridge:
//! Dialogflow sends the user's utterance → the prompt is assembled from turns →
//! the provider answers with an assistant turn → the window of turns goes back.

use serde::{Deserialize, Serialize};

/// The role of a turn's author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user talking to the Dialogflow agent
    User,
    /// The model's reply
    Assistant,
    /// The fixed directive at the head of every prompt; never stored in history
    System,
}

/// A single utterance attributed to one role.
///
/// Serialises as `{"role": "...", "content": "..."}`, which is both the
/// shape Dialogflow round-trips in the context parameters and the shape
/// the chat-completions API expects in `messages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Who said it
    pub role: Role,

    /// The text content
    pub content: String,
}

impl Turn {
    /// Create a new user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create a new assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Create a new system turn.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Whether this turn may live in a caller-supplied history window.
    pub fn is_conversational(&self) -> bool {
        matches!(self.role, Role::User | Role::Assistant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_turn() {
        let turn = Turn::user("Hola");
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.content, "Hola");
        assert!(turn.is_conversational());
    }

    #[test]
    fn system_turn_is_not_conversational() {
        assert!(!Turn::system("directive").is_conversational());
    }

    #[test]
    fn turn_wire_shape() {
        let json = serde_json::to_value(Turn::assistant("¡Hola!")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"role": "assistant", "content": "¡Hola!"})
        );
    }

    #[test]
    fn unknown_role_is_rejected() {
        let parsed: Result<Turn, _> =
            serde_json::from_str(r#"{"role": "tool", "content": "x"}"#);
        assert!(parsed.is_err());
    }
}
