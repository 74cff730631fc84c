//! Provider trait — the abstraction over the completion backend.
//!
//! A Provider knows how to send an assembled prompt to an LLM and get a
//! single reply back. The bridge talks to exactly one provider at a time;
//! the trait exists so the pipeline can be driven by a mock in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::Turn;

/// Reply used when the provider answers without any text.
pub const EMPTY_REPLY_FALLBACK: &str = "Lo siento, no pude generar respuesta.";

/// A single chat-completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "deepseek-chat")
    pub model: String,

    /// The full prompt, system directive first
    pub messages: Vec<Turn>,
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// Text of the first choice, if the provider returned any
    pub content: Option<String>,

    /// Which model actually responded (may differ from requested)
    #[serde(default)]
    pub model: Option<String>,
}

impl ProviderResponse {
    /// The reply text, substituting [`EMPTY_REPLY_FALLBACK`] when the
    /// provider returned nothing usable.
    pub fn reply_text(self) -> String {
        self.content
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| EMPTY_REPLY_FALLBACK.to_string())
    }
}

/// The core Provider trait.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "deepseek").
    fn name(&self) -> &str;

    /// Send a request and wait for the complete response.
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError>;

    /// Health check — can we reach the provider?
    async fn health_check(&self) -> Result<bool, ProviderError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_text_passes_content_through() {
        let response = ProviderResponse {
            content: Some("¡Hola! ¿En qué puedo ayudarte?".into()),
            model: Some("deepseek-chat".into()),
        };
        assert_eq!(response.reply_text(), "¡Hola! ¿En qué puedo ayudarte?");
    }

    #[test]
    fn missing_or_empty_content_falls_back() {
        for content in [None, Some(String::new())] {
            let response = ProviderResponse {
                content,
                model: None,
            };
            assert_eq!(response.reply_text(), EMPTY_REPLY_FALLBACK);
        }
    }

    #[test]
    fn request_serializes_messages_in_order() {
        let request = ProviderRequest {
            model: "deepseek-chat".into(),
            messages: vec![Turn::system("be brief"), Turn::user("Hola")],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "Hola");
    }

    struct AlwaysUp;

    #[async_trait]
    impl Provider for AlwaysUp {
        fn name(&self) -> &str {
            "always_up"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            Ok(ProviderResponse {
                content: None,
                model: None,
            })
        }
    }

    #[tokio::test]
    async fn default_health_check_is_optimistic() {
        assert!(AlwaysUp.health_check().await.unwrap());
    }
}
