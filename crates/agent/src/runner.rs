//! The turn runner: one prompt in, one outcome out.

use std::sync::Arc;

use dfbridge_core::fulfillment::{FulfillmentResponse, UPSTREAM_FAILURE_APOLOGY};
use dfbridge_core::history::HistoryWindow;
use dfbridge_core::message::Turn;
use dfbridge_core::provider::{Provider, ProviderRequest};
use tracing::{debug, error};

use crate::assembler::{DEFAULT_SYSTEM_PROMPT, assemble_prompt};

/// How a single turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The model answered; `history` already contains the new exchange.
    Replied { reply: String, history: HistoryWindow },
    /// The provider failed; the window is left to expire on the caller side.
    Degraded { reply: String },
}

impl TurnOutcome {
    pub fn reply(&self) -> &str {
        match self {
            Self::Replied { reply, .. } | Self::Degraded { reply } => reply,
        }
    }

    /// Package the outcome as a Dialogflow webhook response.
    pub fn into_fulfillment(self, session: &str) -> FulfillmentResponse {
        match self {
            Self::Replied { reply, history } => FulfillmentResponse::success(session, reply, history),
            Self::Degraded { reply } => FulfillmentResponse::degraded(reply),
        }
    }
}

/// Runs turns against one provider and model.
///
/// Holds no per-session state, so a single instance is shared by every
/// in-flight request.
pub struct TurnRunner {
    provider: Arc<dyn Provider>,
    model: String,
    system_prompt: String,
}

impl TurnRunner {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }

    /// Replace the system directive placed at the head of every prompt.
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Answer `utterance` given the caller's `prior` window.
    pub async fn run(&self, prior: HistoryWindow, utterance: &str) -> TurnOutcome {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: assemble_prompt(&self.system_prompt, &prior, utterance),
        };

        debug!(
            provider = %self.provider.name(),
            model = %self.model,
            prompt_len = request.messages.len(),
            "Running turn"
        );

        match self.provider.complete(request).await {
            Ok(response) => {
                let reply = response.reply_text();
                let history = prior.push_exchange(Turn::user(utterance), Turn::assistant(&reply));
                TurnOutcome::Replied { reply, history }
            }
            Err(e) => {
                error!(
                    provider = %self.provider.name(),
                    model = %self.model,
                    error = %e,
                    "Completion failed, replying with apology"
                );
                TurnOutcome::Degraded {
                    reply: UPSTREAM_FAILURE_APOLOGY.to_string(),
                }
            }
        }
    }
}
