//! The Dialogflow ES fulfillment contract.
//!
//! Inbound, the webhook receives a `WebhookRequest` whose
//! `queryResult.outputContexts` may carry the turn window from the
//! previous round-trip. Outbound, it answers with `fulfillmentText` and,
//! on success, a refreshed context holding the new window.
//!
//! Reading is deliberately lenient: the payload is walked as an untyped
//! JSON value and anything missing or of the wrong shape falls back to an
//! empty default. Caller state can degrade the conversation, never fail it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::history::HistoryWindow;
use crate::message::Turn;

/// Name suffix of the context that round-trips the turn window.
pub const CONTEXT_SUFFIX: &str = "/contexts/deepseek_session";

/// Lifespan (in Dialogflow turns) given to the refreshed context.
pub const CONTEXT_LIFESPAN: u32 = 20;

/// Reply sent when the completion backend could not be reached.
pub const UPSTREAM_FAILURE_APOLOGY: &str =
    "Tuvimos un problema técnico hablando con el modelo. Intenta de nuevo.";

/// Everything the bridge needs from one inbound webhook call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookTurn {
    /// Opaque session path, e.g. `projects/p/agent/sessions/abc`.
    pub session: String,
    /// What the user just said.
    pub query_text: String,
    /// Prior turns recovered from the session context.
    pub history: HistoryWindow,
}

impl WebhookTurn {
    /// Pull session, utterance, and prior window out of a raw webhook body.
    pub fn extract(payload: &Value) -> Self {
        let session = string_at(payload, "/session");
        let query_text = string_at(payload, "/queryResult/queryText");
        let history = payload
            .pointer("/queryResult/outputContexts")
            .and_then(Value::as_array)
            .and_then(|contexts| find_session_context(contexts))
            .map(history_from_context)
            .unwrap_or_default();

        Self {
            session,
            query_text,
            history,
        }
    }
}

fn string_at(payload: &Value, pointer: &str) -> String {
    payload
        .pointer(pointer)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// First context whose name ends with [`CONTEXT_SUFFIX`].
fn find_session_context(contexts: &[Value]) -> Option<&Value> {
    contexts.iter().find(|ctx| {
        ctx.get("name")
            .and_then(Value::as_str)
            .is_some_and(|name| name.ends_with(CONTEXT_SUFFIX))
    })
}

fn history_from_context(context: &Value) -> HistoryWindow {
    let Some(entries) = context
        .pointer("/parameters/history")
        .and_then(Value::as_array)
    else {
        return HistoryWindow::new();
    };

    entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            match Turn::deserialize(entry) {
                Ok(turn) if turn.is_conversational() => Some(turn),
                Ok(_) => {
                    debug!(index, "Skipping system turn found in caller history");
                    None
                }
                Err(e) => {
                    debug!(index, error = %e, "Skipping malformed history entry");
                    None
                }
            }
        })
        .collect()
}

// --- Outbound ---

/// Parameters stored on the session context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextParameters {
    pub history: HistoryWindow,
}

/// A context the webhook asks Dialogflow to set for the next turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputContext {
    pub name: String,
    pub lifespan_count: u32,
    pub parameters: ContextParameters,
}

/// The webhook response body.
///
/// `output_contexts` is omitted entirely on the degraded path, so the
/// caller's own context simply ages out instead of being refreshed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentResponse {
    pub fulfillment_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_contexts: Option<Vec<OutputContext>>,
}

impl FulfillmentResponse {
    /// Reply plus the refreshed session context.
    pub fn success(session: &str, reply: impl Into<String>, history: HistoryWindow) -> Self {
        Self {
            fulfillment_text: reply.into(),
            output_contexts: Some(vec![OutputContext {
                name: format!("{session}{CONTEXT_SUFFIX}"),
                lifespan_count: CONTEXT_LIFESPAN,
                parameters: ContextParameters { history },
            }]),
        }
    }

    /// Reply only; no context echo.
    pub fn degraded(reply: impl Into<String>) -> Self {
        Self {
            fulfillment_text: reply.into(),
            output_contexts: None,
        }
    }
}
