//! # dfbridge Core
//!
//! Domain types, traits, and error definitions for the dfbridge webhook.
//! This crate has **zero framework dependencies** — it defines the turn
//! model and the Dialogflow fulfillment contract that every other crate
//! builds against.
//!
//! ## Design Philosophy
//!
//! The bridge is stateless. Everything a request needs arrives in the
//! inbound payload and everything the next request needs leaves in the
//! outbound payload:
//!
//! - [`fulfillment`] reads the caller's context and writes the reply back
//! - [`history`] bounds the turn window carried between requests
//! - [`provider`] is the seam to the completion backend, so tests can
//!   swap in a mock

pub mod error;
pub mod fulfillment;
pub mod history;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use error::ProviderError;
pub use fulfillment::{
    CONTEXT_LIFESPAN, CONTEXT_SUFFIX, FulfillmentResponse, OutputContext, UPSTREAM_FAILURE_APOLOGY,
    WebhookTurn,
};
pub use history::{HistoryWindow, MAX_TURNS};
pub use message::{Role, Turn};
pub use provider::{EMPTY_REPLY_FALLBACK, Provider, ProviderRequest, ProviderResponse};
