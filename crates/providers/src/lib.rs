//! Completion backend implementations for dfbridge.
//!
//! All providers implement the `dfbridge_core::Provider` trait.
//! [`build_from_config`] wires the configured endpoint into one.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;

use dfbridge_config::AppConfig;
use dfbridge_core::ProviderError;

/// Build the completion provider described by the configuration.
pub fn build_from_config(config: &AppConfig) -> Result<OpenAiCompatProvider, ProviderError> {
    let api_key = config.api_key.clone().ok_or_else(|| {
        ProviderError::NotConfigured("no API key set (DEEPSEEK_API_KEY or api_key)".into())
    })?;

    OpenAiCompatProvider::new(
        "deepseek",
        &config.base_url,
        api_key,
        std::time::Duration::from_secs(config.request_timeout_secs),
    )
}
