//! LLM provider implementations for Pagewise.
//!
//! All providers implement the `pagewise_core::Provider` trait. The bot
//! crate consumes them through `Arc<dyn Provider>`, so the configured
//! backend is decided once, here.

pub mod extract;
pub mod fallback;
pub mod openai_compat;

pub use extract::{parse_json_reply, Extractor};
pub use fallback::FallbackProvider;
pub use openai_compat::OpenAiCompatProvider;

use pagewise_config::AppConfig;
use pagewise_core::error::ProviderError;
use pagewise_core::Provider;
use std::sync::Arc;
use std::time::Duration;

/// Build the configured provider.
///
/// Always an OpenAI-compatible endpoint; the config's base_url decides
/// whether that is OpenAI itself, a proxy, or a local server. When
/// `fallback_base_url` is set, the primary is wrapped in a
/// [`FallbackProvider`] that retries the second endpoint on failure.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let api_key = config
        .provider
        .api_key
        .clone()
        .ok_or_else(|| ProviderError::NotConfigured("No API key configured".into()))?;

    let timeout = Duration::from_secs(config.provider.request_timeout_secs);
    let primary = Arc::new(OpenAiCompatProvider::new(
        "openai",
        config.provider.base_url.clone(),
        api_key.clone(),
        timeout,
    )?);

    let Some(fallback_url) = config.provider.fallback_base_url.clone() else {
        return Ok(primary);
    };

    let fallback_key = config
        .provider
        .fallback_api_key
        .clone()
        .unwrap_or(api_key);
    let secondary = Arc::new(OpenAiCompatProvider::new(
        "openai-fallback",
        fallback_url,
        fallback_key,
        timeout,
    )?);

    Ok(Arc::new(
        FallbackProvider::new("fallback")
            .add(primary, timeout)
            .add(secondary, timeout),
    ))
}
