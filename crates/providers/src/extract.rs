//! Structured extraction over a Provider.
//!
//! Chains need typed data out of free-form model output ("which profile
//! field?", "author or genre?"). The Extractor sends a system prompt with
//! JSON format instructions, then parses the reply into a caller-supplied
//! type. Models wrap JSON in prose and code fences often enough that the
//! parser scans for the outermost object instead of trusting the raw reply.
//!
//! Malformed output is `ProviderError::MalformedOutput`; callers treat it
//! as "nothing extracted" and fail toward their safe path.

use pagewise_core::error::ProviderError;
use pagewise_core::provider::{GenerationRequest, PromptMessage, Provider};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

/// Runs structured-output prompts against a provider.
#[derive(Clone)]
pub struct Extractor {
    provider: Arc<dyn Provider>,
    model: String,
}

impl Extractor {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Ask the model to produce JSON matching `format_hint` and parse the
    /// reply into `T`.
    ///
    /// `instructions` describes the task; `format_hint` is a JSON sketch of
    /// the expected shape (e.g. `{"flagged": true|false}`); `input` is the
    /// user content to extract from.
    pub async fn extract<T: DeserializeOwned>(
        &self,
        instructions: &str,
        format_hint: &str,
        input: &str,
    ) -> Result<T, ProviderError> {
        let system = format!(
            "{instructions}\n\nRespond with a single JSON object matching this shape, \
             and nothing else:\n{format_hint}"
        );

        let request = GenerationRequest::new(
            &self.model,
            vec![PromptMessage::system(system), PromptMessage::user(input)],
        )
        .with_temperature(0.0);

        let response = self.provider.complete(request).await?;
        debug!(model = %self.model, raw = %response.content, "Extraction response");

        parse_json_reply(&response.content)
    }
}

/// Parse a model reply into `T`, tolerating code fences and surrounding
/// prose.
pub fn parse_json_reply<T: DeserializeOwned>(reply: &str) -> Result<T, ProviderError> {
    let candidate = strip_code_fences(reply);
    let candidate = find_json_object(candidate).unwrap_or(candidate);

    serde_json::from_str(candidate)
        .map_err(|e| ProviderError::MalformedOutput(format!("{e}: {candidate:.200}")))
}

/// Strip a surrounding ``` or ```json fence if present.
fn strip_code_fences(s: &str) -> &str {
    let trimmed = s.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    inner.trim()
}

/// Locate the outermost `{...}` span, if any.
fn find_json_object(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let end = s.rfind('}')?;
    if end > start {
        Some(&s[start..=end])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Flag {
        flagged: bool,
    }

    #[test]
    fn parses_bare_json() {
        let flag: Flag = parse_json_reply(r#"{"flagged": true}"#).unwrap();
        assert!(flag.flagged);
    }

    #[test]
    fn parses_fenced_json() {
        let reply = "```json\n{\"flagged\": false}\n```";
        let flag: Flag = parse_json_reply(reply).unwrap();
        assert!(!flag.flagged);
    }

    #[test]
    fn parses_json_with_surrounding_prose() {
        let reply = "Sure! Here is the result: {\"flagged\": true} Hope that helps.";
        let flag: Flag = parse_json_reply(reply).unwrap();
        assert!(flag.flagged);
    }

    #[test]
    fn garbage_is_malformed_output() {
        let result: Result<Flag, _> = parse_json_reply("I cannot answer that.");
        match result {
            Err(ProviderError::MalformedOutput(_)) => {}
            other => panic!("Expected MalformedOutput, got: {other:?}"),
        }
    }

    #[test]
    fn wrong_shape_is_malformed_output() {
        let result: Result<Flag, _> = parse_json_reply(r#"{"verdict": "ok"}"#);
        assert!(matches!(result, Err(ProviderError::MalformedOutput(_))));
    }
}
