//! Profile updates: extract which field to change and the new value, then
//! write it through the store.

use crate::chains::extraction_miss;
use async_trait::async_trait;
use pagewise_core::{
    BookStore, Chain, ChainError, EnrichedInput, ProfileField, Provider, SessionContext,
    StoreError,
};
use pagewise_providers::Extractor;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

const EXTRACT_INSTRUCTIONS: &str = "The user wants to change one field of their account \
     profile. Identify which field (username, email, password, or district) and the new \
     value. If the message names several fields, pick the one the user is clearly asking \
     to change.";

const FORMAT_HINT: &str =
    r#"{"field": "username"|"email"|"password"|"district", "value": "<new value>"}"#;

const UNCLEAR_REPLY: &str = "I couldn't tell which profile field you want to change. You can \
     update your username, email, password, or district, for example \"change my district \
     to Porto\".";

#[derive(Debug, Deserialize)]
struct ProfileChange {
    field: ProfileField,
    value: String,
}

/// Handles the `update_profile` intent.
pub struct UpdateProfileChain {
    extractor: Extractor,
    store: Arc<dyn BookStore>,
}

impl UpdateProfileChain {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, store: Arc<dyn BookStore>) -> Self {
        Self {
            extractor: Extractor::new(provider, model),
            store,
        }
    }
}

#[async_trait]
impl Chain for UpdateProfileChain {
    fn name(&self) -> &str {
        "update_profile"
    }

    async fn reply(
        &self,
        input: &EnrichedInput,
        session: &SessionContext,
    ) -> Result<String, ChainError> {
        let change: ProfileChange = match self
            .extractor
            .extract(EXTRACT_INSTRUCTIONS, FORMAT_HINT, &input.text)
            .await
        {
            Ok(change) => change,
            Err(e) if extraction_miss(&e) => return Ok(UNCLEAR_REPLY.to_string()),
            Err(e) => return Err(e.into()),
        };

        if change.value.trim().is_empty() {
            return Ok(UNCLEAR_REPLY.to_string());
        }

        match self
            .store
            .update_profile_field(&session.username, change.field, change.value.trim())
            .await
        {
            Ok(()) => {
                info!(user = %session.username, field = change.field.label(), "profile updated");
                let shown = match change.field {
                    // Never echo a password back.
                    ProfileField::Password => String::new(),
                    _ => format!(" to \"{}\"", change.value.trim()),
                };
                Ok(format!(
                    "Done! Your {} has been updated{shown}.",
                    change.field.label()
                ))
            }
            Err(StoreError::NotFound(_)) => Ok(
                "I couldn't find your profile to update. Please make sure you're logged in."
                    .to_string(),
            ),
            Err(e) => Err(e.into()),
        }
    }
}
