//! Chain and IntentClassifier traits: the seams between routing and the
//! capability implementations.

use crate::error::{ChainError, ProviderError};
use crate::intent::Classification;
use crate::turn::{EnrichedInput, SessionContext};
use async_trait::async_trait;

/// One conversational capability. The dispatcher selects a chain by intent
/// and asks it for the final reply text.
///
/// Chains convert their internal failures into user-visible error strings
/// where the failure is expected (a name that doesn't resolve, an empty
/// favorites list); `ChainError` is reserved for collaborator failures the
/// dispatcher turns into a generic error reply.
#[async_trait]
pub trait Chain: Send + Sync {
    /// The chain's name, for logging.
    fn name(&self) -> &str;

    /// Produce the reply for one user turn.
    async fn reply(
        &self,
        input: &EnrichedInput,
        session: &SessionContext,
    ) -> Result<String, ChainError>;
}

/// Maps a raw user utterance to ranked intent candidates.
///
/// An empty classification is a normal outcome (the dispatcher escalates);
/// errors are reserved for the underlying provider failing.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Classification, ProviderError>;
}
