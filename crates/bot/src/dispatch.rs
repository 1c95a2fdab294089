//! Intent dispatch: one chain per intent, with a two-tier fallback for
//! messages the primary classifier couldn't place.
//!
//! Escalation order for an unresolved message: the binary chitchat check
//! first (cheap, catches most small talk), then the generative router over
//! the full label space, and finally a canned fallback reply. The
//! dispatcher never touches memory; the session layer owns the transcript.

use pagewise_core::{Chain, EnrichedInput, Intent, ProviderError, SessionContext};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Reply when no tier could place the message.
pub const FALLBACK_REPLY: &str =
    "Sorry, I couldn't work out what you're asking for. I can recommend books and authors, \
     manage your read list and favorites, build reading plans, and answer questions about \
     the service.";

/// Reply when the selected chain failed internally.
pub const ERROR_REPLY: &str =
    "Something went wrong on my side while handling that. Please try again in a moment.";

/// Second-tier check: is this message plain small talk?
#[async_trait]
pub trait ChitchatCheck: Send + Sync {
    async fn is_chitchat(&self, input: &EnrichedInput) -> Result<bool, ProviderError>;
}

/// Third-tier router: ask a model to pick from the full label space.
#[async_trait]
pub trait SecondaryRouter: Send + Sync {
    async fn resolve(&self, input: &EnrichedInput) -> Result<Option<Intent>, ProviderError>;
}

/// One chain per capability. The three knowledge intents share a chain.
pub struct ChainSet {
    pub update_profile: Arc<dyn Chain>,
    pub add_favorite: Arc<dyn Chain>,
    pub add_to_read_list: Arc<dyn Chain>,
    pub suggest_books: Arc<dyn Chain>,
    pub suggest_authors: Arc<dyn Chain>,
    pub suggest_books_by_trope: Arc<dyn Chain>,
    pub browse_catalog: Arc<dyn Chain>,
    pub create_reading_plan: Arc<dyn Chain>,
    pub knowledge: Arc<dyn Chain>,
    pub chitchat: Arc<dyn Chain>,
}

impl ChainSet {
    /// Select the chain for an intent. Exhaustive on purpose: a new intent
    /// variant fails to compile until it is wired here.
    pub fn chain_for(&self, intent: Intent) -> &Arc<dyn Chain> {
        match intent {
            Intent::UpdateProfile => &self.update_profile,
            Intent::AddFavorite => &self.add_favorite,
            Intent::AddToReadList => &self.add_to_read_list,
            Intent::SuggestBooks => &self.suggest_books,
            Intent::SuggestAuthors => &self.suggest_authors,
            Intent::SuggestBooksByTrope => &self.suggest_books_by_trope,
            Intent::BrowseCatalog => &self.browse_catalog,
            Intent::CreateReadingPlan => &self.create_reading_plan,
            Intent::RecommendBookstores
            | Intent::AskAboutFeatures
            | Intent::AskAboutCompany => &self.knowledge,
            Intent::Chitchat => &self.chitchat,
        }
    }
}

/// Routes one enriched turn to the chain that should answer it.
pub struct Dispatcher {
    chains: ChainSet,
    chitchat_check: Arc<dyn ChitchatCheck>,
    router: Arc<dyn SecondaryRouter>,
}

impl Dispatcher {
    pub fn new(
        chains: ChainSet,
        chitchat_check: Arc<dyn ChitchatCheck>,
        router: Arc<dyn SecondaryRouter>,
    ) -> Self {
        Self {
            chains,
            chitchat_check,
            router,
        }
    }

    /// Produce the reply for one turn. `intent` is the primary classifier's
    /// best candidate, if it had one above threshold.
    ///
    /// Infallible by construction: every internal failure maps to a canned
    /// reply, so a bad turn never breaks the conversation.
    pub async fn dispatch(
        &self,
        intent: Option<Intent>,
        input: &EnrichedInput,
        session: &SessionContext,
    ) -> String {
        let intent = match intent {
            Some(intent) => intent,
            None => match self.escalate(input).await {
                Some(intent) => intent,
                None => return FALLBACK_REPLY.to_string(),
            },
        };

        let chain = self.chains.chain_for(intent);
        debug!(intent = %intent, chain = chain.name(), "dispatching turn");
        match chain.reply(input, session).await {
            Ok(text) => text,
            Err(e) => {
                warn!(intent = %intent, chain = chain.name(), error = %e, "chain failed");
                ERROR_REPLY.to_string()
            }
        }
    }

    /// The unknown-intent path: chitchat check, then the generative router.
    async fn escalate(&self, input: &EnrichedInput) -> Option<Intent> {
        match self.chitchat_check.is_chitchat(input).await {
            Ok(true) => return Some(Intent::Chitchat),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "chitchat check failed, trying router"),
        }

        match self.router.resolve(input).await {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(error = %e, "secondary router failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagewise_core::{ChainError, RawInput};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NamedChain {
        name: &'static str,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Chain for NamedChain {
        fn name(&self) -> &str {
            self.name
        }

        async fn reply(
            &self,
            _input: &EnrichedInput,
            _session: &SessionContext,
        ) -> Result<String, ChainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("reply from {}", self.name))
        }
    }

    struct FailingChain;

    #[async_trait]
    impl Chain for FailingChain {
        fn name(&self) -> &str {
            "failing"
        }

        async fn reply(
            &self,
            _input: &EnrichedInput,
            _session: &SessionContext,
        ) -> Result<String, ChainError> {
            Err(ChainError::Internal("boom".into()))
        }
    }

    struct FixedChitchat(Result<bool, ProviderError>);

    #[async_trait]
    impl ChitchatCheck for FixedChitchat {
        async fn is_chitchat(&self, _input: &EnrichedInput) -> Result<bool, ProviderError> {
            self.0.clone()
        }
    }

    struct FixedRouter(Result<Option<Intent>, ProviderError>);

    #[async_trait]
    impl SecondaryRouter for FixedRouter {
        async fn resolve(&self, _input: &EnrichedInput) -> Result<Option<Intent>, ProviderError> {
            self.0.clone()
        }
    }

    fn named(name: &'static str) -> (Arc<dyn Chain>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Arc::new(NamedChain {
                name,
                calls: Arc::clone(&calls),
            }),
            calls,
        )
    }

    struct TestSet {
        chains: ChainSet,
        suggest_calls: Arc<AtomicUsize>,
        chitchat_calls: Arc<AtomicUsize>,
        knowledge_calls: Arc<AtomicUsize>,
    }

    fn chain_set() -> TestSet {
        let (suggest_books, suggest_calls) = named("suggest_books");
        let (chitchat, chitchat_calls) = named("chitchat");
        let (knowledge, knowledge_calls) = named("knowledge");
        let chains = ChainSet {
            update_profile: named("update_profile").0,
            add_favorite: named("add_favorite").0,
            add_to_read_list: named("add_to_read_list").0,
            suggest_books,
            suggest_authors: named("suggest_authors").0,
            suggest_books_by_trope: named("suggest_books_by_trope").0,
            browse_catalog: named("browse_catalog").0,
            create_reading_plan: named("create_reading_plan").0,
            knowledge,
            chitchat,
        };
        TestSet {
            chains,
            suggest_calls,
            chitchat_calls,
            knowledge_calls,
        }
    }

    fn session() -> SessionContext {
        SessionContext::new("alice", "conv-1")
    }

    fn input(text: &str) -> EnrichedInput {
        RawInput::new(text).enrich(Vec::new())
    }

    #[tokio::test]
    async fn known_intent_runs_its_chain() {
        let set = chain_set();
        let dispatcher = Dispatcher::new(
            set.chains,
            Arc::new(FixedChitchat(Ok(false))),
            Arc::new(FixedRouter(Ok(None))),
        );
        let reply = dispatcher
            .dispatch(Some(Intent::SuggestBooks), &input("books?"), &session())
            .await;
        assert_eq!(reply, "reply from suggest_books");
        assert_eq!(set.suggest_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn knowledge_intents_share_one_chain() {
        let set = chain_set();
        let dispatcher = Dispatcher::new(
            set.chains,
            Arc::new(FixedChitchat(Ok(false))),
            Arc::new(FixedRouter(Ok(None))),
        );
        for intent in [
            Intent::RecommendBookstores,
            Intent::AskAboutFeatures,
            Intent::AskAboutCompany,
        ] {
            let reply = dispatcher.dispatch(Some(intent), &input("?"), &session()).await;
            assert_eq!(reply, "reply from knowledge");
        }
        assert_eq!(set.knowledge_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn unresolved_chitchat_goes_to_chitchat_chain() {
        let set = chain_set();
        let dispatcher = Dispatcher::new(
            set.chains,
            Arc::new(FixedChitchat(Ok(true))),
            Arc::new(FixedRouter(Ok(None))),
        );
        let reply = dispatcher.dispatch(None, &input("hi there"), &session()).await;
        assert_eq!(reply, "reply from chitchat");
        assert_eq!(set.chitchat_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn router_resolves_when_not_chitchat() {
        let set = chain_set();
        let dispatcher = Dispatcher::new(
            set.chains,
            Arc::new(FixedChitchat(Ok(false))),
            Arc::new(FixedRouter(Ok(Some(Intent::SuggestBooks)))),
        );
        let reply = dispatcher.dispatch(None, &input("hmm"), &session()).await;
        assert_eq!(reply, "reply from suggest_books");
    }

    #[tokio::test]
    async fn nothing_resolves_yields_fallback() {
        let set = chain_set();
        let dispatcher = Dispatcher::new(
            set.chains,
            Arc::new(FixedChitchat(Ok(false))),
            Arc::new(FixedRouter(Ok(None))),
        );
        let reply = dispatcher.dispatch(None, &input("???"), &session()).await;
        assert_eq!(reply, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn chitchat_check_error_falls_through_to_router() {
        let set = chain_set();
        let dispatcher = Dispatcher::new(
            set.chains,
            Arc::new(FixedChitchat(Err(ProviderError::Network("down".into())))),
            Arc::new(FixedRouter(Ok(Some(Intent::Chitchat)))),
        );
        let reply = dispatcher.dispatch(None, &input("hey"), &session()).await;
        assert_eq!(reply, "reply from chitchat");
    }

    #[tokio::test]
    async fn router_error_yields_fallback() {
        let set = chain_set();
        let dispatcher = Dispatcher::new(
            set.chains,
            Arc::new(FixedChitchat(Ok(false))),
            Arc::new(FixedRouter(Err(ProviderError::Network("down".into())))),
        );
        let reply = dispatcher.dispatch(None, &input("hm"), &session()).await;
        assert_eq!(reply, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn chain_error_yields_error_reply() {
        let mut set = chain_set();
        set.chains.suggest_books = Arc::new(FailingChain);
        let dispatcher = Dispatcher::new(
            set.chains,
            Arc::new(FixedChitchat(Ok(false))),
            Arc::new(FixedRouter(Ok(None))),
        );
        let reply = dispatcher
            .dispatch(Some(Intent::SuggestBooks), &input("books"), &session())
            .await;
        assert_eq!(reply, ERROR_REPLY);
    }
}
