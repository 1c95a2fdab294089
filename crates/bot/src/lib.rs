//! The conversational core of Pagewise.
//!
//! A user turn flows through this crate in a fixed order:
//!
//! 1. [`safety::SafetyGate`] screens the raw input (fail-closed),
//! 2. [`classifier::EmbeddingClassifier`] maps it to ranked intent
//!    candidates,
//! 3. [`dispatch::Dispatcher`] selects a capability chain: escalating
//!    through the chitchat pre-check and the generative router when the
//!    primary classifier found nothing,
//! 4. the chain produces the reply, and the session records both turns.
//!
//! [`session::BotSession`] ties the steps together and owns the ordering
//! contract.

pub mod chains;
pub mod classifier;
pub mod dispatch;
pub mod router_chain;
pub mod routes;
pub mod safety;
pub mod session;

pub use classifier::EmbeddingClassifier;
pub use dispatch::{ChainSet, Dispatcher, ERROR_REPLY, FALLBACK_REPLY};
pub use router_chain::{ChitchatClassifier, IntentRouterChain};
pub use safety::{SafetyGate, REJECTION_REPLY};
pub use session::{BotDeps, BotSession};
