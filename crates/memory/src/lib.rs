//! Conversation memory for Pagewise.
//!
//! Backends implement `pagewise_core::TranscriptStore`; the `MemoryManager`
//! adds the in-process layer on top: lazy loading, per-turn appends,
//! explicit flushing, and the per-conversation locks that serialize turns.

pub mod file_backend;
pub mod in_memory;
pub mod manager;

pub use file_backend::FileTranscripts;
pub use in_memory::InMemoryTranscripts;
pub use manager::MemoryManager;
