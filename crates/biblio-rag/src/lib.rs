//! Retrieval pipeline: knowledge-base lifecycle, similarity retrieval,
//! and grounded answer generation.

pub mod assistant;
pub mod kb;
pub mod prompt;
pub mod retrieve;

pub use assistant::{Answer, Assistant};
pub use kb::{KbConfig, KnowledgeBase};
pub use prompt::build_prompt;

/// Passages retrieved per question unless configured otherwise.
pub const DEFAULT_TOP_K: usize = 3;
