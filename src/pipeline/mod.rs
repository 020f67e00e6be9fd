//! Email triage pipeline.
//!
//! Every message flows through:
//! 1. `RulesEngine::evaluate()` — fast pattern matching (no LLM)
//! 2. `TriageProcessor::classify()` — LLM classification with lenient JSON
//!    recovery and one repair call
//! 3. `sanitize()` — coercion into a well-formed result
//! 4. `guard::apply()` — deterministic re-check of Produtivo verdicts
//!
//! **No error path exists.** Every failure ends in a fixed degraded result.

pub mod guard;
pub mod lenient_json;
pub mod normalize;
pub mod processor;
pub mod prompt;
pub mod rules;
pub mod sanitize;
pub mod types;

pub use processor::{TriageOutcome, TriagePath, TriageProcessor};
pub use types::{Category, ClassificationResult, ProcessResponse};
