//! Error type shared by every module of the crate.
//!
//! Most of the engine degrades silently (unknown characters are skipped,
//! inapplicable feature fields are ignored); the variants below are the few
//! conditions a caller can actually trip over.

use thiserror::Error;

use crate::features::PhonemeKind;

/// Errors produced while building phonemes, selectors, or rewriting text.
#[derive(Debug, Error)]
pub enum PhonoError {
    /// A phoneme was requested for a symbol that is not in the inventory.
    #[error("symbol {0:?} is not in the phonetic inventory")]
    UnknownSymbol(String),

    /// Reconciliation found no canonical record adjacent to the requested
    /// feature bundle.
    #[error("no {kind} in the inventory is adjacent to the features requested for {symbol:?}")]
    NoCandidate { kind: PhonemeKind, symbol: String },

    /// The syllable-start pattern did not compile.
    #[error("syllable pattern failed to compile: {0}")]
    Pattern(#[from] Box<fancy_regex::Error>),

    /// An exclusion sub-selector carries no rejection rules, so its matching
    /// gate is always satisfied and only the pattern view is narrowed.
    #[error("exclusion of selector {0:?} has no rejection rules")]
    VacuousExclusion(String),

    /// A [`ReplacerConfig`](crate::replacer::ReplacerConfig) could not be parsed.
    #[error("invalid replacer config: {0}")]
    Config(#[from] serde_json::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, PhonoError>;
