//! # phonorule
//!
//! Feature-based phoneme model and cascading sound-change rules over IPA
//! transcriptions.
//!
//! ## Quick start
//!
//! ```
//! use phonorule::{FeatureSpec, Inventory, Manner, Replacer, SoundSelector};
//!
//! let inv = Inventory::standard();
//!
//! // voiceless plosives become voiced at the end of a word
//! let voiceless_plosive = FeatureSpec::consonant().manner(Manner::Plosive).voiced(false);
//! let final_voicing = SoundSelector::from_spec(inv, voiceless_plosive)
//!     .word_final()
//!     .update_phonemes(FeatureSpec::new().voiced(true));
//!
//! let replacer = Replacer::new([final_voicing]);
//! assert_eq!(replacer.apply_to_ipa("kæt").unwrap(), "kæd");
//! ```
//!
//! ## Model
//! 1. **Inventory**: an ordered table of canonical phonemes and their
//!    articulatory features ([`Inventory::standard`] is built in).
//! 2. **Phoneme**: a canonical record plus diacritics encoding one-step
//!    deviations. Every feature edit is reconciled back onto the nearest
//!    record ([`phoneme::reconcile`]).
//! 3. **Tokenisation**: a transcription is split into phonemes with syllable,
//!    stress and word context ([`tokenize()`]).
//! 4. **Selectors**: rules deciding where they apply and what they produce
//!    ([`SoundSelector`]).
//! 5. **Cascade**: rules applied in order, each to the previous output
//!    ([`Replacer`]).
//!
//! The library logs through `tracing` and never installs a subscriber.

pub mod error;
pub mod features;
pub mod inventory;
pub mod marks;
pub mod phoneme;
pub mod replacer;
pub mod selector;
pub mod syllable;
pub mod tokenize;

// ─── Re-exports for convenience ─────────────────────────────────────────────

pub use error::{PhonoError, Result};
pub use features::{FeatureSpec, Height, Manner, PhonemeKind, Place, Position};
pub use inventory::{Inventory, PhonemeRecord};
pub use marks::{Diacritic, Length, Mark, MarkPatch};
pub use phoneme::{ContextualPhoneme, Phoneme, SyllableContext};
pub use replacer::{apply_rule_to_ipa, Replacer, ReplacerConfig};
pub use selector::{Exclusion, SoundSelector};
pub use tokenize::{tokenize, Token, Utterance};
