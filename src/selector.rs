//! Sound selectors: the rule engine.
//!
//! A [`SoundSelector`] is one sound-change rule. It answers two questions
//! about a phoneme sitting at some index of a phoneme sequence:
//!
//! 1. *Does the rule apply here?* ([`SoundSelector::test_if_applies`]): a
//!    base membership test (explicit sounds or a fuzzy feature spec) AND'ed
//!    with every rejection rule evaluating `false`, AND'ed with the exclusion
//!    gate.
//! 2. *What does it produce?* ([`SoundSelector::execute_on`]): a feature
//!    patch, a mark patch, then phoneme-level and text-level rewrites.
//!
//! Selectors are assembled fluently and consumed by value:
//!
//! ```
//! use phonorule::{FeatureSpec, Inventory, Manner, SoundSelector};
//!
//! let inv = Inventory::standard();
//! let plosives = FeatureSpec::consonant().manner(Manner::Plosive);
//! let final_devoicing = SoundSelector::from_spec(inv, plosives)
//!     .word_final()
//!     .update_phonemes(FeatureSpec::new().voiced(false))
//!     .named("final devoicing");
//! assert_eq!(final_devoicing.name(), Some("final devoicing"));
//! ```
//!
//! [`SoundSelector::not`] returns an [`Exclusion`] handle instead of the
//! selector itself. Positional rules called on the handle configure the
//! exclusion; patches and rewrites called on it go to the owning selector.
//! The handle converts back with [`Exclusion::into_selector`] (or `into()`).

use std::fmt;

use tracing::warn;

use crate::error::{PhonoError, Result};
use crate::features::FeatureSpec;
use crate::inventory::{Inventory, PhonemeRecord};
use crate::marks::MarkPatch;
use crate::phoneme::{ContextualPhoneme, Phoneme, SyllableContext};

/// `true` means the context violates the rule.
pub type RejectionRule<'a> =
    Box<dyn Fn(&ContextualPhoneme<'a>, usize, &[ContextualPhoneme<'a>]) -> bool + Send + Sync + 'a>;

/// Phoneme-level rewrite, folded over the patched phoneme.
pub type PhonemeRewrite<'a> = Box<
    dyn Fn(ContextualPhoneme<'a>, usize, &[ContextualPhoneme<'a>]) -> Result<ContextualPhoneme<'a>>
        + Send
        + Sync
        + 'a,
>;

/// Text-level rewrite, folded over the rendered output. Receives the
/// rewritten phoneme as well.
pub type TextRewrite<'a> = Box<
    dyn Fn(String, &ContextualPhoneme<'a>, usize, &[ContextualPhoneme<'a>]) -> String
        + Send
        + Sync
        + 'a,
>;

/// Observes every match decision.
pub type DebugHook<'a> =
    Box<dyn Fn(bool, &ContextualPhoneme<'a>, usize, &[ContextualPhoneme<'a>]) + Send + Sync + 'a>;

// ─────────────────────────────────────────────────────────────────────────────
// SoundSelector
// ─────────────────────────────────────────────────────────────────────────────

pub struct SoundSelector<'a> {
    inventory: &'a Inventory,
    name: Option<String>,
    sounds: Vec<Phoneme<'a>>,
    fuzzy_spec: Option<FeatureSpec>,
    strict: bool,
    exclusion: Option<Box<SoundSelector<'a>>>,
    rejection_rules: Vec<RejectionRule<'a>>,
    feature_patch: FeatureSpec,
    mark_patch: MarkPatch,
    replacers: Vec<PhonemeRewrite<'a>>,
    string_replacers: Vec<TextRewrite<'a>>,
    debuggers: Vec<DebugHook<'a>>,
}

impl<'a> SoundSelector<'a> {
    /// Matches the given phonemes (by symbol unless [`strictly`](Self::strictly)).
    pub fn from_sounds(
        inventory: &'a Inventory,
        sounds: impl IntoIterator<Item = Phoneme<'a>>,
    ) -> Self {
        Self {
            inventory,
            name: None,
            sounds: sounds.into_iter().collect(),
            fuzzy_spec: None,
            strict: false,
            exclusion: None,
            rejection_rules: Vec::new(),
            feature_patch: FeatureSpec::default(),
            mark_patch: MarkPatch::default(),
            replacers: Vec::new(),
            string_replacers: Vec::new(),
            debuggers: Vec::new(),
        }
    }

    /// Matches the bare phonemes for `symbols`.
    pub fn from_symbols(inventory: &'a Inventory, symbols: &str) -> Result<Self> {
        let sounds = symbols
            .chars()
            .map(|c| Phoneme::new(inventory, c))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_sounds(inventory, sounds))
    }

    /// Matches every phoneme whose canonical features satisfy `spec`.
    ///
    /// The matching records are resolved eagerly into the sound list; the spec
    /// itself is kept and drives matching.
    pub fn from_spec(inventory: &'a Inventory, spec: FeatureSpec) -> Self {
        let sounds: Vec<Phoneme<'a>> =
            inventory.matching(&spec).map(|r| Phoneme::from_record(inventory, r)).collect();
        let mut selector = Self::from_sounds(inventory, sounds);
        selector.fuzzy_spec = Some(spec);
        selector
    }

    /// Matches every phoneme.
    pub fn any(inventory: &'a Inventory) -> Self {
        Self::from_spec(inventory, FeatureSpec::new())
    }

    pub fn inventory(&self) -> &'a Inventory {
        self.inventory
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn sounds(&self) -> &[Phoneme<'a>] {
        &self.sounds
    }

    /// Label used in log events and `Debug` output.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Compare explicit sounds by canonical features instead of symbol.
    pub fn strictly(mut self) -> Self {
        self.strict = true;
        self
    }

    // ── rejection rules ─────────────────────────────────────────────────────

    /// Rejects when `rule` returns `true`.
    pub fn reject_if<F>(mut self, rule: F) -> Self
    where
        F: Fn(&ContextualPhoneme<'a>, usize, &[ContextualPhoneme<'a>]) -> bool + Send + Sync + 'a,
    {
        self.rejection_rules.push(Box::new(rule));
        self
    }

    /// Requires the next phoneme to match `next`.
    pub fn before(self, next: SoundSelector<'a>) -> Self {
        self.reject_if(move |_, i, seq| match seq.get(i + 1) {
            Some(p) => !next.test_if_applies(p, i + 1, seq),
            None => true,
        })
    }

    /// Requires the previous phoneme to match `prev`.
    pub fn after(self, prev: SoundSelector<'a>) -> Self {
        self.reject_if(move |_, i, seq| match i.checked_sub(1).and_then(|j| seq.get(j)) {
            Some(p) => !prev.test_if_applies(p, i - 1, seq),
            None => true,
        })
    }

    /// Requires the next phoneme to be like `spec`.
    pub fn before_spec(self, spec: FeatureSpec) -> Self {
        self.reject_if(move |_, i, seq| !seq.get(i + 1).is_some_and(|p| p.is_like(&spec)))
    }

    /// Requires the previous phoneme to be like `spec`.
    pub fn after_spec(self, spec: FeatureSpec) -> Self {
        self.reject_if(move |_, i, seq| {
            !i.checked_sub(1).and_then(|j| seq.get(j)).is_some_and(|p| p.is_like(&spec))
        })
    }

    pub fn start_of_syllable(self) -> Self {
        self.reject_if(|p, _, _| p.context.position_in_syllable > 0)
    }

    pub fn in_stressed_syllable(self) -> Self {
        self.reject_if(|p, _, _| !p.context.stressed)
    }

    /// Requires the phoneme to open its word.
    pub fn word_initial(self) -> Self {
        self.reject_if(|p, i, seq| {
            i.checked_sub(1)
                .and_then(|j| seq.get(j))
                .is_some_and(|prev| prev.context.word_index == p.context.word_index)
        })
    }

    /// Requires the phoneme to close its word.
    pub fn word_final(self) -> Self {
        self.reject_if(|p, i, seq| {
            seq.get(i + 1).is_some_and(|next| next.context.word_index == p.context.word_index)
        })
    }

    // ── rewrites ────────────────────────────────────────────────────────────

    /// Merges `patch` into the feature patch applied on a match.
    pub fn update_phonemes(mut self, patch: FeatureSpec) -> Self {
        self.feature_patch = self.feature_patch.merged(&patch);
        self
    }

    /// Merges `patch` into the mark patch applied on a match.
    pub fn update_modifiers(mut self, patch: MarkPatch) -> Self {
        self.mark_patch = self.mark_patch.merged(&patch);
        self
    }

    pub fn add_replacer<F>(mut self, rewrite: F) -> Self
    where
        F: Fn(
                ContextualPhoneme<'a>,
                usize,
                &[ContextualPhoneme<'a>],
            ) -> Result<ContextualPhoneme<'a>>
            + Send
            + Sync
            + 'a,
    {
        self.replacers.push(Box::new(rewrite));
        self
    }

    pub fn add_string_replacer<F>(mut self, rewrite: F) -> Self
    where
        F: Fn(String, &ContextualPhoneme<'a>, usize, &[ContextualPhoneme<'a>]) -> String
            + Send
            + Sync
            + 'a,
    {
        self.string_replacers.push(Box::new(rewrite));
        self
    }

    pub fn add_debugger<F>(mut self, hook: F) -> Self
    where
        F: Fn(bool, &ContextualPhoneme<'a>, usize, &[ContextualPhoneme<'a>]) + Send + Sync + 'a,
    {
        self.debuggers.push(Box::new(hook));
        self
    }

    // ── exclusion ───────────────────────────────────────────────────────────

    /// Starts (or continues) configuring the exclusion sub-selector.
    ///
    /// `sounds` are removed from this selector's pattern class. Rejection
    /// rules added on the returned handle gate matching: the owner only
    /// matches when *all* of them fire.
    pub fn not(mut self, sounds: impl IntoIterator<Item = Phoneme<'a>>) -> Exclusion<'a> {
        let exclusion = match self.exclusion.take() {
            Some(mut existing) => {
                existing.sounds.extend(sounds);
                *existing
            }
            None => SoundSelector::from_sounds(self.inventory, sounds),
        };
        Exclusion { owner: self, exclusion }
    }

    /// [`not`](Self::not) over symbols.
    pub fn not_symbols(self, symbols: &str) -> Result<Exclusion<'a>> {
        let inventory = self.inventory;
        let sounds = symbols
            .chars()
            .map(|c| Phoneme::new(inventory, c))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.not(sounds))
    }

    pub fn has_exclusion(&self) -> bool {
        self.exclusion.is_some()
    }

    /// Fails with [`PhonoError::VacuousExclusion`] when the exclusion has no
    /// rejection rules, so its gate can never narrow matching.
    pub fn validate(&self) -> Result<()> {
        match &self.exclusion {
            Some(exclusion) if exclusion.rejection_rules.is_empty() => {
                let rule = self.name.clone().unwrap_or_else(|| self.describe());
                Err(PhonoError::VacuousExclusion(rule))
            }
            _ => Ok(()),
        }
    }

    // ── matching ────────────────────────────────────────────────────────────

    /// Whether this rule applies to `phoneme`, the `index`-th entry of the
    /// phoneme-only sequence `seq`.
    pub fn test_if_applies(
        &self,
        phoneme: &ContextualPhoneme<'a>,
        index: usize,
        seq: &[ContextualPhoneme<'a>],
    ) -> bool {
        let result = self.applies(self.exclusion.as_deref(), phoneme, index, seq);

        for hook in &self.debuggers {
            hook(result, phoneme, index, seq);
        }
        result
    }

    /// [`test_if_applies`](Self::test_if_applies) with `phoneme` as the whole
    /// sequence.
    pub fn test(&self, phoneme: &ContextualPhoneme<'a>) -> bool {
        self.test_if_applies(phoneme, 0, std::slice::from_ref(phoneme))
    }

    /// The matching decision with `exclusion` as the gate.
    fn applies(
        &self,
        exclusion: Option<&SoundSelector<'a>>,
        phoneme: &ContextualPhoneme<'a>,
        index: usize,
        seq: &[ContextualPhoneme<'a>],
    ) -> bool {
        self.base_test(phoneme)
            && self.rejection_rules.iter().all(|rule| !rule(phoneme, index, seq))
            && exclusion.map_or(true, |ex| {
                ex.rejection_rules.iter().all(|rule| rule(phoneme, index, seq))
            })
    }

    fn base_test(&self, phoneme: &Phoneme<'_>) -> bool {
        match &self.fuzzy_spec {
            Some(spec) => phoneme.is_like(spec),
            None if self.strict => self.sounds.iter().any(|s| s.is_equivalent(phoneme)),
            None => self.sounds.iter().any(|s| s.is_fuzzy_equal(phoneme)),
        }
    }

    /// Inventory records this selector matches in a neutral context.
    pub fn matching_records(&self) -> Vec<&'a PhonemeRecord> {
        self.records_gated_by(self.exclusion.as_deref())
    }

    fn records_gated_by(&self, exclusion: Option<&SoundSelector<'a>>) -> Vec<&'a PhonemeRecord> {
        self.inventory
            .records()
            .iter()
            .filter(|r| {
                let candidate = Phoneme::from_record(self.inventory, r)
                    .contextualize(SyllableContext::default());
                self.applies(exclusion, &candidate, 0, std::slice::from_ref(&candidate))
            })
            .collect()
    }

    /// Regex character class of the symbols this selector stands for.
    ///
    /// The class lists every matching record except the exclusion's sounds.
    /// A class with no members renders as a never-matching group.
    pub fn to_pattern_class(&self) -> String {
        let excluded = self.exclusion.as_ref().map_or(&[][..], |ex| ex.sounds.as_slice());
        pattern_class(self.matching_records(), excluded)
    }

    // ── rewriting ───────────────────────────────────────────────────────────

    /// Renders `phoneme` after this rule: unchanged text when the rule does
    /// not apply, otherwise patched and rewritten.
    pub fn execute_on(
        &self,
        phoneme: &ContextualPhoneme<'a>,
        index: usize,
        seq: &[ContextualPhoneme<'a>],
    ) -> Result<String> {
        if !self.test_if_applies(phoneme, index, seq) {
            return Ok(phoneme.to_string());
        }

        let mut updated = phoneme.clone();
        if !self.feature_patch.is_empty() {
            if let Err(err) = updated.update_features(&self.feature_patch) {
                warn!(
                    rule = %self.describe(),
                    phoneme = %phoneme,
                    index,
                    "feature patch has no candidate"
                );
                return Err(err);
            }
        }
        if !self.mark_patch.is_empty() {
            updated.update_marks(&self.mark_patch);
        }

        let rewritten = self
            .replacers
            .iter()
            .try_fold(updated, |acc, rewrite| rewrite(acc, index, seq))
            .map_err(|err| {
                warn!(
                    rule = %self.describe(),
                    phoneme = %phoneme,
                    index,
                    error = %err,
                    "rewrite failed"
                );
                err
            })?;

        let text = rewritten.to_string();
        Ok(self
            .string_replacers
            .iter()
            .fold(text, |acc, rewrite| rewrite(acc, &rewritten, index, seq)))
    }

    /// Name, or a summary of what the selector matches.
    pub fn describe(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        match &self.fuzzy_spec {
            Some(spec) => format!("{:?}", spec),
            None => self.sounds.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(","),
        }
    }
}

impl fmt::Debug for SoundSelector<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoundSelector")
            .field("name", &self.name)
            .field("sounds", &self.sounds.iter().map(|p| p.to_string()).collect::<String>())
            .field("fuzzy_spec", &self.fuzzy_spec)
            .field("strict", &self.strict)
            .field("rejection_rules", &self.rejection_rules.len())
            .field("exclusion", &self.exclusion)
            .field("feature_patch", &self.feature_patch)
            .field("mark_patch", &self.mark_patch)
            .field("replacers", &(self.replacers.len() + self.string_replacers.len()))
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Exclusion handle
// ─────────────────────────────────────────────────────────────────────────────

/// A selector whose exclusion is being configured.
///
/// Rejection-rule methods act on the exclusion; patch and rewrite methods are
/// forwarded to the owning selector and hand back the owner.
pub struct Exclusion<'a> {
    owner: SoundSelector<'a>,
    exclusion: SoundSelector<'a>,
}

impl<'a> Exclusion<'a> {
    /// Puts the exclusion back into its owner.
    pub fn into_selector(self) -> SoundSelector<'a> {
        let Exclusion { mut owner, exclusion } = self;
        owner.exclusion = Some(Box::new(exclusion));
        owner
    }

    pub fn owner(&self) -> &SoundSelector<'a> {
        &self.owner
    }

    pub fn exclusion(&self) -> &SoundSelector<'a> {
        &self.exclusion
    }

    /// More sounds to exclude.
    pub fn not(mut self, sounds: impl IntoIterator<Item = Phoneme<'a>>) -> Self {
        self.exclusion.sounds.extend(sounds);
        self
    }

    fn map_exclusion(self, f: impl FnOnce(SoundSelector<'a>) -> SoundSelector<'a>) -> Self {
        Exclusion { owner: self.owner, exclusion: f(self.exclusion) }
    }

    pub fn reject_if<F>(self, rule: F) -> Self
    where
        F: Fn(&ContextualPhoneme<'a>, usize, &[ContextualPhoneme<'a>]) -> bool + Send + Sync + 'a,
    {
        self.map_exclusion(|ex| ex.reject_if(rule))
    }

    pub fn before(self, next: SoundSelector<'a>) -> Self {
        self.map_exclusion(|ex| ex.before(next))
    }

    pub fn after(self, prev: SoundSelector<'a>) -> Self {
        self.map_exclusion(|ex| ex.after(prev))
    }

    pub fn before_spec(self, spec: FeatureSpec) -> Self {
        self.map_exclusion(|ex| ex.before_spec(spec))
    }

    pub fn after_spec(self, spec: FeatureSpec) -> Self {
        self.map_exclusion(|ex| ex.after_spec(spec))
    }

    pub fn start_of_syllable(self) -> Self {
        self.map_exclusion(SoundSelector::start_of_syllable)
    }

    pub fn in_stressed_syllable(self) -> Self {
        self.map_exclusion(SoundSelector::in_stressed_syllable)
    }

    pub fn word_initial(self) -> Self {
        self.map_exclusion(SoundSelector::word_initial)
    }

    pub fn word_final(self) -> Self {
        self.map_exclusion(SoundSelector::word_final)
    }

    pub fn add_debugger<F>(self, hook: F) -> Self
    where
        F: Fn(bool, &ContextualPhoneme<'a>, usize, &[ContextualPhoneme<'a>]) + Send + Sync + 'a,
    {
        self.map_exclusion(|ex| ex.add_debugger(hook))
    }

    // Forwarded to the owner.

    pub fn update_phonemes(self, patch: FeatureSpec) -> SoundSelector<'a> {
        self.into_selector().update_phonemes(patch)
    }

    pub fn update_modifiers(self, patch: MarkPatch) -> SoundSelector<'a> {
        self.into_selector().update_modifiers(patch)
    }

    pub fn add_replacer<F>(self, rewrite: F) -> SoundSelector<'a>
    where
        F: Fn(
                ContextualPhoneme<'a>,
                usize,
                &[ContextualPhoneme<'a>],
            ) -> Result<ContextualPhoneme<'a>>
            + Send
            + Sync
            + 'a,
    {
        self.into_selector().add_replacer(rewrite)
    }

    pub fn add_string_replacer<F>(self, rewrite: F) -> SoundSelector<'a>
    where
        F: Fn(String, &ContextualPhoneme<'a>, usize, &[ContextualPhoneme<'a>]) -> String
            + Send
            + Sync
            + 'a,
    {
        self.into_selector().add_string_replacer(rewrite)
    }

    /// The owner's pattern class with the excluded sounds removed, gated by
    /// the exclusion's rules as configured so far.
    pub fn to_pattern_class(&self) -> String {
        let records = self.owner.records_gated_by(Some(&self.exclusion));
        pattern_class(records, &self.exclusion.sounds)
    }
}

fn pattern_class(records: Vec<&PhonemeRecord>, excluded: &[Phoneme<'_>]) -> String {
    let symbols: String = records
        .into_iter()
        .filter(|r| !excluded.iter().any(|p| p.symbol() == r.symbol))
        .map(|r| regex::escape(r.symbol.encode_utf8(&mut [0; 4])))
        .collect();
    if symbols.is_empty() {
        return String::from(r"(?:\b\B)");
    }
    format!("[{}]", symbols)
}

impl<'a> From<Exclusion<'a>> for SoundSelector<'a> {
    fn from(handle: Exclusion<'a>) -> Self {
        handle.into_selector()
    }
}

impl fmt::Debug for Exclusion<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let excluded: String = self.exclusion.sounds.iter().map(|p| p.to_string()).collect();
        f.debug_struct("Exclusion")
            .field("owner", &self.owner.describe())
            .field("excluded", &excluded)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
