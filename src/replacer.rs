//! Rule cascades over transcriptions.
//!
//! [`apply_rule_to_ipa`] runs one rule over a transcription: the text is
//! tokenised, every phoneme token is rewritten against the unmodified
//! phoneme-only sequence, and literals pass through. A [`Replacer`] chains
//! rules so that each rule sees the previous rule's output.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::selector::SoundSelector;
use crate::tokenize::{tokenize, Token};

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for a rule cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReplacerConfig {
    /// Pass characters outside the transcription alphabet through instead of
    /// dropping them.
    pub keep_unknown: bool,
    /// Emit a `debug` event for every rule applied.
    pub trace_rules: bool,
    /// Only log rules that changed the text.
    pub skip_unchanged: bool,
}

impl Default for ReplacerConfig {
    fn default() -> Self {
        Self { keep_unknown: false, trace_rules: false, skip_unchanged: true }
    }
}

impl ReplacerConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Single rule
// ─────────────────────────────────────────────────────────────────────────────

/// Applies `rule` once over `text`. Unknown characters are dropped.
pub fn apply_rule_to_ipa(text: &str, rule: &SoundSelector<'_>) -> Result<String> {
    apply_rule(text, rule, false)
}

fn apply_rule(text: &str, rule: &SoundSelector<'_>, keep_unknown: bool) -> Result<String> {
    let utterance = tokenize(rule.inventory(), text, keep_unknown)?;
    let sequence = utterance.phonemes();

    let mut out = String::with_capacity(text.len());
    let mut index = 0;
    for token in utterance.tokens() {
        match token {
            Token::Literal(c) => out.push(*c),
            Token::Phoneme(p) => {
                out.push_str(&rule.execute_on(p, index, &sequence)?);
                index += 1;
            }
        }
    }
    Ok(out)
}

// ─────────────────────────────────────────────────────────────────────────────
// Cascade
// ─────────────────────────────────────────────────────────────────────────────

/// An ordered list of rules applied left to right.
#[derive(Debug)]
pub struct Replacer<'a> {
    rules: Vec<SoundSelector<'a>>,
    config: ReplacerConfig,
}

impl<'a> Replacer<'a> {
    pub fn new(rules: impl IntoIterator<Item = SoundSelector<'a>>) -> Self {
        Self::with_config(rules, ReplacerConfig::default())
    }

    pub fn with_config(
        rules: impl IntoIterator<Item = SoundSelector<'a>>,
        config: ReplacerConfig,
    ) -> Self {
        Self { rules: rules.into_iter().collect(), config }
    }

    /// Appends a rule to the end of the cascade.
    pub fn then(mut self, rule: impl Into<SoundSelector<'a>>) -> Self {
        self.rules.push(rule.into());
        self
    }

    pub fn rules(&self) -> &[SoundSelector<'a>] {
        &self.rules
    }

    pub fn config(&self) -> &ReplacerConfig {
        &self.config
    }

    /// Runs every rule in order, each on the previous rule's output.
    pub fn apply_to_ipa(&self, text: &str) -> Result<String> {
        self.rules.iter().enumerate().try_fold(text.to_string(), |input, (step, rule)| {
            let output = apply_rule(&input, rule, self.config.keep_unknown)?;
            if self.config.trace_rules && !(self.config.skip_unchanged && output == input) {
                debug!(step, rule = %rule.describe(), %input, %output, "rule applied");
            }
            Ok(output)
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{FeatureSpec, Manner};
    use crate::inventory::Inventory;
    use crate::phoneme::Phoneme;

    fn inv() -> &'static Inventory {
        Inventory::standard()
    }

    fn final_voicing() -> SoundSelector<'static> {
        let voiceless_plosive = FeatureSpec::consonant().manner(Manner::Plosive).voiced(false);
        SoundSelector::from_spec(inv(), voiceless_plosive)
            .word_final()
            .update_phonemes(FeatureSpec::new().voiced(true))
            .named("final voicing")
    }

    #[test]
    fn test_config_defaults() {
        let cfg = ReplacerConfig::default();
        assert!(!cfg.keep_unknown);
        assert!(!cfg.trace_rules);
        assert!(cfg.skip_unchanged);
    }

    #[test]
    fn test_config_from_json_fills_missing_fields() {
        let cfg = ReplacerConfig::from_json(r#"{"keepUnknown": true}"#).unwrap();
        assert_eq!(cfg, ReplacerConfig { keep_unknown: true, ..ReplacerConfig::default() });
        assert!(ReplacerConfig::from_json("[1, 2]").is_err());
    }

    #[test]
    fn test_single_rule() {
        assert_eq!(apply_rule_to_ipa("kæt", &final_voicing()).unwrap(), "kæd");
        assert_eq!(apply_rule_to_ipa("kæt tæp", &final_voicing()).unwrap(), "kæd tæb");
    }

    #[test]
    fn test_literals_pass_through() {
        assert_eq!(apply_rule_to_ipa("ˈkæt.əp", &final_voicing()).unwrap(), "ˈkæt.əb");
    }

    #[test]
    fn test_rule_sees_unmodified_sequence() {
        // the first t is followed by a t in the input, the second is not
        let rule = SoundSelector::from_symbols(inv(), "t")
            .unwrap()
            .before(SoundSelector::from_symbols(inv(), "t").unwrap())
            .update_phonemes(FeatureSpec::new().voiced(true));
        assert_eq!(apply_rule_to_ipa("ætta", &rule).unwrap(), "ædta");
    }

    #[test]
    fn test_unknown_characters_follow_config() {
        let dropping = Replacer::new([final_voicing()]);
        assert_eq!(dropping.apply_to_ipa("kæt!").unwrap(), "kæd");

        let keeping = Replacer::with_config(
            [final_voicing()],
            ReplacerConfig { keep_unknown: true, ..ReplacerConfig::default() },
        );
        assert_eq!(keeping.apply_to_ipa("kæt!").unwrap(), "kæd!");
    }

    #[test]
    fn test_empty_cascade_is_identity() {
        let replacer = Replacer::new(Vec::new());
        assert_eq!(replacer.apply_to_ipa("kæt").unwrap(), "kæt");
        assert!(replacer.rules().is_empty());
    }

    #[test]
    fn test_then_accepts_exclusion_handles() {
        let replacer = Replacer::new([]).then(
            SoundSelector::from_spec(inv(), FeatureSpec::vowel())
                .update_phonemes(FeatureSpec::new().rounded(true))
                .not([Phoneme::new(inv(), 'ə').unwrap()])
                .reject_if(|p, _, _| p.symbol() == 'ə'),
        );
        assert_eq!(replacer.rules().len(), 1);
        assert_eq!(replacer.apply_to_ipa("ə").unwrap(), "ə̹");
        assert_eq!(replacer.apply_to_ipa("i").unwrap(), "i");
    }
}
