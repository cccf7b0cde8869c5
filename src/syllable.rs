//! Syllable-start detection.
//!
//! The pattern is assembled from sound selectors over the inventory it is
//! built for: every character class below is a selector's pattern class, so
//! a custom inventory gets a pattern over its own symbols.
//!
//! A syllable starts where an optional onset is followed by a nucleus. Onsets
//! cover single consonants, s-clusters, obstruent + approximant clusters, the
//! glide cluster C+j before u/ə, and the empty onset right after a hiatus dot
//! or a space. Each onset may carry diacritics and aspiration; each nucleus
//! vowel may carry diacritics and one suprasegmental mark.
//!
//! Coda shapes are compiled alongside for completeness of the phonotactic
//! model; they never gate detection.

use fancy_regex::Regex;
use once_cell::sync::Lazy;

use crate::error::{PhonoError, Result};
use crate::features::{FeatureSpec, Manner};
use crate::inventory::Inventory;
use crate::marks::{Boundary, Diacritic, Mark};
use crate::phoneme::Phoneme;
use crate::selector::SoundSelector;

// ─────────────────────────────────────────────────────────────────────────────
// Mark classes
// ─────────────────────────────────────────────────────────────────────────────

/// `[…]` of every combining diacritic.
static DIACRITICS: Lazy<String> =
    Lazy::new(|| format!("[{}]", Diacritic::ALL.iter().map(|d| d.symbol()).collect::<String>()));

/// `[…]` of every suprasegmental mark.
static MARKS: Lazy<String> =
    Lazy::new(|| format!("[{}]", Mark::ALL.iter().map(|m| m.symbol()).collect::<String>()));

// ─────────────────────────────────────────────────────────────────────────────
// Class helpers
// ─────────────────────────────────────────────────────────────────────────────

struct Classes<'a> {
    inventory: &'a Inventory,
}

impl<'a> Classes<'a> {
    fn of(&self, spec: FeatureSpec) -> String {
        SoundSelector::from_spec(self.inventory, spec).to_pattern_class()
    }

    /// `spec` minus `excluded` (symbols the inventory lacks are ignored).
    fn except(&self, spec: FeatureSpec, excluded: &str) -> String {
        let sounds = excluded.chars().filter_map(|c| Phoneme::new(self.inventory, c).ok());
        SoundSelector::from_spec(self.inventory, spec).not(sounds).to_pattern_class()
    }

    fn consonant(&self) -> String {
        self.of(FeatureSpec::consonant())
    }

    fn vowel(&self) -> String {
        self.of(FeatureSpec::vowel())
    }

    fn manner(&self, manner: Manner) -> String {
        self.of(FeatureSpec::consonant().manner(manner))
    }

    fn voiced(&self, manner: Manner, voiced: bool) -> String {
        self.of(FeatureSpec::consonant().manner(manner).voiced(voiced))
    }
}

fn literal(symbol: char) -> String {
    regex::escape(symbol.encode_utf8(&mut [0; 4]))
}

// ─────────────────────────────────────────────────────────────────────────────
// Shapes
// ─────────────────────────────────────────────────────────────────────────────

fn onset_shapes(c: &Classes<'_>) -> Vec<String> {
    use Manner::*;

    let s = literal('s');
    let r = format!("[{}]", literal('r'));
    let vl_plosive = c.voiced(Plosive, false);
    let vl_fricative = c.voiced(Fricative, false);
    let approximant = c.manner(Approximant);
    let approximant_no_j = c.except(FeatureSpec::consonant().manner(Approximant), "j");

    vec![
        format!("{s}{vl_plosive}{approximant}"),
        format!("{s}{vl_plosive}{r}"),
        format!("{s}{}{approximant}", c.manner(Nasal)),
        format!("{s}{vl_fricative}{approximant}"),
        format!("{s}{vl_fricative}{r}"),
        format!("{s}{vl_plosive}"),
        format!("{s}{}", c.except(FeatureSpec::consonant().manner(Nasal), "ŋ")),
        format!("{}{approximant_no_j}", c.manner(Plosive)),
        format!("{}{r}", c.manner(Plosive)),
        format!("{vl_fricative}{approximant_no_j}"),
        format!(
            "{}{}(?:[{}{}])",
            c.except(FeatureSpec::consonant(), "rw"),
            literal('j'),
            literal('u'),
            literal('ə')
        ),
        c.except(FeatureSpec::consonant(), "ŋ"),
        format!("(?<={})", literal(Boundary::Hiatus.symbol())),
        format!("(?<={})", literal(Boundary::Space.symbol())),
    ]
    .into_iter()
    .map(|shape| format!("(?:{}{}*{}?)", shape, *DIACRITICS, Mark::Aspirated.symbol()))
    .collect()
}

fn nucleus_shapes(c: &Classes<'_>) -> Vec<String> {
    let vowel = format!("{}{}*{}?", c.vowel(), *DIACRITICS, *MARKS);
    vec![format!("(?:(?:{vowel}){{2}})"), format!("(?:{vowel})")]
}

fn coda_shapes(c: &Classes<'_>) -> Vec<String> {
    use Manner::*;

    let r = literal('r');
    let consonant = c.consonant();
    let plosive = c.manner(Plosive);
    let fricative = c.manner(Fricative);
    let nasal = c.manner(Nasal);
    let lateral = c.manner(LateralApproximant);
    let affricate = c.manner(Affricate);

    vec![
        format!("{plosive}{fricative}"),
        format!("{lateral}{plosive}"),
        format!("{r}{affricate}"),
        format!("{lateral}{fricative}"),
        format!("{r}{fricative}"),
        format!("{lateral}{nasal}"),
        format!("{r}{nasal}"),
        format!("{lateral}{consonant}{{2,3}}"),
        format!("{r}{lateral}"),
        format!("{nasal}{plosive}"),
        format!("{nasal}{fricative}"),
        format!("{}{}", c.voiced(Fricative, false), c.voiced(Plosive, false)),
        format!("{}{}", c.voiced(Fricative, true), c.voiced(Plosive, true)),
        format!("{}{{2,3}}", c.voiced(Fricative, false)),
        format!("{}{{2}}", c.voiced(Plosive, false)),
        format!("{nasal}{plosive}{{1,2}}"),
        format!("{nasal}{plosive}{fricative}{{1,2}}"),
        format!("{r}{consonant}{{2}}"),
        c.except(FeatureSpec::consonant(), "hwj"),
        format!("{}{{3,4}}", c.of(FeatureSpec::new().obstruent(true))),
    ]
    .into_iter()
    .map(|shape| format!("(?:{})", shape))
    .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// SyllablePattern
// ─────────────────────────────────────────────────────────────────────────────

/// Compiled phonotactic patterns of one inventory.
#[derive(Debug)]
pub struct SyllablePattern {
    start: Regex,
    coda: Regex,
}

impl SyllablePattern {
    pub fn new(inventory: &Inventory) -> Result<Self> {
        let classes = Classes { inventory };
        let start = format!(
            "(?:{})?(?:{})",
            onset_shapes(&classes).join("|"),
            nucleus_shapes(&classes).join("|")
        );
        let coda = format!("(?:{})$", coda_shapes(&classes).join("|"));
        Ok(Self {
            start: Regex::new(&start).map_err(Box::new)?,
            coda: Regex::new(&coda).map_err(Box::new)?,
        })
    }

    /// Source of the syllable-start pattern.
    pub fn start_pattern(&self) -> &str {
        self.start.as_str()
    }

    /// Source of the coda pattern (anchored at the end of the input).
    pub fn coda_pattern(&self) -> &str {
        self.coda.as_str()
    }

    /// Byte offsets at which a syllable starts, in ascending order.
    pub fn start_offsets(&self, text: &str) -> Result<Vec<usize>> {
        self.start
            .find_iter(text)
            .map(|m| m.map(|m| m.start()).map_err(|e| PhonoError::from(Box::new(e))))
            .collect()
    }

    /// Whether `text` ends in one of the coda shapes.
    pub fn ends_in_coda(&self, text: &str) -> Result<bool> {
        self.coda.is_match(text).map_err(|e| PhonoError::from(Box::new(e)))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern() -> SyllablePattern {
        SyllablePattern::new(Inventory::standard()).unwrap()
    }

    fn starts(text: &str) -> Vec<usize> {
        pattern().start_offsets(text).unwrap()
    }

    /// Char offsets are easier to read than byte offsets in assertions.
    fn char_starts(text: &str) -> Vec<usize> {
        let bytes = starts(text);
        text.char_indices()
            .enumerate()
            .filter(|(_, (b, _))| bytes.contains(b))
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn test_pattern_compiles_for_standard_inventory() {
        let p = pattern();
        assert!(!p.start_pattern().is_empty());
        assert!(!p.coda_pattern().is_empty());
    }

    #[test]
    fn test_single_syllable() {
        assert_eq!(char_starts("kæt"), vec![0]);
    }

    #[test]
    fn test_hiatus_starts_a_syllable() {
        // ˈ k æ t . ə ʃ
        assert_eq!(char_starts("ˈkæt.əʃ"), vec![1, 5]);
    }

    #[test]
    fn test_space_starts_a_syllable() {
        assert_eq!(char_starts("ə ə"), vec![0, 2]);
    }

    #[test]
    fn test_s_cluster_is_one_onset() {
        assert_eq!(char_starts("stɹit"), vec![0]);
    }

    #[test]
    fn test_consonant_vowel_pairs() {
        assert_eq!(char_starts("bənænə"), vec![0, 2, 4]);
    }

    #[test]
    fn test_marked_nucleus() {
        assert_eq!(char_starts("tʰaːta"), vec![0, 4]);
    }

    #[test]
    fn test_excluded_velar_nasal_class() {
        let p = pattern();
        assert!(p.start_pattern().contains("s[mn]"), "got: {}", p.start_pattern());
    }

    #[test]
    fn test_codas() {
        let p = pattern();
        assert!(p.ends_in_coda("hænd").unwrap());
        assert!(p.ends_in_coda("mɪlk").unwrap());
        assert!(!p.ends_in_coda("kæ").unwrap());
    }

    #[test]
    fn test_custom_inventory_without_velar_nasal() {
        use crate::features::{Height, Place, Position};
        use crate::inventory::PhonemeRecord;

        let inv = Inventory::new([
            PhonemeRecord::consonant('t', Place::Alveolar, Manner::Plosive, false, false, true),
            PhonemeRecord::consonant('n', Place::Alveolar, Manner::Nasal, true, false, false),
            PhonemeRecord::vowel('a', Height::Open, Position::Front, false),
        ]);
        let p = SyllablePattern::new(&inv).unwrap();
        assert_eq!(p.start_offsets("tana").unwrap(), vec![0, 2]);
    }
}
