//! The phonetic inventory: an ordered, immutable table of canonical phonemes.
//!
//! Order is significant. Reconciliation breaks score ties by taking the
//! earliest record, so reordering the table changes which canonical symbol an
//! off-grid bundle snaps to.
//!
//! Components never reach for a global table; they hold a reference to the
//! [`Inventory`] they were built from. [`Inventory::standard`] is the
//! process-wide English inventory, built on first use.

use std::fmt;

use once_cell::sync::{Lazy, OnceCell};

use crate::features::{
    ConsonantFeatures, Features, FeatureSpec, Height, Manner, PhonemeKind, Place, Position,
    VowelFeatures,
};
use crate::syllable::SyllablePattern;

/// One canonical phoneme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PhonemeRecord {
    pub symbol: char,
    pub features: Features,
}

impl PhonemeRecord {
    pub const fn consonant(
        symbol: char,
        place: Place,
        manner: Manner,
        voiced: bool,
        is_liquid: bool,
        is_obstruent: bool,
    ) -> Self {
        Self {
            symbol,
            features: Features::Consonant(ConsonantFeatures {
                place,
                manner,
                voiced,
                is_liquid,
                is_obstruent,
            }),
        }
    }

    pub const fn vowel(symbol: char, height: Height, position: Position, rounded: bool) -> Self {
        Self {
            symbol,
            features: Features::Vowel(VowelFeatures {
                height,
                position,
                rounded,
                is_obstruent: false,
            }),
        }
    }

    pub fn kind(&self) -> PhonemeKind {
        self.features.kind()
    }
}

/// Ordered table of canonical phonemes, one record per symbol.
pub struct Inventory {
    records: Vec<PhonemeRecord>,
    syllables: OnceCell<SyllablePattern>,
}

impl Inventory {
    /// Builds an inventory. A later record with an already-seen symbol is
    /// dropped so that lookup by symbol stays unambiguous.
    pub fn new(records: impl IntoIterator<Item = PhonemeRecord>) -> Self {
        let mut unique: Vec<PhonemeRecord> = Vec::new();
        for record in records {
            if !unique.iter().any(|r| r.symbol == record.symbol) {
                unique.push(record);
            }
        }
        Self { records: unique, syllables: OnceCell::new() }
    }

    /// The built-in English inventory.
    pub fn standard() -> &'static Inventory {
        &STANDARD
    }

    pub fn records(&self) -> &[PhonemeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, symbol: char) -> Option<&PhonemeRecord> {
        self.records.iter().find(|r| r.symbol == symbol)
    }

    pub fn contains(&self, symbol: char) -> bool {
        self.get(symbol).is_some()
    }

    /// Records whose features satisfy every field set in `spec`.
    pub fn matching(&self, spec: &FeatureSpec) -> impl Iterator<Item = &PhonemeRecord> + '_ {
        let spec = *spec;
        self.records.iter().filter(move |r| spec.matches(&r.features))
    }

    pub fn of_kind(&self, kind: PhonemeKind) -> impl Iterator<Item = &PhonemeRecord> {
        self.records.iter().filter(move |r| r.kind() == kind)
    }

    /// Cached syllable-start pattern for this inventory.
    pub(crate) fn syllables(&self) -> crate::Result<&SyllablePattern> {
        self.syllables.get_or_try_init(|| SyllablePattern::new(self))
    }
}

impl fmt::Debug for Inventory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbols: String = self.records.iter().map(|r| r.symbol).collect();
        f.debug_struct("Inventory").field("symbols", &symbols).finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Standard English inventory
// ─────────────────────────────────────────────────────────────────────────────

use Height::*;
use Manner::*;
use Place::*;
use Position::*;

/// Consonants then vowels, in tie-breaking order.
const STANDARD_RECORDS: &[PhonemeRecord] = &[
    PhonemeRecord::consonant('p', Bilabial, Plosive, false, false, true),
    PhonemeRecord::consonant('t', Alveolar, Plosive, false, false, true),
    PhonemeRecord::consonant('k', Velar, Plosive, false, false, true),
    PhonemeRecord::consonant('f', Labiodental, Fricative, false, false, true),
    PhonemeRecord::consonant('θ', Dental, Fricative, false, false, true),
    PhonemeRecord::consonant('s', Alveolar, Fricative, false, false, true),
    PhonemeRecord::consonant('ʃ', Postalveolar, Fricative, false, false, true),
    PhonemeRecord::consonant('h', Glottal, Fricative, false, false, true),
    PhonemeRecord::consonant('ʔ', Glottal, Plosive, false, false, true),
    PhonemeRecord::consonant('\u{02A7}', Postalveolar, Affricate, false, false, true), // ʧ
    PhonemeRecord::consonant('j', Palatal, Approximant, true, false, false),
    PhonemeRecord::consonant('l', Alveolar, LateralApproximant, true, true, false),
    PhonemeRecord::consonant('b', Bilabial, Plosive, true, false, true),
    PhonemeRecord::consonant('d', Alveolar, Plosive, true, false, true),
    PhonemeRecord::consonant('v', Labiodental, Fricative, true, false, true),
    PhonemeRecord::consonant('\u{0261}', Velar, Plosive, true, false, true), // ɡ
    PhonemeRecord::consonant('ð', Dental, Fricative, true, false, true),
    PhonemeRecord::consonant('z', Alveolar, Fricative, true, false, true),
    PhonemeRecord::consonant('ʒ', Postalveolar, Fricative, true, false, true),
    PhonemeRecord::consonant('ŋ', Velar, Nasal, true, false, false),
    PhonemeRecord::consonant('\u{02A4}', Postalveolar, Affricate, true, false, true), // ʤ
    PhonemeRecord::consonant('m', Bilabial, Nasal, true, false, false),
    PhonemeRecord::consonant('n', Alveolar, Nasal, true, false, false),
    PhonemeRecord::consonant('r', Alveolar, Trill, true, true, true),
    PhonemeRecord::consonant('w', LabialVelar, Approximant, true, false, false),
    PhonemeRecord::consonant('ɹ', Alveolar, Approximant, true, true, true),
    PhonemeRecord::vowel('e', CloseMid, Front, false),
    PhonemeRecord::vowel('ɪ', NearClose, NearFront, false),
    PhonemeRecord::vowel('æ', NearOpen, Front, false),
    PhonemeRecord::vowel('ʌ', OpenMid, Back, false),
    PhonemeRecord::vowel('ʊ', NearClose, NearBack, true),
    PhonemeRecord::vowel('ɒ', Open, Back, true),
    PhonemeRecord::vowel('ə', Mid, Central, false),
    PhonemeRecord::vowel('ɑ', Open, Back, false),
    PhonemeRecord::vowel('i', Close, Front, false),
    PhonemeRecord::vowel('ɔ', OpenMid, Back, true),
    PhonemeRecord::vowel('ɜ', OpenMid, Central, false),
    PhonemeRecord::vowel('u', Close, Back, true),
    PhonemeRecord::vowel('ɛ', OpenMid, Front, false),
    PhonemeRecord::vowel('a', Open, Front, false),
    PhonemeRecord::vowel('o', CloseMid, Back, true),
];

static STANDARD: Lazy<Inventory> = Lazy::new(|| Inventory::new(STANDARD_RECORDS.iter().copied()));

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_not_empty() {
        let inv = Inventory::standard();
        assert_eq!(inv.len(), 41);
        assert_eq!(inv.of_kind(PhonemeKind::Consonant).count(), 26);
        assert_eq!(inv.of_kind(PhonemeKind::Vowel).count(), 15);
    }

    #[test]
    fn test_symbols_unique() {
        let mut seen = std::collections::HashSet::new();
        for r in Inventory::standard().records() {
            assert!(seen.insert(r.symbol), "duplicate symbol {}", r.symbol);
        }
    }

    #[test]
    fn test_lookup() {
        let inv = Inventory::standard();
        assert_eq!(inv.get('t').map(|r| r.kind()), Some(PhonemeKind::Consonant));
        assert_eq!(inv.get('ə').map(|r| r.kind()), Some(PhonemeKind::Vowel));
        assert!(inv.get('g').is_none(), "ASCII g is not the IPA symbol");
        assert!(inv.contains('\u{0261}'));
    }

    #[test]
    fn test_filter_by_spec() {
        let inv = Inventory::standard();
        let spec = FeatureSpec::consonant().manner(Manner::Nasal);
        let nasals: String = inv.matching(&spec).map(|r| r.symbol).collect();
        assert_eq!(nasals, "ŋmn");

        let spec = FeatureSpec::consonant().manner(Manner::Plosive).voiced(false);
        let plosives: String = inv.matching(&spec).map(|r| r.symbol).collect();
        assert_eq!(plosives, "ptkʔ");
    }

    #[test]
    fn test_matching_records_outlive_filter() {
        let inv = Inventory::standard();
        let nasals: Vec<&PhonemeRecord> = {
            let spec = FeatureSpec::consonant().manner(Manner::Nasal);
            inv.matching(&spec).collect()
        };
        assert_eq!(nasals.len(), 3, "got: {:?}", nasals);
    }

    #[test]
    fn test_duplicate_symbols_dropped() {
        let inv = Inventory::new([
            PhonemeRecord::vowel('a', Open, Front, false),
            PhonemeRecord::vowel('a', Close, Back, true),
        ]);
        assert_eq!(inv.len(), 1);
        assert!(matches!(
            inv.get('a').map(|r| r.features),
            Some(Features::Vowel(VowelFeatures { height: Open, .. }))
        ));
    }
}
