//! Phonemes as "nearest canonical record + diacritic residue".
//!
//! A [`Phoneme`] never stores an arbitrary feature bundle. It stores the
//! canonical record it currently snaps to plus the diacritics that encode the
//! remaining difference. Two pure functions connect the two views:
//!
//! * [`perturb`]: canonical features + diacritics → desired bundle
//! * [`reconcile`]: desired bundle → (nearest record, residual diacritics)
//!
//! Every mutation goes through exactly one `perturb` → edit → `reconcile`
//! round, so the invariant holds after any call that returns `Ok`.

use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::error::{PhonoError, Result};
use crate::features::{
    DesiredFeatures, FeatureSpec, Features, Graded, Height, Manner, PhonemeKind, Place, Position,
};
use crate::inventory::{Inventory, PhonemeRecord};
use crate::marks::{Diacritic, Length, Mark, MarkPatch, MarkSet, MarkStatus};

// ─────────────────────────────────────────────────────────────────────────────
// perturb / reconcile
// ─────────────────────────────────────────────────────────────────────────────

/// Applies `diacritics` to `features`.
///
/// Rounding and voicing diacritics set the value outright; the graded ones
/// move one ordinal step (Advanced/Raised −1, Retracted/Lowered +1).
/// Diacritics that have no meaning for the kind are skipped.
pub fn perturb(
    features: &Features,
    diacritics: impl IntoIterator<Item = Diacritic>,
) -> DesiredFeatures {
    let mut desired = features.desired();
    for diacritic in diacritics {
        match (&mut desired, diacritic) {
            (DesiredFeatures::Consonant { voiced, .. }, Diacritic::Voiced) => *voiced = true,
            (DesiredFeatures::Consonant { voiced, .. }, Diacritic::Voiceless) => *voiced = false,
            (DesiredFeatures::Consonant { place, .. }, Diacritic::Retracted) => step(place, 1),
            (DesiredFeatures::Consonant { place, .. }, Diacritic::Advanced) => step(place, -1),
            (DesiredFeatures::Vowel { rounded, .. }, Diacritic::Rounded) => *rounded = true,
            (DesiredFeatures::Vowel { rounded, .. }, Diacritic::Unrounded) => *rounded = false,
            (DesiredFeatures::Vowel { position, .. }, Diacritic::Retracted) => step(position, 1),
            (DesiredFeatures::Vowel { position, .. }, Diacritic::Advanced) => step(position, -1),
            (DesiredFeatures::Vowel { height, .. }, Diacritic::Lowered) => step(height, 1),
            (DesiredFeatures::Vowel { height, .. }, Diacritic::Raised) => step(height, -1),
            _ => {}
        }
    }
    desired
}

fn step(ordinal: &mut i8, by: i8) {
    *ordinal = ordinal.saturating_add(by);
}

/// Snaps `desired` onto the nearest record of `inventory`.
///
/// Candidates are the records of the same kind that are adjacent on the
/// graded dimensions (consonants: place within one step and identical
/// manner; vowels: height and position each within one step). Each candidate
/// scores one point per reconciled field it matches exactly; the highest
/// score wins and ties go to the earliest record. The returned diacritics
/// describe every field where the winner differs from `desired`.
///
/// Returns `None` when no record is adjacent.
pub fn reconcile<'a>(
    inventory: &'a Inventory,
    desired: &DesiredFeatures,
) -> Option<(&'a PhonemeRecord, MarkSet<Diacritic>)> {
    let mut best: Option<(&'a PhonemeRecord, usize)> = None;
    for record in inventory.records() {
        let Some(score) = score(&record.features, desired) else {
            continue;
        };
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((record, score));
        }
    }
    let (record, _) = best?;
    Some((record, residue(&record.features, desired)))
}

/// Agreement score of an adjacent candidate, `None` when not adjacent.
fn score(candidate: &Features, desired: &DesiredFeatures) -> Option<usize> {
    match (*candidate, *desired) {
        (Features::Consonant(c), DesiredFeatures::Consonant { place, manner, voiced }) => {
            if c.place.ordinal().abs_diff(place) > 1 || c.manner != manner {
                return None;
            }
            Some(
                usize::from(c.place.ordinal() == place)
                    + usize::from(c.manner == manner)
                    + usize::from(c.voiced == voiced),
            )
        }
        (Features::Vowel(v), DesiredFeatures::Vowel { height, position, rounded }) => {
            if v.height.ordinal().abs_diff(height) > 1
                || v.position.ordinal().abs_diff(position) > 1
            {
                return None;
            }
            Some(
                usize::from(v.rounded == rounded)
                    + usize::from(v.height.ordinal() == height)
                    + usize::from(v.position.ordinal() == position),
            )
        }
        _ => None,
    }
}

fn residue(chosen: &Features, desired: &DesiredFeatures) -> MarkSet<Diacritic> {
    let mut diacritics = MarkSet::new();
    match (*chosen, *desired) {
        (Features::Consonant(c), DesiredFeatures::Consonant { place, voiced, .. }) => {
            if c.place.ordinal() != place {
                let actual = c.place.ordinal();
                diacritics.insert(shift(place, actual, Diacritic::Retracted, Diacritic::Advanced));
            }
            if c.voiced != voiced {
                diacritics.insert(if voiced { Diacritic::Voiced } else { Diacritic::Voiceless });
            }
        }
        (Features::Vowel(v), DesiredFeatures::Vowel { height, position, rounded }) => {
            if v.rounded != rounded {
                diacritics.insert(if rounded { Diacritic::Rounded } else { Diacritic::Unrounded });
            }
            if v.height.ordinal() != height {
                let actual = v.height.ordinal();
                diacritics.insert(shift(height, actual, Diacritic::Lowered, Diacritic::Raised));
            }
            if v.position.ordinal() != position {
                let actual = v.position.ordinal();
                let diacritic = shift(position, actual, Diacritic::Retracted, Diacritic::Advanced);
                diacritics.insert(diacritic);
            }
        }
        _ => {}
    }
    diacritics
}

fn shift(desired: i8, actual: i8, up: Diacritic, down: Diacritic) -> Diacritic {
    if desired > actual {
        up
    } else {
        down
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Phoneme
// ─────────────────────────────────────────────────────────────────────────────

/// A canonical record plus diacritic residue and suprasegmental marks.
#[derive(Clone)]
pub struct Phoneme<'a> {
    inventory: &'a Inventory,
    record: &'a PhonemeRecord,
    diacritics: MarkSet<Diacritic>,
    marks: MarkSet<Mark>,
}

impl<'a> Phoneme<'a> {
    /// The bare canonical phoneme for `symbol`.
    pub fn new(inventory: &'a Inventory, symbol: char) -> Result<Self> {
        let record = inventory
            .get(symbol)
            .ok_or_else(|| PhonoError::UnknownSymbol(symbol.to_string()))?;
        Ok(Self { inventory, record, diacritics: MarkSet::new(), marks: MarkSet::new() })
    }

    /// The bare phoneme for a record of `inventory`.
    pub fn from_record(inventory: &'a Inventory, record: &'a PhonemeRecord) -> Self {
        Self { inventory, record, diacritics: MarkSet::new(), marks: MarkSet::new() }
    }

    /// `symbol` with the given diacritics (reconciled) and marks.
    pub fn with_marks(
        inventory: &'a Inventory,
        symbol: char,
        diacritics: impl IntoIterator<Item = Diacritic>,
        marks: impl IntoIterator<Item = Mark>,
    ) -> Result<Self> {
        let mut phoneme = Self::new(inventory, symbol)?;
        phoneme.set_diacritics(diacritics)?;
        phoneme.set_marks(marks);
        Ok(phoneme)
    }

    /// Builds a phoneme by reconciling an arbitrary bundle.
    pub fn from_features(inventory: &'a Inventory, desired: DesiredFeatures) -> Result<Self> {
        let (record, diacritics) = reconcile(inventory, &desired).ok_or(PhonoError::NoCandidate {
            kind: desired.kind(),
            symbol: String::new(),
        })?;
        Ok(Self { inventory, record, diacritics, marks: MarkSet::new() })
    }

    pub fn inventory(&self) -> &'a Inventory {
        self.inventory
    }

    pub fn symbol(&self) -> char {
        self.record.symbol
    }

    pub fn record(&self) -> &'a PhonemeRecord {
        self.record
    }

    /// Features of the canonical record this phoneme currently snaps to.
    pub fn features(&self) -> &'a Features {
        &self.record.features
    }

    pub fn kind(&self) -> PhonemeKind {
        self.record.kind()
    }

    /// The bundle this phoneme stands for: record features moved by the
    /// diacritics.
    pub fn desired_features(&self) -> DesiredFeatures {
        perturb(&self.record.features, self.diacritics.iter())
    }

    pub fn diacritics(&self) -> &MarkSet<Diacritic> {
        &self.diacritics
    }

    pub fn marks(&self) -> &MarkSet<Mark> {
        &self.marks
    }

    pub fn mark_status(&self) -> MarkStatus {
        MarkStatus::from_marks(&self.marks)
    }

    fn snap(&mut self, desired: DesiredFeatures) -> Result<&mut Self> {
        let (record, diacritics) =
            reconcile(self.inventory, &desired).ok_or_else(|| PhonoError::NoCandidate {
                kind: desired.kind(),
                symbol: self.to_string(),
            })?;
        self.record = record;
        self.diacritics = diacritics;
        Ok(self)
    }

    /// Writes `patch` into the desired bundle and re-snaps. Fields that do
    /// not belong to this phoneme's kind are ignored.
    pub fn update_features(&mut self, patch: &FeatureSpec) -> Result<&mut Self> {
        let mut desired = self.desired_features();
        desired.apply(patch);
        self.snap(desired)
    }

    /// Replaces the diacritics. The stored set is the residue of reconciling
    /// the perturbed bundle, which need not be the set passed in.
    pub fn set_diacritics(
        &mut self,
        diacritics: impl IntoIterator<Item = Diacritic>,
    ) -> Result<&mut Self> {
        let desired = perturb(&self.record.features, diacritics);
        self.snap(desired)
    }

    pub fn add_diacritic(&mut self, diacritic: Diacritic) -> Result<&mut Self> {
        let mut diacritics = self.diacritics.clone();
        diacritics.insert(diacritic);
        self.set_diacritics(diacritics.iter())
    }

    pub fn set_marks(&mut self, marks: impl IntoIterator<Item = Mark>) -> &mut Self {
        self.marks = marks.into_iter().collect();
        self
    }

    pub fn add_mark(&mut self, mark: Mark) -> &mut Self {
        self.marks.insert(mark);
        self
    }

    pub fn update_marks(&mut self, patch: &MarkPatch) -> &mut Self {
        patch.apply_to(&mut self.marks);
        self
    }

    fn update_if(&mut self, kind: PhonemeKind, patch: FeatureSpec) -> Result<&mut Self> {
        if self.kind() != kind {
            return Ok(self);
        }
        self.update_features(&patch)
    }

    pub fn set_voiced(&mut self, voiced: bool) -> Result<&mut Self> {
        self.update_if(PhonemeKind::Consonant, FeatureSpec::new().voiced(voiced))
    }

    pub fn set_place(&mut self, place: Place) -> Result<&mut Self> {
        self.update_if(PhonemeKind::Consonant, FeatureSpec::new().place(place))
    }

    pub fn set_manner(&mut self, manner: Manner) -> Result<&mut Self> {
        self.update_if(PhonemeKind::Consonant, FeatureSpec::new().manner(manner))
    }

    pub fn set_height(&mut self, height: Height) -> Result<&mut Self> {
        self.update_if(PhonemeKind::Vowel, FeatureSpec::new().height(height))
    }

    pub fn set_position(&mut self, position: Position) -> Result<&mut Self> {
        self.update_if(PhonemeKind::Vowel, FeatureSpec::new().position(position))
    }

    pub fn set_rounded(&mut self, rounded: bool) -> Result<&mut Self> {
        self.update_if(PhonemeKind::Vowel, FeatureSpec::new().rounded(rounded))
    }

    pub fn set_length(&mut self, length: Length) -> &mut Self {
        self.update_marks(&MarkPatch::new().length(length))
    }

    pub fn set_nasal(&mut self, nasalized: bool) -> &mut Self {
        self.update_marks(&MarkPatch::new().nasalized(nasalized))
    }

    pub fn set_aspirated(&mut self, aspirated: bool) -> &mut Self {
        self.update_marks(&MarkPatch::new().aspirated(aspirated))
    }

    /// Long → half-long → default → short.
    pub fn shorten(&mut self) -> &mut Self {
        let length = self.mark_status().length.shortened();
        self.set_length(length)
    }

    /// Same symbol, and the same diacritics and marks in any order.
    pub fn is_equal(&self, other: &Phoneme<'_>) -> bool {
        self.symbol() == other.symbol()
            && self.diacritics == other.diacritics
            && self.marks == other.marks
    }

    /// Same symbol; diacritics and marks are ignored.
    pub fn is_fuzzy_equal(&self, other: &Phoneme<'_>) -> bool {
        self.symbol() == other.symbol()
    }

    /// Every field set in `spec` equals this phoneme's canonical features.
    pub fn is_like(&self, spec: &FeatureSpec) -> bool {
        spec.matches(self.features())
    }

    /// Canonical features are equal, whatever the symbols.
    pub fn is_equivalent(&self, other: &Phoneme<'_>) -> bool {
        self.features() == other.features()
    }

    pub fn contextualize(self, context: SyllableContext) -> ContextualPhoneme<'a> {
        ContextualPhoneme { phoneme: self, context }
    }
}

impl PartialEq for Phoneme<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other)
    }
}

impl fmt::Display for Phoneme<'_> {
    /// Base symbol, then diacritics, then marks, each in insertion order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use fmt::Write;

        f.write_char(self.symbol())?;
        for d in self.diacritics.iter() {
            f.write_char(d.symbol())?;
        }
        for m in self.marks.iter() {
            f.write_char(m.symbol())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Phoneme<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Phoneme({})", self)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Contextualised phoneme
// ─────────────────────────────────────────────────────────────────────────────

/// Where a phoneme sits in the utterance being rewritten.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SyllableContext {
    pub stressed: bool,
    pub position_in_syllable: usize,
    pub syllable_index: usize,
    pub word_index: usize,
}

/// A phoneme plus its syllable context. Only lives for one rewrite pass.
#[derive(Clone, PartialEq)]
pub struct ContextualPhoneme<'a> {
    phoneme: Phoneme<'a>,
    pub context: SyllableContext,
}

impl<'a> ContextualPhoneme<'a> {
    pub fn new(phoneme: Phoneme<'a>, context: SyllableContext) -> Self {
        Self { phoneme, context }
    }

    pub fn phoneme(&self) -> &Phoneme<'a> {
        &self.phoneme
    }

    pub fn into_phoneme(self) -> Phoneme<'a> {
        self.phoneme
    }
}

impl<'a> Deref for ContextualPhoneme<'a> {
    type Target = Phoneme<'a>;

    fn deref(&self) -> &Self::Target {
        &self.phoneme
    }
}

impl DerefMut for ContextualPhoneme<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.phoneme
    }
}

impl fmt::Display for ContextualPhoneme<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.phoneme, f)
    }
}

impl fmt::Debug for ContextualPhoneme<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextualPhoneme")
            .field("phoneme", &self.phoneme.to_string())
            .field("context", &self.context)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn inv() -> &'static Inventory {
        Inventory::standard()
    }

    fn ph(symbol: char) -> Phoneme<'static> {
        Phoneme::new(inv(), symbol).unwrap()
    }

    #[test]
    fn test_unknown_symbol_is_an_error() {
        let err = Phoneme::new(inv(), 'x').unwrap_err();
        assert!(matches!(err, PhonoError::UnknownSymbol(ref s) if s == "x"), "got: {}", err);
    }

    #[test]
    fn test_out_of_range_ordinals_have_no_candidate() {
        let far =
            DesiredFeatures::Consonant { place: i8::MIN, manner: Manner::Plosive, voiced: false };
        let err = Phoneme::from_features(inv(), far).unwrap_err();
        assert!(matches!(err, PhonoError::NoCandidate { .. }), "got: {}", err);

        let far = DesiredFeatures::Vowel { height: i8::MAX, position: i8::MIN, rounded: true };
        assert!(Phoneme::from_features(inv(), far).is_err());

        // stepping past the edge saturates instead of wrapping
        let mut height = i8::MAX;
        step(&mut height, 1);
        assert_eq!(height, i8::MAX);
    }

    #[test]
    fn test_reconcile_canonical_is_identity() {
        for record in inv().records() {
            let (chosen, diacritics) = reconcile(inv(), &record.features.desired()).unwrap();
            assert_eq!(chosen.symbol, record.symbol);
            assert!(diacritics.is_empty(), "{} got {:?}", record.symbol, diacritics);
        }
    }

    #[test]
    fn test_voicing_snaps_to_partner() {
        let mut t = ph('t');
        t.set_voiced(true).unwrap();
        assert_eq!(t.to_string(), "d");
        assert!(t.diacritics().is_empty());
    }

    #[test]
    fn test_lowered_e_ties_with_open_mid_and_keeps_e() {
        // Both e and ɛ are adjacent to a mid front unrounded target and score
        // two; e comes first in the inventory.
        let mut e = ph('e');
        e.add_diacritic(Diacritic::Lowered).unwrap();
        assert_eq!(e.symbol(), 'e');
        assert_eq!(e.diacritics().iter().collect::<Vec<_>>(), vec![Diacritic::Lowered]);
        assert_eq!(e.to_string(), "e\u{031E}");
    }

    #[test]
    fn test_height_patch_reaches_open_mid() {
        let mut e = ph('e');
        e.set_height(Height::OpenMid).unwrap();
        assert_eq!(e.symbol(), 'ɛ');
        assert!(e.diacritics().is_empty());
    }

    #[test]
    fn test_voicing_without_partner_leaves_residue() {
        // No voiceless nasal exists: m stays m and gains the voiceless mark.
        let mut m = ph('m');
        m.set_voiced(false).unwrap();
        assert_eq!(m.to_string(), "m\u{0325}");
        assert_eq!(
            m.desired_features(),
            DesiredFeatures::Consonant { place: 0, manner: Manner::Nasal, voiced: false }
        );
    }

    #[test]
    fn test_retracted_beyond_neighbour_moves_identity() {
        // Retracting the dental θ lands on alveolar, where s is canonical.
        let mut th = ph('θ');
        th.add_diacritic(Diacritic::Retracted).unwrap();
        assert_eq!(th.to_string(), "s");
    }

    #[test]
    fn test_advancing_bilabial_goes_off_grid() {
        let mut p = ph('p');
        p.add_diacritic(Diacritic::Advanced).unwrap();
        assert_eq!(p.symbol(), 'p');
        assert_eq!(p.diacritics().iter().collect::<Vec<_>>(), vec![Diacritic::Advanced]);
    }

    #[test]
    fn test_patch_keeps_residue() {
        let mut m = ph('m');
        m.set_voiced(false).unwrap();
        m.update_features(&FeatureSpec::new()).unwrap();
        assert_eq!(m.to_string(), "m\u{0325}");
    }

    #[test]
    fn test_inapplicable_fields_are_noops() {
        let mut a = ph('a');
        a.set_voiced(false).unwrap().set_manner(Manner::Nasal).unwrap();
        assert_eq!(a.to_string(), "a");

        let mut t = ph('t');
        t.update_features(&FeatureSpec::new().rounded(true).height(Height::Close)).unwrap();
        assert_eq!(t.to_string(), "t");
    }

    #[test]
    fn test_no_candidate_is_reported_and_state_kept() {
        let mut m = ph('m');
        let err = m.set_place(Place::Glottal).unwrap_err();
        assert!(matches!(err, PhonoError::NoCandidate { kind: PhonemeKind::Consonant, .. }));
        assert_eq!(m.to_string(), "m");
    }

    #[test]
    fn test_rendering_order() {
        let mut m = ph('m');
        m.add_mark(Mark::Long);
        m.set_voiced(false).unwrap();
        assert_eq!(m.to_string(), "m\u{0325}ː");
    }

    #[test]
    fn test_marks_round_trip_through_status() {
        let mut a = ph('a');
        a.set_length(Length::Long).set_nasal(true);
        assert_eq!(
            a.mark_status(),
            MarkStatus { length: Length::Long, aspirated: false, nasalized: true }
        );
        a.shorten();
        assert_eq!(a.mark_status().length, Length::HalfLong);
        a.shorten().shorten();
        assert_eq!(a.mark_status().length, Length::Short);
        assert_eq!(a.to_string(), "a\u{0303}\u{02D8}");
    }

    #[test]
    fn test_equality_modes() {
        let plain = ph('a');
        let mut long = ph('a');
        long.set_length(Length::Long);
        assert!(plain.is_fuzzy_equal(&long));
        assert!(!plain.is_equal(&long));
        assert_ne!(plain, long);

        let mut long2 = ph('a');
        long2.set_nasal(true).set_length(Length::Long);
        long.set_nasal(true);
        assert_eq!(long, long2, "mark order is irrelevant");
    }

    #[test]
    fn test_likeness_and_equivalence() {
        let t = ph('t');
        assert!(t.is_like(&FeatureSpec::consonant().place(Place::Alveolar)));
        assert!(!t.is_like(&FeatureSpec::vowel()));
        assert!(t.is_equivalent(&ph('t')));
        assert!(!t.is_equivalent(&ph('d')));
    }

    #[test]
    fn test_with_marks_reconciles() {
        let p = Phoneme::with_marks(inv(), 't', [Diacritic::Voiced], [Mark::Aspirated]).unwrap();
        assert_eq!(p.to_string(), "dʰ");
    }

    #[test]
    fn test_from_features() {
        let p = Phoneme::from_features(
            inv(),
            DesiredFeatures::Vowel { height: 3, position: 2, rounded: true },
        )
        .unwrap();
        assert_eq!(p.to_string(), "ə\u{0339}");
    }

    #[test]
    fn test_contextualize_derefs() {
        let ctx = SyllableContext { stressed: true, ..SyllableContext::default() };
        let mut c = ph('k').contextualize(ctx);
        c.set_voiced(true).unwrap();
        assert_eq!(c.to_string(), "\u{0261}");
        assert!(c.context.stressed);
    }
}
