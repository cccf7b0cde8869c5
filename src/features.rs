//! Articulatory feature model.
//!
//! Canonical records carry a closed [`Features`] value: either consonant or
//! vowel features, never a mix. Graded dimensions (place, height, position)
//! are small ordered enums whose ordinal distance is meaningful; two values
//! are *adjacent* when their ordinals differ by at most one.
//!
//! Reconciliation works on a [`DesiredFeatures`] bundle instead, whose graded
//! values are raw ordinals so that a diacritic may push them one step past the
//! end of the scale (e.g. advancing a bilabial).

use std::fmt;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Graded and categorical dimensions
// ─────────────────────────────────────────────────────────────────────────────

/// Consonant or vowel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PhonemeKind {
    Consonant,
    Vowel,
}

impl fmt::Display for PhonemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhonemeKind::Consonant => f.write_str("consonant"),
            PhonemeKind::Vowel => f.write_str("vowel"),
        }
    }
}

/// Place of articulation, front of the mouth to back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Place {
    Bilabial = 0,
    LabialVelar = 1,
    Labiodental = 2,
    Dental = 3,
    Alveolar = 4,
    Postalveolar = 5,
    Retroflex = 6,
    Palatal = 7,
    Velar = 8,
    Uvular = 9,
    Pharyngeal = 10,
    Glottal = 11,
}

/// Manner of articulation. Not graded: only exact equality is meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Manner {
    Plosive,
    Nasal,
    Trill,
    Fricative,
    Approximant,
    LateralApproximant,
    Affricate,
    Tap,
}

/// Vowel height, close to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Height {
    Close = 0,
    NearClose = 1,
    CloseMid = 2,
    Mid = 3,
    OpenMid = 4,
    NearOpen = 5,
    Open = 6,
}

/// Vowel backness, front to back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Position {
    Front = 0,
    NearFront = 1,
    Central = 2,
    NearBack = 3,
    Back = 4,
}

/// Conversion between a graded enum and its ordinal.
pub trait Graded: Copy + Sized + 'static {
    const ALL: &'static [Self];

    fn ordinal(self) -> i8;

    fn from_ordinal(ordinal: i8) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.ordinal() == ordinal)
    }
}

impl Graded for Place {
    const ALL: &'static [Self] = &[
        Place::Bilabial,
        Place::LabialVelar,
        Place::Labiodental,
        Place::Dental,
        Place::Alveolar,
        Place::Postalveolar,
        Place::Retroflex,
        Place::Palatal,
        Place::Velar,
        Place::Uvular,
        Place::Pharyngeal,
        Place::Glottal,
    ];

    fn ordinal(self) -> i8 {
        self as i8
    }
}

impl Graded for Height {
    const ALL: &'static [Self] = &[
        Height::Close,
        Height::NearClose,
        Height::CloseMid,
        Height::Mid,
        Height::OpenMid,
        Height::NearOpen,
        Height::Open,
    ];

    fn ordinal(self) -> i8 {
        self as i8
    }
}

impl Graded for Position {
    const ALL: &'static [Self] = &[
        Position::Front,
        Position::NearFront,
        Position::Central,
        Position::NearBack,
        Position::Back,
    ];

    fn ordinal(self) -> i8 {
        self as i8
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Canonical features
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConsonantFeatures {
    pub place: Place,
    pub manner: Manner,
    pub voiced: bool,
    pub is_liquid: bool,
    pub is_obstruent: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VowelFeatures {
    pub height: Height,
    pub position: Position,
    pub rounded: bool,
    pub is_obstruent: bool,
}

/// Feature set of a canonical inventory record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Features {
    Consonant(ConsonantFeatures),
    Vowel(VowelFeatures),
}

impl Features {
    pub fn kind(&self) -> PhonemeKind {
        match self {
            Features::Consonant(_) => PhonemeKind::Consonant,
            Features::Vowel(_) => PhonemeKind::Vowel,
        }
    }

    pub fn is_obstruent(&self) -> bool {
        match self {
            Features::Consonant(c) => c.is_obstruent,
            Features::Vowel(v) => v.is_obstruent,
        }
    }

    /// The graded/identity part of these features, as a reconciliation target.
    pub fn desired(&self) -> DesiredFeatures {
        match *self {
            Features::Consonant(c) => DesiredFeatures::Consonant {
                place: c.place.ordinal(),
                manner: c.manner,
                voiced: c.voiced,
            },
            Features::Vowel(v) => DesiredFeatures::Vowel {
                height: v.height.ordinal(),
                position: v.position.ordinal(),
                rounded: v.rounded,
            },
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Desired (possibly off-grid) features
// ─────────────────────────────────────────────────────────────────────────────

/// A feature bundle a phoneme *wants* to have.
///
/// Only the fields that take part in reconciliation are kept; liquid and
/// obstruent flags always come from whichever canonical record is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DesiredFeatures {
    Consonant { place: i8, manner: Manner, voiced: bool },
    Vowel { height: i8, position: i8, rounded: bool },
}

impl DesiredFeatures {
    pub fn kind(&self) -> PhonemeKind {
        match self {
            DesiredFeatures::Consonant { .. } => PhonemeKind::Consonant,
            DesiredFeatures::Vowel { .. } => PhonemeKind::Vowel,
        }
    }

    /// Overwrite every field of `patch` that applies to this kind.
    ///
    /// Fields for the other kind, `kind` itself, and the liquid/obstruent
    /// flags are ignored.
    pub fn apply(&mut self, patch: &FeatureSpec) {
        match self {
            DesiredFeatures::Consonant { place, manner, voiced } => {
                if let Some(p) = patch.place {
                    *place = p.ordinal();
                }
                if let Some(m) = patch.manner {
                    *manner = m;
                }
                if let Some(v) = patch.voiced {
                    *voiced = v;
                }
            }
            DesiredFeatures::Vowel { height, position, rounded } => {
                if let Some(h) = patch.height {
                    *height = h.ordinal();
                }
                if let Some(p) = patch.position {
                    *position = p.ordinal();
                }
                if let Some(r) = patch.rounded {
                    *rounded = r;
                }
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Partial spec
// ─────────────────────────────────────────────────────────────────────────────

/// A partial feature description.
///
/// Used both as a filter (every field that is set must be equal) and as a
/// patch (every field that is set is written). A field that does not exist
/// for a phoneme's kind never matches as a filter and is ignored as a patch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeatureSpec {
    #[serde(rename = "type")]
    pub kind: Option<PhonemeKind>,
    pub place: Option<Place>,
    pub manner: Option<Manner>,
    pub voiced: Option<bool>,
    pub is_liquid: Option<bool>,
    pub is_obstruent: Option<bool>,
    pub height: Option<Height>,
    pub position: Option<Position>,
    pub rounded: Option<bool>,
}

impl FeatureSpec {
    /// Empty spec: matches everything, patches nothing.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn consonant() -> Self {
        Self { kind: Some(PhonemeKind::Consonant), ..Self::default() }
    }

    pub fn vowel() -> Self {
        Self { kind: Some(PhonemeKind::Vowel), ..Self::default() }
    }

    pub fn place(mut self, place: Place) -> Self {
        self.place = Some(place);
        self
    }

    pub fn manner(mut self, manner: Manner) -> Self {
        self.manner = Some(manner);
        self
    }

    pub fn voiced(mut self, voiced: bool) -> Self {
        self.voiced = Some(voiced);
        self
    }

    pub fn liquid(mut self, is_liquid: bool) -> Self {
        self.is_liquid = Some(is_liquid);
        self
    }

    pub fn obstruent(mut self, is_obstruent: bool) -> Self {
        self.is_obstruent = Some(is_obstruent);
        self
    }

    pub fn height(mut self, height: Height) -> Self {
        self.height = Some(height);
        self
    }

    pub fn position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn rounded(mut self, rounded: bool) -> Self {
        self.rounded = Some(rounded);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// `other` layered on top of `self`: fields set in `other` win.
    pub fn merged(self, other: &FeatureSpec) -> FeatureSpec {
        FeatureSpec {
            kind: other.kind.or(self.kind),
            place: other.place.or(self.place),
            manner: other.manner.or(self.manner),
            voiced: other.voiced.or(self.voiced),
            is_liquid: other.is_liquid.or(self.is_liquid),
            is_obstruent: other.is_obstruent.or(self.is_obstruent),
            height: other.height.or(self.height),
            position: other.position.or(self.position),
            rounded: other.rounded.or(self.rounded),
        }
    }

    /// `true` when every field set here equals the corresponding field of
    /// `features`.
    pub fn matches(&self, features: &Features) -> bool {
        fn eq<T: PartialEq>(want: Option<T>, have: Option<T>) -> bool {
            want.map_or(true, |w| have == Some(w))
        }

        let (place, manner, voiced, is_liquid, height, position, rounded) = match *features {
            Features::Consonant(c) => (
                Some(c.place),
                Some(c.manner),
                Some(c.voiced),
                Some(c.is_liquid),
                None,
                None,
                None,
            ),
            Features::Vowel(v) => {
                (None, None, None, None, Some(v.height), Some(v.position), Some(v.rounded))
            }
        };

        eq(self.kind, Some(features.kind()))
            && eq(self.place, place)
            && eq(self.manner, manner)
            && eq(self.voiced, voiced)
            && eq(self.is_liquid, is_liquid)
            && eq(self.is_obstruent, Some(features.is_obstruent()))
            && eq(self.height, height)
            && eq(self.position, position)
            && eq(self.rounded, rounded)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn t() -> Features {
        Features::Consonant(ConsonantFeatures {
            place: Place::Alveolar,
            manner: Manner::Plosive,
            voiced: false,
            is_liquid: false,
            is_obstruent: true,
        })
    }

    fn e() -> Features {
        Features::Vowel(VowelFeatures {
            height: Height::CloseMid,
            position: Position::Front,
            rounded: false,
            is_obstruent: false,
        })
    }

    #[test]
    fn test_ordinals_round_trip() {
        for &p in Place::ALL {
            assert_eq!(Place::from_ordinal(p.ordinal()), Some(p));
        }
        assert_eq!(Height::from_ordinal(7), None);
        assert_eq!(Position::from_ordinal(-1), None);
        assert_eq!(Place::LabialVelar.ordinal(), 1);
    }

    #[test]
    fn test_empty_spec_matches_everything() {
        assert!(FeatureSpec::new().matches(&t()));
        assert!(FeatureSpec::new().matches(&e()));
        assert!(FeatureSpec::new().is_empty());
    }

    #[test]
    fn test_spec_field_of_other_kind_never_matches() {
        let spec = FeatureSpec::new().manner(Manner::Plosive);
        assert!(spec.matches(&t()));
        assert!(!spec.matches(&e()));

        let spec = FeatureSpec::new().rounded(false);
        assert!(!spec.matches(&t()));
        assert!(spec.matches(&e()));
    }

    #[test]
    fn test_obstruent_is_shared() {
        assert!(FeatureSpec::new().obstruent(true).matches(&t()));
        assert!(FeatureSpec::new().obstruent(false).matches(&e()));
    }

    #[test]
    fn test_patch_ignores_other_kind() {
        let mut desired = e().desired();
        desired.apply(&FeatureSpec::new().voiced(true).manner(Manner::Nasal));
        assert_eq!(desired, e().desired());

        desired.apply(&FeatureSpec::new().height(Height::OpenMid));
        assert_eq!(
            desired,
            DesiredFeatures::Vowel { height: 4, position: 0, rounded: false }
        );
    }

    #[test]
    fn test_merge_prefers_newer_fields() {
        let a = FeatureSpec::new().voiced(true).place(Place::Velar);
        let b = FeatureSpec::new().voiced(false);
        assert_eq!(a.merged(&b), FeatureSpec::new().voiced(false).place(Place::Velar));
    }

    #[test]
    fn test_spec_deserializes_camel_case() {
        let spec: FeatureSpec =
            serde_json::from_str(r#"{"type":"consonant","manner":"plosive","voiced":false}"#)
                .unwrap();
        assert_eq!(spec, FeatureSpec::consonant().manner(Manner::Plosive).voiced(false));
    }
}
