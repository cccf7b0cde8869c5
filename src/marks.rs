//! Diacritics, suprasegmental marks and boundary symbols of the transcription
//! alphabet.
//!
//! Diacritics are graded one-step deviations from a canonical record and are
//! always *derived* by reconciliation. Suprasegmental marks (length,
//! aspiration, nasalization) are independent of articulation and are stored
//! as given, with a two-way mapping to [`MarkStatus`].

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

// ─────────────────────────────────────────────────────────────────────────────
// Symbols
// ─────────────────────────────────────────────────────────────────────────────

/// Combining diacritic encoding a residual feature difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Diacritic {
    Rounded,
    Unrounded,
    Voiced,
    Voiceless,
    Retracted,
    Advanced,
    Raised,
    Lowered,
}

impl Diacritic {
    pub const ALL: [Diacritic; 8] = [
        Diacritic::Rounded,
        Diacritic::Unrounded,
        Diacritic::Voiced,
        Diacritic::Voiceless,
        Diacritic::Retracted,
        Diacritic::Advanced,
        Diacritic::Raised,
        Diacritic::Lowered,
    ];

    pub fn symbol(self) -> char {
        match self {
            Diacritic::Rounded => '\u{0339}',
            Diacritic::Unrounded => '\u{031C}',
            Diacritic::Voiced => '\u{032C}',
            Diacritic::Voiceless => '\u{0325}',
            Diacritic::Retracted => '\u{0320}',
            Diacritic::Advanced => '\u{031F}',
            Diacritic::Raised => '\u{031D}',
            Diacritic::Lowered => '\u{031E}',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.symbol() == c)
    }
}

/// Length, aspiration and nasalization marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mark {
    Shortened,
    Long,
    HalfLong,
    Aspirated,
    Nasal,
}

impl Mark {
    pub const ALL: [Mark; 5] =
        [Mark::Shortened, Mark::Long, Mark::HalfLong, Mark::Aspirated, Mark::Nasal];

    pub fn symbol(self) -> char {
        match self {
            Mark::Shortened => '\u{02D8}',
            Mark::Long => '\u{02D0}',
            Mark::HalfLong => '\u{02D1}',
            Mark::Aspirated => '\u{02B0}',
            Mark::Nasal => '\u{0303}',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.symbol() == c)
    }

    fn is_length(self) -> bool {
        matches!(self, Mark::Shortened | Mark::Long | Mark::HalfLong)
    }
}

/// Structural symbols: passed through tokenization as literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Boundary {
    /// Precedes the first symbol of a stressed syllable.
    Stress,
    /// Explicit syllable break.
    Hiatus,
    /// Word break.
    Space,
}

impl Boundary {
    pub const ALL: [Boundary; 3] = [Boundary::Stress, Boundary::Hiatus, Boundary::Space];

    pub fn symbol(self) -> char {
        match self {
            Boundary::Stress => '\u{02C8}',
            Boundary::Hiatus => '.',
            Boundary::Space => ' ',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.symbol() == c)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Insertion-ordered mark sets
// ─────────────────────────────────────────────────────────────────────────────

/// Small insertion-ordered set. Rendering follows insertion order; equality
/// ignores it.
#[derive(Clone)]
pub struct MarkSet<T>(SmallVec<[T; 4]>);

impl<T: Copy + Eq> MarkSet<T> {
    pub fn new() -> Self {
        Self(SmallVec::new())
    }

    /// Adds `item` at the end. Returns `false` if it was already present.
    pub fn insert(&mut self, item: T) -> bool {
        if self.contains(item) {
            return false;
        }
        self.0.push(item);
        true
    }

    pub fn remove(&mut self, item: T) -> bool {
        match self.0.iter().position(|&x| x == item) {
            Some(i) => {
                self.0.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn retain(&mut self, keep: impl FnMut(&mut T) -> bool) {
        self.0.retain(keep);
    }

    pub fn contains(&self, item: T) -> bool {
        self.0.contains(&item)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.0.iter().copied()
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        self.iter().all(|x| other.contains(x))
    }
}

impl<T: Copy + Eq> Default for MarkSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Eq> PartialEq for MarkSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.is_subset(other) && other.is_subset(self)
    }
}

impl<T: Copy + Eq> Eq for MarkSet<T> {}

impl<T: Copy + Eq> FromIterator<T> for MarkSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        for item in iter {
            set.insert(item);
        }
        set
    }
}

impl<T: Copy + Eq> Extend<T> for MarkSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.insert(item);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for MarkSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.iter()).finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Suprasegmental status
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Length {
    #[default]
    Default,
    HalfLong,
    Long,
    Short,
}

impl Length {
    /// One step shorter: Long → HalfLong → Default → Short, Short stays Short.
    pub fn shortened(self) -> Self {
        match self {
            Length::Long => Length::HalfLong,
            Length::HalfLong => Length::Default,
            Length::Default | Length::Short => Length::Short,
        }
    }

    fn mark(self) -> Option<Mark> {
        match self {
            Length::Default => None,
            Length::HalfLong => Some(Mark::HalfLong),
            Length::Long => Some(Mark::Long),
            Length::Short => Some(Mark::Shortened),
        }
    }
}

/// Record view of a mark set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MarkStatus {
    pub length: Length,
    pub aspirated: bool,
    pub nasalized: bool,
}

impl MarkStatus {
    /// Reads a status off a mark set; if several length marks are present the
    /// last one wins.
    pub fn from_marks(marks: &MarkSet<Mark>) -> Self {
        marks.iter().fold(Self::default(), |mut status, mark| {
            match mark {
                Mark::Long => status.length = Length::Long,
                Mark::Shortened => status.length = Length::Short,
                Mark::HalfLong => status.length = Length::HalfLong,
                Mark::Aspirated => status.aspirated = true,
                Mark::Nasal => status.nasalized = true,
            }
            status
        })
    }
}

/// Partial update of a [`MarkStatus`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkPatch {
    pub length: Option<Length>,
    pub aspirated: Option<bool>,
    pub nasalized: Option<bool>,
}

impl MarkPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn length(mut self, length: Length) -> Self {
        self.length = Some(length);
        self
    }

    pub fn aspirated(mut self, aspirated: bool) -> Self {
        self.aspirated = Some(aspirated);
        self
    }

    pub fn nasalized(mut self, nasalized: bool) -> Self {
        self.nasalized = Some(nasalized);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// `other` layered on top of `self`.
    pub fn merged(self, other: &MarkPatch) -> MarkPatch {
        MarkPatch {
            length: other.length.or(self.length),
            aspirated: other.aspirated.or(self.aspirated),
            nasalized: other.nasalized.or(self.nasalized),
        }
    }

    /// Writes the fields set in this patch into `marks`. A changed mark is
    /// moved to the end of the rendering order.
    pub fn apply_to(&self, marks: &mut MarkSet<Mark>) {
        if let Some(length) = self.length {
            marks.retain(|m| !m.is_length());
            if let Some(mark) = length.mark() {
                marks.insert(mark);
            }
        }
        if let Some(aspirated) = self.aspirated {
            marks.remove(Mark::Aspirated);
            if aspirated {
                marks.insert(Mark::Aspirated);
            }
        }
        if let Some(nasalized) = self.nasalized {
            marks.remove(Mark::Nasal);
            if nasalized {
                marks.insert(Mark::Nasal);
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbols_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for d in Diacritic::ALL {
            assert!(seen.insert(d.symbol()), "duplicate {:?}", d);
        }
        for m in Mark::ALL {
            assert!(seen.insert(m.symbol()), "duplicate {:?}", m);
        }
        for b in Boundary::ALL {
            assert!(seen.insert(b.symbol()), "duplicate {:?}", b);
        }
    }

    #[test]
    fn test_from_char() {
        assert_eq!(Diacritic::from_char('\u{031E}'), Some(Diacritic::Lowered));
        assert_eq!(Mark::from_char('ː'), Some(Mark::Long));
        assert_eq!(Boundary::from_char('ˈ'), Some(Boundary::Stress));
        assert_eq!(Boundary::from_char('a'), None);
    }

    #[test]
    fn test_mark_set_equality_ignores_order() {
        let a: MarkSet<Mark> = [Mark::Long, Mark::Nasal].into_iter().collect();
        let b: MarkSet<Mark> = [Mark::Nasal, Mark::Long].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(a.iter().collect::<Vec<_>>(), vec![Mark::Long, Mark::Nasal]);
    }

    #[test]
    fn test_length_is_exclusive() {
        let mut marks: MarkSet<Mark> = [Mark::Shortened, Mark::Aspirated].into_iter().collect();
        MarkPatch::new().length(Length::Long).apply_to(&mut marks);
        assert_eq!(marks.iter().collect::<Vec<_>>(), vec![Mark::Aspirated, Mark::Long]);
        assert_eq!(MarkStatus::from_marks(&marks).length, Length::Long);

        MarkPatch::new().length(Length::Default).apply_to(&mut marks);
        assert_eq!(marks.iter().collect::<Vec<_>>(), vec![Mark::Aspirated]);
    }

    #[test]
    fn test_patch_touches_only_set_fields() {
        let mut marks: MarkSet<Mark> = [Mark::Aspirated, Mark::Long].into_iter().collect();
        MarkPatch::new().nasalized(true).apply_to(&mut marks);
        assert_eq!(
            marks.iter().collect::<Vec<_>>(),
            vec![Mark::Aspirated, Mark::Long, Mark::Nasal]
        );

        MarkPatch::new().aspirated(false).apply_to(&mut marks);
        let status = MarkStatus::from_marks(&marks);
        assert_eq!(
            status,
            MarkStatus { length: Length::Long, aspirated: false, nasalized: true }
        );
    }

    #[test]
    fn test_shortening_steps() {
        assert_eq!(Length::Long.shortened(), Length::HalfLong);
        assert_eq!(Length::HalfLong.shortened(), Length::Default);
        assert_eq!(Length::Default.shortened(), Length::Short);
        assert_eq!(Length::Short.shortened(), Length::Short);
    }
}
