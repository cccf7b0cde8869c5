//! Transcription tokeniser.
//!
//! Splits an IPA transcription into phoneme tokens carrying their syllable
//! context, plus literal tokens for stress marks, hiatus dots and spaces.
//!
//! Syllable starts come from the inventory's [`SyllablePattern`]. Diacritics
//! and suprasegmental marks attach to the most recent phoneme; diacritics are
//! read relative to the written base symbol and reconciled as a whole, so a
//! rendered phoneme tokenises back to itself. Marks with no phoneme before
//! them are ignored, and so are unknown characters unless `keep_unknown` is set.
//!
//! [`SyllablePattern`]: crate::syllable::SyllablePattern

use std::fmt;

use tracing::trace;

use crate::error::Result;
use crate::inventory::Inventory;
use crate::marks::{Boundary, Diacritic, Mark, MarkSet};
use crate::phoneme::{ContextualPhoneme, Phoneme, SyllableContext};

// ─────────────────────────────────────────────────────────────────────────────
// Tokens
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    /// Boundary symbol, or an unknown character kept verbatim.
    Literal(char),
    Phoneme(ContextualPhoneme<'a>),
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Literal(c) => fmt::Display::fmt(c, f),
            Token::Phoneme(p) => fmt::Display::fmt(p, f),
        }
    }
}

/// A tokenised transcription.
#[derive(Debug, Clone)]
pub struct Utterance<'a> {
    tokens: Vec<Token<'a>>,
}

impl<'a> Utterance<'a> {
    pub fn tokens(&self) -> &[Token<'a>] {
        &self.tokens
    }

    /// Phoneme tokens only, in order. Rules index into this sequence.
    pub fn phonemes(&self) -> Vec<ContextualPhoneme<'a>> {
        self.tokens
            .iter()
            .filter_map(|t| match t {
                Token::Phoneme(p) => Some(p.clone()),
                Token::Literal(_) => None,
            })
            .collect()
    }

    /// Number of syllables holding at least one phoneme.
    pub fn syllable_count(&self) -> usize {
        self.tokens
            .iter()
            .filter_map(|t| match t {
                Token::Phoneme(p) => Some(p.context.syllable_index + 1),
                Token::Literal(_) => None,
            })
            .max()
            .unwrap_or(0)
    }
}

impl fmt::Display for Utterance<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            fmt::Display::fmt(token, f)?;
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tokenisation
// ─────────────────────────────────────────────────────────────────────────────

/// The phoneme that trailing diacritics and marks attach to.
struct Open<'a> {
    index: usize,
    base: Phoneme<'a>,
    diacritics: MarkSet<Diacritic>,
}

impl<'a> Open<'a> {
    fn add_diacritic(&mut self, diacritic: Diacritic, tokens: &mut [Token<'a>]) -> Result<()> {
        self.diacritics.insert(diacritic);
        if let Some(Token::Phoneme(p)) = tokens.get_mut(self.index) {
            let mut rebuilt = self.base.clone();
            rebuilt.set_diacritics(self.diacritics.iter())?;
            rebuilt.set_marks(p.marks().iter());
            *p = rebuilt.contextualize(p.context);
        }
        Ok(())
    }

    fn add_mark(&self, mark: Mark, tokens: &mut [Token<'a>]) {
        if let Some(Token::Phoneme(p)) = tokens.get_mut(self.index) {
            p.add_mark(mark);
        }
    }
}

/// Tokenises `text` against `inventory`.
pub fn tokenize<'a>(
    inventory: &'a Inventory,
    text: &str,
    keep_unknown: bool,
) -> Result<Utterance<'a>> {
    let mut starts = inventory.syllables()?.start_offsets(text)?.into_iter().peekable();

    let mut tokens: Vec<Token<'a>> = Vec::new();
    let mut open: Option<Open<'a>> = None;
    let mut context = SyllableContext::default();
    let mut prev: Option<char> = None;

    for (offset, c) in text.char_indices() {
        if starts.next_if_eq(&offset).is_some() {
            if context.position_in_syllable > 0 {
                context.syllable_index += 1;
                context.position_in_syllable = 0;
                context.stressed = false;
            }
            if prev == Some(Boundary::Stress.symbol()) {
                context.stressed = true;
            }
            trace!(
                offset,
                syllable = context.syllable_index,
                stressed = context.stressed,
                "syllable start"
            );
        }
        prev = Some(c);

        if let Some(boundary) = Boundary::from_char(c) {
            if boundary == Boundary::Space {
                context.word_index += 1;
            }
            tokens.push(Token::Literal(c));
        } else if let Some(diacritic) = Diacritic::from_char(c) {
            if let Some(open) = open.as_mut() {
                open.add_diacritic(diacritic, &mut tokens)?;
            }
        } else if let Some(mark) = Mark::from_char(c) {
            if let Some(open) = open.as_ref() {
                open.add_mark(mark, &mut tokens);
            }
        } else if let Some(record) = inventory.get(c) {
            let base = Phoneme::from_record(inventory, record);
            open = Some(Open {
                index: tokens.len(),
                base: base.clone(),
                diacritics: MarkSet::new(),
            });
            tokens.push(Token::Phoneme(base.contextualize(context)));
            context.position_in_syllable += 1;
        } else if keep_unknown {
            tokens.push(Token::Literal(c));
        }
    }

    Ok(Utterance { tokens })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marks::Length;

    fn tok(text: &str) -> Utterance<'static> {
        tokenize(Inventory::standard(), text, false).unwrap()
    }

    #[test]
    fn test_two_syllables_split_at_hiatus() {
        let u = tok("ˈkæt.əʃ");
        assert_eq!(u.syllable_count(), 2);
        let contexts: Vec<(usize, usize, bool)> = u
            .phonemes()
            .iter()
            .map(|p| (p.context.syllable_index, p.context.position_in_syllable, p.context.stressed))
            .collect();
        assert_eq!(
            contexts,
            vec![(0, 0, true), (0, 1, true), (0, 2, true), (1, 0, false), (1, 1, false)]
        );
    }

    #[test]
    fn test_literals_kept_in_order() {
        let u = tok("ˈkæt.əʃ");
        assert_eq!(u.tokens().len(), 7);
        assert_eq!(u.tokens()[0], Token::Literal('ˈ'));
        assert_eq!(u.tokens()[4], Token::Literal('.'));
        assert_eq!(u.to_string(), "ˈkæt.əʃ");
    }

    #[test]
    fn test_marks_attach_to_previous_phoneme() {
        let u = tok("tʰaː");
        let p = u.phonemes();
        assert_eq!(p.len(), 2);
        assert!(p[0].mark_status().aspirated);
        assert_eq!(p[1].mark_status().length, Length::Long);
    }

    #[test]
    fn test_diacritic_reconciles() {
        // a retracted θ is an s
        let u = tok("θ\u{0320}");
        assert_eq!(u.to_string(), "s");

        let u = tok("m\u{0325}");
        assert_eq!(u.phonemes()[0].symbol(), 'm');
        assert!(u.phonemes()[0].diacritics().contains(Diacritic::Voiceless));
    }

    #[test]
    fn test_orphan_marks_ignored() {
        assert_eq!(tok("\u{0325}ːa").to_string(), "a");
    }

    #[test]
    fn test_unknown_characters() {
        assert_eq!(tok("kæt!").to_string(), "kæt");
        let kept = tokenize(Inventory::standard(), "kæt!", true).unwrap();
        assert_eq!(kept.to_string(), "kæt!");
        assert_eq!(kept.phonemes().len(), 3);
    }

    #[test]
    fn test_word_index_advances_at_spaces() {
        let words: Vec<usize> =
            tok("kæt dɔ\u{0261}").phonemes().iter().map(|p| p.context.word_index).collect();
        assert_eq!(words, vec![0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn test_empty_input() {
        let u = tok("");
        assert!(u.tokens().is_empty());
        assert_eq!(u.syllable_count(), 0);
    }
}
