//! Pronunciation lexicon and the rule that maps a transcription back to a
//! word.

use crate::compose::compose_word;
use crate::error::Result;
use crate::graph::Hmm;
use crate::phoneme::PhonemeSet;

/// One lexicon entry.
#[derive(Clone, Debug)]
pub struct Word {
    text: String,
    pronunciation: Vec<String>,
    model: Option<Hmm>,
}

impl Word {
    pub fn new(text: impl Into<String>, pronunciation: Vec<String>) -> Self {
        Self {
            text: text.into(),
            pronunciation,
            model: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn pronunciation(&self) -> &[String] {
        &self.pronunciation
    }

    /// Composed word model, once [`Lexicon::compose_models`] has run.
    pub fn model(&self) -> Option<&Hmm> {
        self.model.as_ref()
    }
}

/// How a decoded transcription is compared with a pronunciation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MatchRule {
    /// Same length, and every pronunciation phoneme occurs somewhere in the
    /// transcription. Order is ignored.
    #[default]
    PhonemeSet,
    /// Identical sequences.
    ExactSequence,
}

impl MatchRule {
    pub fn matches(self, pronunciation: &[String], transcription: &[String]) -> bool {
        match self {
            MatchRule::PhonemeSet => {
                pronunciation.len() == transcription.len()
                    && pronunciation.iter().all(|p| transcription.contains(p))
            }
            MatchRule::ExactSequence => pronunciation == transcription,
        }
    }
}

/// Ordered collection of words. Order decides ties during resolution.
#[derive(Clone, Debug, Default)]
pub struct Lexicon {
    words: Vec<Word>,
}

impl Lexicon {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, text: impl Into<String>, pronunciation: Vec<String>) {
        self.words.push(Word::new(text, pronunciation));
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Word> {
        self.words.get(index)
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Compose and attach a word model to every entry. Stops at the first
    /// word that references an unknown phoneme.
    pub fn compose_models(&mut self, phonemes: &PhonemeSet, silence: &str) -> Result<()> {
        for word in &mut self.words {
            let model = compose_word(&word.text, &word.pronunciation, phonemes, silence)?;
            word.model = Some(model);
        }
        Ok(())
    }

    /// First word, in lexicon order, whose pronunciation satisfies `rule`.
    pub fn resolve(&self, transcription: &[String], rule: MatchRule) -> Option<(usize, &Word)> {
        self.words
            .iter()
            .enumerate()
            .find(|(_, w)| rule.matches(&w.pronunciation, transcription))
    }
}

impl FromIterator<Word> for Lexicon {
    fn from_iter<I: IntoIterator<Item = Word>>(iter: I) -> Self {
        Self {
            words: iter.into_iter().collect(),
        }
    }
}
