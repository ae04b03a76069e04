use crate::compose::HeadPrior;
use crate::error::Result;
use crate::lexicon::{Lexicon, MatchRule};
use crate::phoneme::PhonemeSet;
use crate::utils::{DEFAULT_MAX_LATTICE_CELLS, DEFAULT_SILENCE_LABEL};
use crate::Recognizer;

/// Decode-time settings of a [`Recognizer`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecognizerConfig {
    /// Phoneme bracketing every word; also dropped from transcriptions.
    pub silence_label: String,
    pub match_rule: MatchRule,
    pub head_prior: HeadPrior,
    /// Largest lattice (states × (T + 2)) a decode may allocate.
    pub max_lattice_cells: usize,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            silence_label: DEFAULT_SILENCE_LABEL.to_string(),
            match_rule: MatchRule::default(),
            head_prior: HeadPrior::default(),
            max_lattice_cells: DEFAULT_MAX_LATTICE_CELLS,
        }
    }
}

pub struct RecognizerBuilder {
    phonemes: PhonemeSet,
    lexicon: Lexicon,
    config: RecognizerConfig,
}

impl RecognizerBuilder {
    pub fn new(phonemes: PhonemeSet, lexicon: Lexicon) -> Self {
        Self {
            phonemes,
            lexicon,
            config: RecognizerConfig::default(),
        }
    }
    pub fn with_silence_label(mut self, label: impl Into<String>) -> Self {
        self.config.silence_label = label.into();
        self
    }
    pub fn with_match_rule(mut self, rule: MatchRule) -> Self {
        self.config.match_rule = rule;
        self
    }
    pub fn with_head_prior(mut self, prior: HeadPrior) -> Self {
        self.config.head_prior = prior;
        self
    }
    pub fn with_max_lattice_cells(mut self, cells: usize) -> Self {
        self.config.max_lattice_cells = cells;
        self
    }
    pub fn with_config(mut self, config: RecognizerConfig) -> Self {
        self.config = config;
        self
    }
    /// Compose every word model and the automaton.
    pub fn build(self) -> Result<Recognizer> {
        Recognizer::with_config(self.phonemes, self.lexicon, self.config)
    }
}
