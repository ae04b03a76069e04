//! Error type shared by composition, emission scoring, decoding and the
//! file readers.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A pronunciation (or the silence model) names a phoneme the trained
    /// model set does not contain.
    #[error("phoneme '{phoneme}' required by word '{word}' is not in the trained model set")]
    MissingPhoneme { phoneme: String, word: String },

    /// Observation vectors and model Gaussians disagree on dimensionality.
    #[error("feature dimension mismatch: '{model}' expects {expected}, found {found}")]
    DimensionMismatch {
        model: String,
        expected: usize,
        found: usize,
    },

    /// The lexicon has no words, so no automaton can be composed.
    #[error("lexicon is empty")]
    EmptyLexicon,

    /// A template or composed graph violates a structural assumption.
    #[error("malformed model '{model}': {reason}")]
    MalformedModel { model: String, reason: String },

    /// No path through the lattice reaches the terminal cell.
    #[error("decode failed: no path reaches the terminal state after {slices} slices")]
    DecodeFailure { slices: usize },

    /// The lattice for this automaton and observation cannot be allocated.
    #[error("lattice of {states} states x {slices} slices exceeds available capacity")]
    LatticeTooLarge { states: usize, slices: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A collaborator file could not be parsed.
    #[error("{source_name}:{line}: {message}")]
    Parse {
        source_name: String,
        line: usize,
        message: String,
    },

    /// HTK parameter kinds this reader does not decode (compressed, etc).
    #[error("unsupported HTK parameter kind {kind:#06o} in '{source_name}'")]
    UnsupportedFeatureKind { source_name: String, kind: u16 },
}

impl Error {
    /// True for errors raised by an inconsistent model/lexicon/observation
    /// combination, as opposed to decode or I/O failures.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::MissingPhoneme { .. }
                | Error::DimensionMismatch { .. }
                | Error::EmptyLexicon
                | Error::MalformedModel { .. }
        )
    }

    pub(crate) fn malformed(model: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedModel {
            model: model.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn parse(source_name: &str, line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            source_name: source_name.to_string(),
            line,
            message: message.into(),
        }
    }
}
