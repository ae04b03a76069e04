//! Isolated-word speech recognition over trained phoneme HMMs.
//!
//! Given phoneme-level HMMs with diagonal Gaussian emissions and a
//! pronunciation lexicon, the crate decodes a sequence of acoustic feature
//! vectors into the single most probable word.
//!
//! ## Pipeline
//! 1. Every phoneme record becomes a template [`Hmm`] in a [`PhonemeSet`].
//! 2. Each lexicon word is composed into a word model (silence, the
//!    pronunciation, silence) by splicing template states, and all word
//!    models are fused into one [`Automaton`] behind a shared head.
//! 3. For an [`Observation`] an [`EmissionTable`] holds the log-likelihood of
//!    every template emitting state at every time slice.
//! 4. [`ViterbiDecoder`] fills the full (states × slices) lattice, traces the
//!    best path back and the transcription read off that path is resolved
//!    against the lexicon.
//!
//! ## Quick start
//! ```
//! use hmm_wordrec::{EmittingStateRecord, Lexicon, Observation, PhonemeRecord, PhonemeSet, Recognizer};
//!
//! let phoneme = |name: &str, base: f64| PhonemeRecord {
//!     name: name.into(),
//!     states: (0..3)
//!         .map(|i| EmittingStateRecord {
//!             mean: vec![base + i as f64],
//!             variance: vec![0.5],
//!             gconst: None,
//!         })
//!         .collect(),
//!     transitions: vec![
//!         vec![0.0, 1.0, 0.0, 0.0, 0.0],
//!         vec![0.0, 0.5, 0.5, 0.0, 0.0],
//!         vec![0.0, 0.0, 0.5, 0.5, 0.0],
//!         vec![0.0, 0.0, 0.0, 0.5, 0.5],
//!         vec![0.0; 5],
//!     ],
//! };
//! let phonemes = PhonemeSet::from_records([phoneme("sil", 0.0), phoneme("n", 10.0), phoneme("ow", 20.0)])?;
//! let mut lexicon = Lexicon::new();
//! lexicon.push("no", vec!["n".into(), "ow".into()]);
//!
//! let recognizer = Recognizer::new(phonemes, lexicon)?;
//! let frames = [0.0, 1.0, 2.0, 10.0, 11.0, 12.0, 20.0, 21.0, 22.0, 0.0, 1.0, 2.0]
//!     .iter()
//!     .map(|&x| vec![x])
//!     .collect();
//! let decoding = recognizer.recognise(&Observation::new(frames)?)?;
//! assert_eq!(decoding.outcome.word(), Some("no"));
//! # Ok::<(), hmm_wordrec::Error>(())
//! ```
//!
//! File readers for HTK model, lexicon, feature and test-set files live in
//! [`io`]; [`batch`] runs a whole test set.

pub mod batch;
pub mod builder;
pub mod compose;
pub mod emission;
pub mod engine;
pub mod error;
pub mod graph;
pub mod io;
pub mod lexicon;
pub mod phoneme;
pub mod traits;
pub mod utils;
pub mod viterbi;

pub use crate::builder::{RecognizerBuilder, RecognizerConfig};
pub use crate::compose::{Automaton, HeadPrior};
pub use crate::emission::{EmissionTable, Gaussian, Observation};
pub use crate::engine::{Decoding, Recognition, Recognizer};
pub use crate::error::{Error, Result};
pub use crate::graph::{Hmm, State, StateId, Transition};
pub use crate::lexicon::{Lexicon, MatchRule, Word};
pub use crate::phoneme::{EmittingStateRecord, PhonemeRecord, PhonemeSet};
pub use crate::traits::EmissionLookup;
pub use crate::viterbi::{BestPath, ViterbiDecoder};
