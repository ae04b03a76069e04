//! Recogniser: phoneme set, lexicon and composed automaton behind one
//! `recognise` call.
//!
//! Composition depends only on the trained models and the lexicon, so it
//! happens once in [`Recognizer::with_config`]. Each decode then owns its
//! emission table and lattice; the recogniser itself is never mutated and
//! can be shared across threads.

use std::fmt;

use crate::builder::{RecognizerBuilder, RecognizerConfig};
use crate::compose::Automaton;
use crate::emission::{EmissionTable, Observation};
use crate::error::{Error, Result};
use crate::graph::StateId;
use crate::lexicon::Lexicon;
use crate::phoneme::PhonemeSet;
use crate::traits::EmissionLookup;
use crate::viterbi::{transcribe, ViterbiDecoder};

/// Outcome of resolving a transcription against the lexicon.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Recognition {
    Match { word: String, index: usize },
    NoMatch,
}

impl Recognition {
    pub fn word(&self) -> Option<&str> {
        match self {
            Recognition::Match { word, .. } => Some(word),
            Recognition::NoMatch => None,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Recognition::Match { .. })
    }
}

impl fmt::Display for Recognition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recognition::Match { word, .. } => f.write_str(word),
            Recognition::NoMatch => f.write_str("No match!"),
        }
    }
}

/// Everything one decode produced.
#[derive(Clone, Debug, PartialEq)]
pub struct Decoding {
    pub outcome: Recognition,
    /// Phonemes read off the best path, silence removed.
    pub transcription: Vec<String>,
    /// Score of `(tail, T + 1)`; `None` when no path exists (zero slices).
    pub log_score: Option<f64>,
    /// Best path in automaton state ids, head to tail.
    pub path: Vec<StateId>,
}

impl Decoding {
    fn no_path() -> Self {
        Self {
            outcome: Recognition::NoMatch,
            transcription: Vec::new(),
            log_score: None,
            path: Vec::new(),
        }
    }
}

/// Isolated-word recogniser over a fixed model set and lexicon.
#[derive(Clone, Debug)]
pub struct Recognizer {
    phonemes: PhonemeSet,
    lexicon: Lexicon,
    automaton: Automaton,
    config: RecognizerConfig,
}

impl Recognizer {
    /// Recogniser with default settings. See [`RecognizerBuilder`].
    pub fn new(phonemes: PhonemeSet, lexicon: Lexicon) -> Result<Self> {
        RecognizerBuilder::new(phonemes, lexicon).build()
    }

    pub fn builder(phonemes: PhonemeSet, lexicon: Lexicon) -> RecognizerBuilder {
        RecognizerBuilder::new(phonemes, lexicon)
    }

    /// Compose every word model, fuse them into the automaton and normalise
    /// its head.
    pub fn with_config(
        phonemes: PhonemeSet,
        mut lexicon: Lexicon,
        config: RecognizerConfig,
    ) -> Result<Self> {
        if lexicon.is_empty() {
            return Err(Error::EmptyLexicon);
        }
        lexicon.compose_models(&phonemes, &config.silence_label)?;
        let mut automaton = Automaton::compose(&lexicon)?;
        let head = automaton.normalize_head(config.head_prior);

        #[cfg(feature = "tracing")]
        tracing::info!(
            phonemes = phonemes.len(),
            words = lexicon.len(),
            states = automaton.len(),
            head_log_prob = head,
            "recogniser ready"
        );
        #[cfg(not(feature = "tracing"))]
        let _ = head;

        Ok(Self {
            phonemes,
            lexicon,
            automaton,
            config,
        })
    }

    pub fn phonemes(&self) -> &PhonemeSet {
        &self.phonemes
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    pub fn config(&self) -> &RecognizerConfig {
        &self.config
    }

    /// Score `observation` against every template emitting state.
    pub fn emission_table(&self, observation: &Observation) -> Result<EmissionTable> {
        EmissionTable::compute(&self.phonemes, observation)
    }

    /// Decode one observation into a word, or [`Recognition::NoMatch`].
    pub fn recognise(&self, observation: &Observation) -> Result<Decoding> {
        #[cfg(feature = "tracing")]
        let span = tracing::info_span!("recognise", slices = observation.len());
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        let table = self.emission_table(observation)?;
        self.decode_with(&table)
    }

    /// Decode from externally supplied emission scores. Rows must be indexed
    /// like [`PhonemeSet::emitters`].
    pub fn decode_with<E: EmissionLookup>(&self, emissions: &E) -> Result<Decoding> {
        let decoder = ViterbiDecoder::new(self.config.max_lattice_cells);
        let Some(best) = decoder.decode(&self.automaton, emissions)? else {
            return Ok(Decoding::no_path());
        };

        let transcription = transcribe(
            self.automaton.hmm(),
            &best.states,
            &self.config.silence_label,
        );
        let outcome = match self.lexicon.resolve(&transcription, self.config.match_rule) {
            Some((index, word)) => Recognition::Match {
                word: word.text().to_string(),
                index,
            },
            None => Recognition::NoMatch,
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            transcription = %transcription.join(" "),
            log_score = best.log_score,
            outcome = %outcome,
            "decoded"
        );
        Ok(Decoding {
            outcome,
            transcription,
            log_score: Some(best.log_score),
            path: best.states,
        })
    }

    /// Lexicon index of the word whose states the best path ran through.
    /// Independent of the match rule; useful to inspect a `NoMatch`.
    pub fn path_word(&self, decoding: &Decoding) -> Option<usize> {
        decoding
            .path
            .iter()
            .find_map(|&s| self.automaton.word_at(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::HeadPrior;
    use crate::lexicon::MatchRule;
    use crate::phoneme::{EmittingStateRecord, PhonemeRecord};

    fn record(name: &str, base: f64) -> PhonemeRecord {
        PhonemeRecord {
            name: name.into(),
            states: (0..3)
                .map(|i| EmittingStateRecord {
                    mean: vec![base + i as f64, -base],
                    variance: vec![0.25, 0.25],
                    gconst: None,
                })
                .collect(),
            transitions: vec![
                vec![0.0, 1.0, 0.0, 0.0, 0.0],
                vec![0.0, 0.6, 0.4, 0.0, 0.0],
                vec![0.0, 0.0, 0.6, 0.4, 0.0],
                vec![0.0, 0.0, 0.0, 0.6, 0.4],
                vec![0.0; 5],
            ],
        }
    }

    fn phonemes() -> PhonemeSet {
        PhonemeSet::from_records([record("sil", 0.0), record("a", 10.0), record("b", 20.0)])
            .unwrap()
    }

    fn frames_for(set: &PhonemeSet, phones: &[&str], repeat: usize) -> Observation {
        let mut frames = Vec::new();
        for p in phones {
            for s in set.get(p).unwrap().states() {
                if let Some(e) = s.emitter() {
                    for _ in 0..repeat {
                        frames.push(e.gaussian.mean().to_vec());
                    }
                }
            }
        }
        Observation::new(frames).unwrap()
    }

    fn lexicon() -> Lexicon {
        let mut lex = Lexicon::new();
        lex.push("ab", vec!["a".into(), "b".into()]);
        lex.push("ba", vec!["b".into(), "a".into()]);
        lex
    }

    #[test]
    fn recognises_the_word_under_its_means() {
        let set = phonemes();
        let obs = frames_for(&set, &["sil", "b", "a", "sil"], 2);
        let rec = Recognizer::builder(set, lexicon())
            .with_match_rule(MatchRule::ExactSequence)
            .build()
            .unwrap();
        let out = rec.recognise(&obs).unwrap();
        assert_eq!(out.transcription, vec!["b".to_string(), "a".to_string()]);
        assert_eq!(out.outcome.word(), Some("ba"));
        assert_eq!(rec.path_word(&out), Some(1));
        assert_eq!(out.path.len(), obs.len() + 2);
    }

    #[test]
    fn set_rule_prefers_lexicon_order() {
        let set = phonemes();
        let obs = frames_for(&set, &["sil", "b", "a", "sil"], 1);
        let rec = Recognizer::new(set, lexicon()).unwrap();
        let out = rec.recognise(&obs).unwrap();
        assert_eq!(
            out.outcome,
            Recognition::Match {
                word: "ab".into(),
                index: 0
            }
        );
        assert_eq!(rec.path_word(&out), Some(1));
    }

    #[test]
    fn empty_observation_is_no_match() {
        let rec = Recognizer::new(phonemes(), lexicon()).unwrap();
        let out = rec.recognise(&Observation::default()).unwrap();
        assert_eq!(out.outcome, Recognition::NoMatch);
        assert!(out.log_score.is_none());
        assert_eq!(out.outcome.to_string(), "No match!");
    }

    #[test]
    fn configuration_errors_surface_before_decoding() {
        let mut lex = lexicon();
        lex.push("zed", vec!["z".into()]);
        let err = Recognizer::new(phonemes(), lex).unwrap_err();
        assert!(err.is_configuration());

        let err = Recognizer::new(phonemes(), Lexicon::new()).unwrap_err();
        assert!(matches!(err, Error::EmptyLexicon));

        let rec = Recognizer::new(phonemes(), lexicon()).unwrap();
        let obs = Observation::new(vec![vec![0.0; 3]; 4]).unwrap();
        assert!(matches!(
            rec.recognise(&obs),
            Err(Error::DimensionMismatch { expected: 2, found: 3, .. })
        ));
    }

    #[test]
    fn fan_out_prior_is_a_distribution() {
        let rec = Recognizer::builder(phonemes(), lexicon())
            .with_head_prior(HeadPrior::FanOut)
            .build()
            .unwrap();
        let a = rec.automaton();
        let total: f64 = a
            .hmm()
            .state(a.head())
            .transitions()
            .iter()
            .map(|t| t.log_prob().exp())
            .sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn recogniser_is_shareable() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<Recognizer>();
    }
}
