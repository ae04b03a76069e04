//! Trained phoneme templates.
//!
//! A template is an [`Hmm`] with a leading and trailing non-emitting state
//! around its emitting states (three in practice). Transitions are built
//! from the trained linear-probability matrix; zero entries never become
//! edges.

use std::collections::HashMap;
use std::sync::Arc;

use crate::emission::Gaussian;
use crate::error::{Error, Result};
use crate::graph::{EmitterId, Emitter, Hmm, State, StateId};
use crate::utils::log_prob;

/// Relative tolerance when comparing a trained GCONST with the recomputed one.
const GCONST_TOLERANCE: f64 = 1e-3;

/// Trained parameters of one emitting state.
#[derive(Clone, Debug, PartialEq)]
pub struct EmittingStateRecord {
    pub mean: Vec<f64>,
    pub variance: Vec<f64>,
    /// GCONST as stored with the model, if any. Only used as a consistency
    /// check; the normalisation is always recomputed from the variance.
    pub gconst: Option<f64>,
}

/// One phoneme as delivered by the trained-model reader.
#[derive(Clone, Debug, PartialEq)]
pub struct PhonemeRecord {
    pub name: String,
    /// Emitting states in order (template states 2..N-1).
    pub states: Vec<EmittingStateRecord>,
    /// N×N linear transition probabilities over all template states,
    /// boundary states included.
    pub transitions: Vec<Vec<f64>>,
}

impl PhonemeRecord {
    /// Template size N including both boundary states.
    pub fn num_states(&self) -> usize {
        self.states.len() + 2
    }
}

/// A template emitting state, addressed by its [`EmitterId`].
#[derive(Clone, Debug)]
pub struct EmitterInfo {
    pub phoneme: Arc<str>,
    pub gaussian: Arc<Gaussian>,
}

/// Every trained phoneme template, in model-file order.
#[derive(Clone, Debug, Default)]
pub struct PhonemeSet {
    templates: Vec<Hmm>,
    index: HashMap<String, usize>,
    emitters: Vec<EmitterInfo>,
}

impl PhonemeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records<I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = PhonemeRecord>,
    {
        let mut set = Self::new();
        for record in records {
            set.insert(record)?;
        }
        Ok(set)
    }

    /// Build the template for `record` and register its emitting states.
    pub fn insert(&mut self, record: PhonemeRecord) -> Result<()> {
        if self.index.contains_key(&record.name) {
            return Err(Error::malformed(
                &record.name,
                "phoneme defined more than once",
            ));
        }
        let expected = self
            .dimension()
            .or_else(|| record.states.first().map(|s| s.mean.len()));
        if let Some(dim) = expected {
            if let Some(s) = record.states.iter().find(|s| s.mean.len() != dim) {
                return Err(Error::DimensionMismatch {
                    model: record.name.clone(),
                    expected: dim,
                    found: s.mean.len(),
                });
            }
        }

        let template = self.build_template(&record)?;
        self.index.insert(record.name, self.templates.len());
        self.templates.push(template);
        Ok(())
    }

    fn build_template(&mut self, record: &PhonemeRecord) -> Result<Hmm> {
        let name = record.name.as_str();
        let n = record.num_states();
        if record.states.is_empty() {
            return Err(Error::malformed(name, "template has no emitting states"));
        }
        if record.transitions.len() != n || record.transitions.iter().any(|row| row.len() != n) {
            return Err(Error::malformed(
                name,
                format!("transition matrix must be {n}x{n}"),
            ));
        }

        let label: Arc<str> = Arc::from(name);
        let first_emitter = self.emitters.len();
        let mut gaussians = Vec::with_capacity(record.states.len());
        for (i, s) in record.states.iter().enumerate() {
            let gaussian = Gaussian::new(s.mean.clone(), s.variance.clone()).map_err(|e| match e {
                Error::MalformedModel { reason, .. } => {
                    Error::malformed(name, format!("state {}: {reason}", i + 2))
                }
                other => other,
            })?;
            if let Some(trained) = s.gconst {
                let drift = (trained - gaussian.gconst()).abs();
                if drift > GCONST_TOLERANCE * trained.abs().max(1.0) {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        phoneme = name,
                        state = i + 2,
                        trained,
                        recomputed = gaussian.gconst(),
                        "GCONST disagrees with variance; using recomputed value"
                    );
                }
            }
            gaussians.push(Arc::new(gaussian));
        }

        let mut hmm = Hmm::new(name);
        hmm.append(State::boundary());
        for (i, gaussian) in gaussians.iter().enumerate() {
            hmm.append(State::emitting(
                label.clone(),
                Emitter {
                    id: EmitterId(first_emitter + i),
                    gaussian: gaussian.clone(),
                },
            ));
        }
        hmm.append(State::boundary());

        for (from, row) in record.transitions.iter().enumerate() {
            for (to, &p) in row.iter().enumerate() {
                if !(p.is_finite() && (0.0..=1.0).contains(&p)) {
                    return Err(Error::malformed(
                        name,
                        format!("transition {}->{} has probability {p}", from + 1, to + 1),
                    ));
                }
                if p > 0.0 {
                    hmm.add_transition(StateId(from), Some(StateId(to)), log_prob(p));
                }
            }
        }
        hmm.enumerate_states();

        self.emitters.extend(gaussians.into_iter().map(|gaussian| EmitterInfo {
            phoneme: label.clone(),
            gaussian,
        }));

        #[cfg(feature = "tracing")]
        tracing::trace!(phoneme = name, states = n, "template built");
        Ok(hmm)
    }

    pub fn get(&self, name: &str) -> Option<&Hmm> {
        self.index.get(name).map(|&i| &self.templates[i])
    }

    /// Template for `phoneme`, or a configuration error naming the word that
    /// asked for it.
    pub fn require(&self, phoneme: &str, word: &str) -> Result<&Hmm> {
        self.get(phoneme).ok_or_else(|| Error::MissingPhoneme {
            phoneme: phoneme.to_string(),
            word: word.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn templates(&self) -> &[Hmm] {
        &self.templates
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.iter().map(Hmm::name)
    }

    /// Template emitting states indexed by `EmitterId`.
    pub fn emitters(&self) -> &[EmitterInfo] {
        &self.emitters
    }

    /// Feature dimensionality shared by every Gaussian, once known.
    pub fn dimension(&self) -> Option<usize> {
        self.emitters.first().map(|e| e.gaussian.dim())
    }
}
