//! Gaussian emission scoring.
//!
//! Static parameters ([`Gaussian`]) are immutable and shared by every
//! composed copy of a template state. Scores for one observation live in an
//! [`EmissionTable`] that the decode owns, so two observations never race on
//! the same storage.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::graph::EmitterId;
use crate::phoneme::PhonemeSet;
use crate::traits::EmissionLookup;

const LN_2PI: f64 = 1.837_877_066_409_345_5;

/// Diagonal-covariance multivariate Gaussian.
#[derive(Clone, Debug, PartialEq)]
pub struct Gaussian {
    mean: Vec<f64>,
    variance: Vec<f64>,
    /// Σ_d ln(2π σ²_d), HTK's GCONST.
    log_norm: f64,
}

impl Gaussian {
    /// Build a Gaussian, precomputing its normalisation as a sum of logs.
    ///
    /// Fails when the vectors differ in length, are empty, or a variance is
    /// not strictly positive and finite.
    pub fn new(mean: Vec<f64>, variance: Vec<f64>) -> Result<Self> {
        if mean.is_empty() || mean.len() != variance.len() {
            return Err(Error::malformed(
                "gaussian",
                format!(
                    "mean has {} dimensions, variance has {}",
                    mean.len(),
                    variance.len()
                ),
            ));
        }
        if let Some(d) = variance.iter().position(|v| !(v.is_finite() && *v > 0.0)) {
            return Err(Error::malformed(
                "gaussian",
                format!("variance[{d}] = {} is not positive", variance[d]),
            ));
        }
        let log_norm = variance.iter().map(|v| LN_2PI + v.ln()).sum();
        Ok(Self {
            mean,
            variance,
            log_norm,
        })
    }

    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn variance(&self) -> &[f64] {
        &self.variance
    }

    /// Normalisation constant Σ_d ln(2π σ²_d).
    pub fn gconst(&self) -> f64 {
        self.log_norm
    }

    /// `−0.5 · Σ (x−μ)²/σ² − 0.5 · Σ ln(2πσ²)`.
    ///
    /// `x` must have [`dim`](Self::dim) entries; callers check this once per
    /// observation rather than per frame.
    #[inline]
    pub fn log_likelihood(&self, x: &[f64]) -> f64 {
        debug_assert_eq!(x.len(), self.mean.len());
        let mahalanobis: f64 = x
            .iter()
            .zip(&self.mean)
            .zip(&self.variance)
            .map(|((x, m), v)| {
                let d = x - m;
                d * d / v
            })
            .sum();
        -0.5 * (mahalanobis + self.log_norm)
    }
}

/// Ordered feature vectors of one utterance.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Observation {
    frames: Vec<Vec<f64>>,
}

impl Observation {
    /// Wrap frames, rejecting ragged input.
    pub fn new(frames: Vec<Vec<f64>>) -> Result<Self> {
        if let Some(first) = frames.first() {
            let dim = first.len();
            if let Some((i, f)) = frames.iter().enumerate().find(|(_, f)| f.len() != dim) {
                return Err(Error::DimensionMismatch {
                    model: format!("observation frame {i}"),
                    expected: dim,
                    found: f.len(),
                });
            }
        }
        Ok(Self { frames })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Feature dimensionality, `None` for an empty observation.
    pub fn dim(&self) -> Option<usize> {
        self.frames.first().map(Vec::len)
    }

    pub fn frames(&self) -> &[Vec<f64>] {
        &self.frames
    }
}

/// Log-likelihood of every template emitting state at every time slice.
#[derive(Clone, Debug, PartialEq)]
pub struct EmissionTable {
    slices: usize,
    rows: Vec<Vec<f64>>,
}

impl EmissionTable {
    /// Score `observation` against every emitting state of `phonemes`.
    pub fn compute(phonemes: &PhonemeSet, observation: &Observation) -> Result<Self> {
        #[cfg(feature = "tracing")]
        let span = tracing::debug_span!(
            "emission_table",
            emitters = phonemes.emitters().len(),
            slices = observation.len()
        );
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        if let Some(found) = observation.dim() {
            if let Some(info) = phonemes
                .emitters()
                .iter()
                .find(|e| e.gaussian.dim() != found)
            {
                return Err(Error::DimensionMismatch {
                    model: info.phoneme.to_string(),
                    expected: info.gaussian.dim(),
                    found,
                });
            }
        }

        let frames = observation.frames();
        let score_row = |info: &crate::phoneme::EmitterInfo| -> Vec<f64> {
            frames
                .iter()
                .map(|x| info.gaussian.log_likelihood(x))
                .collect()
        };

        #[cfg(feature = "parallel")]
        let rows = phonemes.emitters().par_iter().map(score_row).collect();
        #[cfg(not(feature = "parallel"))]
        let rows = phonemes.emitters().iter().map(score_row).collect();

        Ok(Self {
            slices: observation.len(),
            rows,
        })
    }

    /// Table from precomputed rows, indexed by `EmitterId`. Every row must
    /// have `slices` entries.
    pub fn from_rows(slices: usize, rows: Vec<Vec<f64>>) -> Result<Self> {
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != slices) {
            return Err(Error::DimensionMismatch {
                model: format!("emission row {i}"),
                expected: slices,
                found: row.len(),
            });
        }
        Ok(Self { slices, rows })
    }

    pub fn row(&self, emitter: EmitterId) -> Option<&[f64]> {
        self.rows.get(emitter.0).map(Vec::as_slice)
    }

    pub fn emitters(&self) -> usize {
        self.rows.len()
    }
}

impl EmissionLookup for EmissionTable {
    fn num_slices(&self) -> usize {
        self.slices
    }

    fn log_likelihood(&self, emitter: EmitterId, slice: usize) -> Option<f64> {
        self.rows.get(emitter.0)?.get(slice).copied()
    }
}
