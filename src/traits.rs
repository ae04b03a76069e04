//! Seam between emission scoring and the decoder.
//!
//! The Viterbi recurrence only needs "log-likelihood of template state `e`
//! at slice `t`". [`EmissionLookup`] is that contract; the crate's own
//! [`EmissionTable`](crate::emission::EmissionTable) implements it, and
//! callers may plug in precomputed or externally produced scores.

use crate::graph::EmitterId;

/// Per-decode source of emission log-likelihoods.
pub trait EmissionLookup {
    /// Number of observation time slices `T`.
    fn num_slices(&self) -> usize;

    /// Log-likelihood of `emitter` at `slice`, or `None` when either index
    /// is out of range. The decoder scores missing values as 0.
    fn log_likelihood(&self, emitter: EmitterId, slice: usize) -> Option<f64>;
}

impl<E: EmissionLookup + ?Sized> EmissionLookup for &E {
    fn num_slices(&self) -> usize {
        (**self).num_slices()
    }

    fn log_likelihood(&self, emitter: EmitterId, slice: usize) -> Option<f64> {
        (**self).log_likelihood(emitter, slice)
    }
}
