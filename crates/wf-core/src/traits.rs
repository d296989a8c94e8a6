//! Core traits for WaveFit
//!
//! The outer evolutionary search programs against [`FitnessModel`]
//! alone: it never sees whether errors come from the interpolated grid
//! or from a trained surrogate. This replaces subclass-per-experiment
//! dispatch with one capability and a small closed set of backends
//! selected by configuration.

use crate::params::ParameterVector;
use crate::Result;

/// A fitness evaluator: candidate parameter vector in, one error scalar
/// per observation station out.
pub trait FitnessModel: Send + Sync {
    /// Stations the error vector is reported for, in output order.
    fn station_ids(&self) -> &[u32];

    /// Per-station error for a candidate configuration.
    ///
    /// Out-of-range vectors are legitimate optimizer output and must be
    /// absorbed (clamped), never rejected.
    fn evaluate(&self, params: &ParameterVector) -> Result<Vec<f64>>;
}
