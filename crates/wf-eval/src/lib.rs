//! # wf-eval
//!
//! The multi-fidelity fitness evaluation engine of WaveFit.
//!
//! Turns a continuous 5-dimensional [`wf_core::ParameterVector`] into a
//! per-station error vector by:
//! - indexing sparse precomputed simulation runs into a dense grid
//! - caching per-station error computation to disk, keyed by the
//!   evaluation configuration
//! - interpolating continuously over the grid with boundary clamping
//! - optionally substituting a trained per-station regression surrogate
//!
//! The outer evolutionary search, file-format readers and reporting are
//! external collaborators; see `wf-catalog` for the consumed interfaces.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Error-grid cache: dense per-station error array, persisted to disk.
pub mod cache;
/// The fitness facade the optimizer calls.
pub mod facade;
/// Discrete parameter grid: axes, exact lookup and nearest snapping.
pub mod grid;
/// Multilinear interpolation over the error grid.
pub mod interp;
/// Pluggable error metrics comparing forecast against observation.
pub mod metrics;
/// Latin-hypercube sampling and population seeding.
pub mod sampling;
/// Per-station regression surrogates.
pub mod surrogate;

pub use cache::{CacheKey, ErrorGrid, ErrorGridCache, GridInputs};
pub use facade::{EvaluatorConfig, FitnessEvaluator, SurrogateConfig};
pub use grid::{GridAxis, ParameterGrid};
pub use interp::Interpolator;
pub use metrics::{ErrorMetric, MaeAll, MaePeak, RmseAll, RmsePeak};
pub use sampling::{load_population, sample_parameters, save_population};
pub use surrogate::SurrogateSet;
