//! Simulation run records and the run catalog.

use serde::{Deserialize, Serialize};
use wf_core::{Error, Result};

/// A discrete resolution setting of the underlying simulation.
///
/// Treated as two extra optimization dimensions alongside the physical
/// coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fidelity {
    /// Time step, minutes.
    pub time: f64,
    /// Spatial grid resolution.
    pub space: f64,
}

impl Fidelity {
    /// Create a fidelity tag.
    pub fn new(time: f64, space: f64) -> Self {
        Self { time, space }
    }
}

/// Forecast series at one observation station.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationSeries {
    /// Station identifier.
    pub station: u32,
    /// Significant-wave-height forecast, one value per output step.
    pub values: Vec<f64>,
}

/// One precomputed simulation run: a configuration id, the fidelity and
/// noise tags it was run under, and its per-station forecast series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    /// Run-configuration id, matching a [`crate::ConfigurationRow`].
    pub id: String,
    /// Fidelity the run was simulated at.
    pub fidelity: Fidelity,
    /// Input-forcing noise tag (0 for unperturbed forcing).
    pub noise: u32,
    /// Forecast series per station.
    pub series: Vec<StationSeries>,
}

impl RunRecord {
    /// Forecast series for one station, if the run covers it.
    pub fn series_for(&self, station: u32) -> Option<&[f64]> {
        self.series.iter().find(|s| s.station == station).map(|s| s.values.as_slice())
    }
}

/// Discovered simulation output, grouped by (configuration id, fidelity).
///
/// Borrowed read-only by the evaluator; discovery itself (directory
/// walking, filename parsing) lives with the caller.
pub trait RunCatalog: Send + Sync {
    /// All discovered runs, in discovery order.
    ///
    /// Discovery order matters: the fidelity axes of the parameter grid
    /// preserve first-seen order.
    fn runs(&self) -> &[RunRecord];
}

/// A run catalog backed by records already in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    runs: Vec<RunRecord>,
}

impl InMemoryCatalog {
    /// Wrap a list of discovered runs.
    ///
    /// Fails if two runs carry the same (id, fidelity, noise) triple:
    /// the grid build could not tell which output to trust.
    pub fn new(runs: Vec<RunRecord>) -> Result<Self> {
        for (i, a) in runs.iter().enumerate() {
            for b in &runs[i + 1..] {
                if a.id == b.id && a.fidelity == b.fidelity && a.noise == b.noise {
                    return Err(Error::Validation(format!(
                        "duplicate run: id={} fidelity=({}, {}) noise={}",
                        a.id, a.fidelity.time, a.fidelity.space, a.noise
                    )));
                }
            }
        }
        Ok(Self { runs })
    }
}

impl RunCatalog for InMemoryCatalog {
    fn runs(&self) -> &[RunRecord] {
        &self.runs
    }
}
