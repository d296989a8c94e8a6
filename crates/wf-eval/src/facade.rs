//! The fitness facade — the single entry point the optimizer calls.
//!
//! Construction wires the whole evaluation stack: derive the parameter
//! grid from the collaborators, build or reload the error grid through
//! the cache, and optionally train surrogates. Whether queries go to
//! the interpolator or the surrogates is fixed for the evaluator's
//! lifetime.
//!
//! Construction failures (missing simulation output, unreadable cache)
//! abort — there is no safe partially built evaluator to hand out.

use std::path::PathBuf;

use wf_catalog::{ConfigurationTable, ObservationSource, RunCatalog, SeriesRange};
use wf_core::{Error, FitnessModel, ParameterVector, Result};

use crate::cache::{CacheKey, ErrorGridCache, GridInputs};
use crate::grid::ParameterGrid;
use crate::interp::Interpolator;
use crate::metrics::ErrorMetric;
use crate::sampling::sample_parameters;
use crate::surrogate::SurrogateSet;

/// Surrogate-mode settings.
#[derive(Debug, Clone, Copy)]
pub struct SurrogateConfig {
    /// Latin-hypercube design size for training. Required, no default:
    /// see [`SurrogateSet::train`] for the accuracy/cost trade-off.
    pub sample_count: usize,
    /// Seed for the training design.
    pub seed: u64,
}

/// Construction-time configuration of a [`FitnessEvaluator`].
#[derive(Debug, Clone)]
pub struct EvaluatorConfig {
    /// Stations of interest, defining the error-vector order.
    pub stations: Vec<u32>,
    /// Observation sub-range the metric compares.
    pub range: SeriesRange,
    /// Input-forcing noise tag selecting which runs participate.
    pub noise: u32,
    /// Directory for persisted error grids.
    pub cache_dir: PathBuf,
    /// Surrogate mode; `None` evaluates through the interpolator.
    pub surrogate: Option<SurrogateConfig>,
}

/// The evaluator behind [`FitnessModel`]: owns the error grid and any
/// trained surrogates, borrows everything else at construction.
#[derive(Debug)]
pub struct FitnessEvaluator {
    grid: ParameterGrid,
    stations: Vec<u32>,
    interpolator: Interpolator,
    surrogate: Option<SurrogateSet>,
}

impl FitnessEvaluator {
    /// Build the evaluator for one evaluation configuration.
    pub fn new(
        config: EvaluatorConfig,
        metric: &dyn ErrorMetric,
        table: &ConfigurationTable,
        catalog: &dyn RunCatalog,
        observations: &dyn ObservationSource,
    ) -> Result<Self> {
        let grid = ParameterGrid::from_catalog(table, catalog)?;
        grid.validate_ascending()?;

        let key = CacheKey::new(metric, config.range, config.noise, &config.stations, &grid)?;
        let cache = ErrorGridCache::new(&config.cache_dir);
        let inputs = GridInputs { grid: &grid, table, catalog, observations, metric };
        let error_grid = cache.build_or_load(&key, &inputs)?;
        let interpolator = Interpolator::new(error_grid)?;

        let surrogate = match config.surrogate {
            Some(s) => Some(SurrogateSet::train(&interpolator, &grid, s.sample_count, s.seed)?),
            None => None,
        };

        Ok(Self { grid, stations: config.stations, interpolator, surrogate })
    }

    /// The discrete parameter grid.
    pub fn grid(&self) -> &ParameterGrid {
        &self.grid
    }

    /// The interpolator over the error grid.
    pub fn interpolator(&self) -> &Interpolator {
        &self.interpolator
    }

    /// The trained surrogates, when surrogate mode is enabled.
    pub fn surrogate(&self) -> Option<&SurrogateSet> {
        self.surrogate.as_ref()
    }

    /// Whether queries are answered by surrogates.
    pub fn uses_surrogate(&self) -> bool {
        self.surrogate.is_some()
    }

    /// Snap every component to the closest actually-simulated value.
    ///
    /// Used before [`FitnessEvaluator::evaluate_at_node`] when exact
    /// rather than interpolated evaluation is wanted.
    pub fn snap_to_grid(&self, params: &ParameterVector) -> ParameterVector {
        self.grid.snap(params)
    }

    /// Exact (non-interpolated) error vector at a grid node.
    pub fn evaluate_at_node(&self, params: &ParameterVector) -> Result<Vec<f64>> {
        self.interpolator.evaluate_at_node(params)
    }

    /// Seed an initial population with the same LHS-plus-inverse-CDF
    /// design the surrogate trains on.
    pub fn sample_population(&self, size: usize, seed: u64) -> Result<Vec<ParameterVector>> {
        sample_parameters(&self.grid, size, seed)
    }
}

impl FitnessModel for FitnessEvaluator {
    fn station_ids(&self) -> &[u32] {
        &self.stations
    }

    fn evaluate(&self, params: &ParameterVector) -> Result<Vec<f64>> {
        if params.as_array().iter().any(|v| !v.is_finite()) {
            return Err(Error::Validation(format!(
                "parameter vector has non-finite components: {params:?}"
            )));
        }
        Ok(match &self.surrogate {
            Some(surrogate) => surrogate.predict(params),
            None => self.interpolator.evaluate(params),
        })
    }
}
