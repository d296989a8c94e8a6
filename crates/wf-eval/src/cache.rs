//! The error-grid cache.
//!
//! Builds (or reloads from disk) the dense per-station error array: one
//! cell per grid point per station, computed by the configured metric
//! against the observation series. Grids are persisted as JSON under a
//! content-addressed file name derived from the cache key, so repeated
//! runs with an identical evaluation configuration skip recomputation.
//!
//! Missing simulation output for any grid coordinate fails the build —
//! cells are never silently defaulted, which would bias the error
//! surface. A persisted file that exists but cannot be read back fails
//! fast instead of being rebuilt, so a metric/key mismatch cannot hide
//! behind a silent rebuild.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use wf_catalog::{ConfigurationTable, ObservationSource, RunCatalog, SeriesRange};
use wf_core::{Error, Result, DIMENSIONS};

use crate::grid::ParameterGrid;
use crate::metrics::ErrorMetric;

/// Identity of one evaluation configuration.
///
/// Two evaluator instances with equal keys reuse the same persisted
/// grid file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheKey {
    /// Error-metric identity.
    pub metric: String,
    /// Sub-range of each observation series the metric compares.
    pub range: SeriesRange,
    /// Input-forcing noise tag the runs were simulated under.
    pub noise: u32,
    /// Stations of interest, in output order.
    pub stations: Vec<u32>,
    /// Fidelity time levels present on disk.
    pub fidelity_time: Vec<f64>,
    /// Fidelity space levels present on disk.
    pub fidelity_space: Vec<f64>,
}

impl CacheKey {
    /// Build the key for a metric/range/noise/station configuration
    /// over a given grid.
    pub fn new(
        metric: &dyn ErrorMetric,
        range: SeriesRange,
        noise: u32,
        stations: &[u32],
        grid: &ParameterGrid,
    ) -> Result<Self> {
        range.validate()?;
        if stations.is_empty() {
            return Err(Error::Validation("station set is empty".to_string()));
        }
        for (i, st) in stations.iter().enumerate() {
            if stations[i + 1..].contains(st) {
                return Err(Error::Validation(format!("duplicate station {st} in station set")));
            }
        }
        Ok(Self {
            metric: metric.id().to_string(),
            range,
            noise,
            stations: stations.to_vec(),
            fidelity_time: grid.axis_values(3).to_vec(),
            fidelity_space: grid.axis_values(4).to_vec(),
        })
    }

    /// Content-addressed file name for this key.
    pub fn file_name(&self) -> String {
        // Debug form of the key hashed with FNV-1a; the metric id and
        // noise tag stay readable for diagnosability.
        let canonical = format!("{self:?}");
        format!("errgrid-{}-n{}-{:016x}.json", self.metric, self.noise, fnv1a64(canonical.as_bytes()))
    }
}

fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash = 0xcbf2_9ce4_8422_2325u64;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// The dense 5-dimensional per-station error array.
///
/// Layout is row-major over the five axes with the station index
/// innermost, so all station errors of one node are contiguous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorGrid {
    /// The key this grid was built under.
    pub key: CacheKey,
    /// Knot values per dimension, in axis order.
    pub axes: [Vec<f64>; DIMENSIONS],
    /// Stations, in output order.
    pub stations: Vec<u32>,
    /// Error values, `shape.product() * stations.len()` cells.
    pub values: Vec<f64>,
}

impl ErrorGrid {
    /// Knots per dimension.
    pub fn shape(&self) -> [usize; DIMENSIONS] {
        std::array::from_fn(|d| self.axes[d].len())
    }

    /// Number of grid nodes.
    pub fn node_count(&self) -> usize {
        self.shape().iter().product()
    }

    /// Number of stations.
    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    fn node_base(&self, coord: [usize; DIMENSIONS]) -> usize {
        let shape = self.shape();
        let mut flat = 0usize;
        for d in 0..DIMENSIONS {
            debug_assert!(coord[d] < shape[d]);
            flat = flat * shape[d] + coord[d];
        }
        flat * self.station_count()
    }

    /// All station errors at one node, in station order.
    pub fn node_errors(&self, coord: [usize; DIMENSIONS]) -> &[f64] {
        let base = self.node_base(coord);
        &self.values[base..base + self.station_count()]
    }

    /// The error at one node for one station index.
    pub fn value(&self, coord: [usize; DIMENSIONS], station_idx: usize) -> f64 {
        self.values[self.node_base(coord) + station_idx]
    }
}

/// Everything the grid build borrows from the collaborators.
pub struct GridInputs<'a> {
    /// The discrete parameter grid.
    pub grid: &'a ParameterGrid,
    /// Run-configuration table (run id -> coefficient triple).
    pub table: &'a ConfigurationTable,
    /// Discovered simulation runs.
    pub catalog: &'a dyn RunCatalog,
    /// Observed series per station.
    pub observations: &'a dyn ObservationSource,
    /// The pluggable error metric.
    pub metric: &'a dyn ErrorMetric,
}

/// Builds or reloads [`ErrorGrid`]s persisted under a cache directory.
///
/// Writing is atomic (temporary file + rename), so a concurrent reader
/// never observes a torn file; concurrent first-time builds of the same
/// key may race and redundantly rebuild, which is idempotent.
#[derive(Debug, Clone)]
pub struct ErrorGridCache {
    dir: PathBuf,
}

impl ErrorGridCache {
    /// Cache rooted at `dir` (created on first use).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The file a key persists to.
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Return the persisted grid for `key`, building and persisting it
    /// first if absent.
    pub fn build_or_load(&self, key: &CacheKey, inputs: &GridInputs<'_>) -> Result<ErrorGrid> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        if path.exists() {
            let grid = load(&path, key)?;
            log::info!("error grid loaded from cache: {}", path.display());
            return Ok(grid);
        }
        let grid = build(key, inputs)?;
        self.persist(&path, &grid)?;
        log::info!("error grid persisted: {}", path.display());
        Ok(grid)
    }

    fn persist(&self, path: &Path, grid: &ErrorGrid) -> Result<()> {
        let json = serde_json::to_string(grid)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(path).map_err(|e| {
            Error::Cache(format!("cannot persist error grid to {}: {e}", path.display()))
        })?;
        Ok(())
    }
}

fn load(path: &Path, key: &CacheKey) -> Result<ErrorGrid> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| Error::Cache(format!("cannot read cached grid {}: {e}", path.display())))?;
    let grid: ErrorGrid = serde_json::from_str(&raw)
        .map_err(|e| Error::Cache(format!("corrupt cached grid {}: {e}", path.display())))?;
    if grid.key != *key {
        return Err(Error::Cache(format!(
            "cached grid {} was built under a different key (found metric={}, stations={:?})",
            path.display(),
            grid.key.metric,
            grid.key.stations
        )));
    }
    let expected = grid.node_count() * grid.station_count();
    if grid.values.len() != expected {
        return Err(Error::Cache(format!(
            "cached grid {} has {} cells, expected {expected}",
            path.display(),
            grid.values.len()
        )));
    }
    Ok(grid)
}

/// Row-major iteration over all grid coordinates.
pub(crate) fn coordinates(
    shape: [usize; DIMENSIONS],
) -> impl Iterator<Item = [usize; DIMENSIONS]> {
    let total: usize = shape.iter().product();
    (0..total).map(move |mut flat| {
        let mut coord = [0usize; DIMENSIONS];
        for d in (0..DIMENSIONS).rev() {
            coord[d] = flat % shape[d];
            flat /= shape[d];
        }
        coord
    })
}

fn build(key: &CacheKey, inputs: &GridInputs<'_>) -> Result<ErrorGrid> {
    let grid = inputs.grid;
    grid.validate_ascending()?;

    // Observation slices, one per requested station.
    let mut observed: Vec<&[f64]> = Vec::with_capacity(key.stations.len());
    for &station in &key.stations {
        let series = inputs.observations.series(station)?;
        let slice = key.range.slice(series);
        if slice.is_empty() {
            return Err(Error::Validation(format!(
                "observation range {:?} selects nothing for station {station}",
                key.range
            )));
        }
        observed.push(slice);
    }

    // Coefficient coordinate -> run id, from the configuration table.
    let mut run_ids: HashMap<[usize; 3], &str> = HashMap::new();
    for row in inputs.table.rows() {
        let coord = [
            grid.index_of(0, row.drf),
            grid.index_of(1, row.cfw),
            grid.index_of(2, row.stpm),
        ];
        let mut resolved = [0usize; 3];
        for (d, idx) in coord.into_iter().enumerate() {
            resolved[d] = idx.map_err(|e| {
                Error::ConfigurationMismatch(format!("configuration row {}: {e}", row.id))
            })?;
        }
        run_ids.insert(resolved, row.id.as_str());
    }

    // (run id, fidelity coordinate) -> run, for the configured noise tag.
    let mut runs: HashMap<(&str, usize, usize), &wf_catalog::RunRecord> = HashMap::new();
    for run in inputs.catalog.runs() {
        if run.noise != key.noise {
            continue;
        }
        let ft = grid.axis(3).index_of(run.fidelity.time);
        let fs = grid.axis(4).index_of(run.fidelity.space);
        if let (Some(ft), Some(fs)) = (ft, fs) {
            runs.insert((run.id.as_str(), ft, fs), run);
        }
    }

    let shape = grid.shape();
    let station_count = key.stations.len();
    let mut values = vec![0.0f64; shape.iter().product::<usize>() * station_count];

    let mut cell = 0usize;
    for coord in coordinates(shape) {
        let run_id = run_ids.get(&[coord[0], coord[1], coord[2]]).ok_or_else(|| {
            Error::ConfigurationMismatch(format!(
                "no configuration row for drf={} cfw={} stpm={}",
                grid.axis_values(0)[coord[0]],
                grid.axis_values(1)[coord[1]],
                grid.axis_values(2)[coord[2]],
            ))
        })?;
        let run = runs.get(&(*run_id, coord[3], coord[4])).ok_or_else(|| {
            Error::ConfigurationMismatch(format!(
                "no run output for id={run_id} fidelity_time={} fidelity_space={} noise={}",
                grid.axis_values(3)[coord[3]],
                grid.axis_values(4)[coord[4]],
                key.noise,
            ))
        })?;

        for (s, &station) in key.stations.iter().enumerate() {
            let simulated = run.series_for(station).ok_or_else(|| {
                Error::ConfigurationMismatch(format!(
                    "run {run_id} has no series for station {station}"
                ))
            })?;
            let error = inputs.metric.evaluate(simulated, observed[s]);
            if !error.is_finite() {
                return Err(Error::Validation(format!(
                    "metric {} is not finite at run {run_id}, station {station}",
                    key.metric
                )));
            }
            values[cell + s] = error;
        }
        cell += station_count;
    }

    log::info!(
        "error grid built: {} nodes x {} stations ({} axes: {:?})",
        values.len() / station_count,
        station_count,
        DIMENSIONS,
        shape
    );

    Ok(ErrorGrid {
        key: key.clone(),
        axes: std::array::from_fn(|d| grid.axis_values(d).to_vec()),
        stations: key.stations.clone(),
        values,
    })
}
