//! End-to-end tests of the fitness evaluator over a small synthetic
//! grid: two knots per dimension, two stations, forecasts built so the
//! error surface is known analytically.
//!
//! Station 1 forecasts are constant `drf + cfw` against zero
//! observations, so its RMSE error surface is exactly `drf + cfw`;
//! station 2 is constant `1000 * stpm`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use wf_catalog::{
    ConfigurationRow, ConfigurationTable, Fidelity, InMemoryCatalog, InMemoryObservations,
    RunRecord, SeriesRange, StationSeries,
};
use wf_core::{Error, FitnessModel, ParameterVector};
use wf_eval::{ErrorMetric, EvaluatorConfig, FitnessEvaluator, RmseAll, SurrogateConfig};

const DRF: [f64; 2] = [0.2, 0.8];
const CFW: [f64; 2] = [0.1, 0.3];
const STPM: [f64; 2] = [0.001, 0.002];
const FID_TIME: [f64; 2] = [60.0, 120.0];
const FID_SPACE: [f64; 2] = [14.0, 28.0];
const SERIES_LEN: usize = 6;

fn table() -> ConfigurationTable {
    let mut rows = Vec::new();
    let mut id = 0;
    for &drf in &DRF {
        for &cfw in &CFW {
            for &stpm in &STPM {
                rows.push(ConfigurationRow { id: format!("r{id}"), drf, cfw, stpm });
                id += 1;
            }
        }
    }
    ConfigurationTable::from_rows(rows).unwrap()
}

fn runs() -> Vec<RunRecord> {
    let mut out = Vec::new();
    for row in table().rows() {
        for &time in &FID_TIME {
            for &space in &FID_SPACE {
                out.push(RunRecord {
                    id: row.id.clone(),
                    fidelity: Fidelity::new(time, space),
                    noise: 0,
                    series: vec![
                        StationSeries { station: 1, values: vec![row.drf + row.cfw; SERIES_LEN] },
                        StationSeries { station: 2, values: vec![1000.0 * row.stpm; SERIES_LEN] },
                    ],
                });
            }
        }
    }
    out
}

fn observations() -> InMemoryObservations {
    InMemoryObservations::new(vec![
        StationSeries { station: 1, values: vec![0.0; SERIES_LEN] },
        StationSeries { station: 2, values: vec![0.0; SERIES_LEN] },
    ])
}

fn config(cache_dir: &std::path::Path) -> EvaluatorConfig {
    EvaluatorConfig {
        stations: vec![1, 2],
        range: SeriesRange::Full,
        noise: 0,
        cache_dir: cache_dir.to_path_buf(),
        surrogate: None,
    }
}

fn build(cache_dir: &std::path::Path) -> FitnessEvaluator {
    FitnessEvaluator::new(config(cache_dir), &RmseAll, &table(), &catalog(), &observations())
        .unwrap()
}

fn catalog() -> InMemoryCatalog {
    InMemoryCatalog::new(runs()).unwrap()
}

/// Counts metric invocations; reports the same id as `RmseAll` so it
/// shares its cache key.
struct CountingMetric {
    calls: Arc<AtomicUsize>,
}

impl ErrorMetric for CountingMetric {
    fn id(&self) -> &str {
        "rmse_all"
    }

    fn evaluate(&self, simulated: &[f64], observed: &[f64]) -> f64 {
        self.calls.fetch_add(1, Ordering::Relaxed);
        RmseAll.evaluate(simulated, observed)
    }
}

fn all_nodes() -> Vec<ParameterVector> {
    let mut nodes = Vec::new();
    for &drf in &DRF {
        for &cfw in &CFW {
            for &stpm in &STPM {
                for &ft in &FID_TIME {
                    for &fs in &FID_SPACE {
                        nodes.push(ParameterVector::new(drf, cfw, stpm, ft, fs));
                    }
                }
            }
        }
    }
    nodes
}

#[test]
fn interpolation_is_exact_at_every_node() {
    let dir = tempfile::tempdir().unwrap();
    let evaluator = build(dir.path());
    for node in all_nodes() {
        let interpolated = evaluator.evaluate(&node).unwrap();
        let exact = evaluator.evaluate_at_node(&node).unwrap();
        assert_eq!(interpolated, exact, "drift at node {node:?}");
        assert_eq!(interpolated[0], node.drf + node.cfw);
        assert_eq!(interpolated[1], 1000.0 * node.stpm);
    }
}

#[test]
fn center_matches_corner_average() {
    let dir = tempfile::tempdir().unwrap();
    let evaluator = build(dir.path());
    let center = ParameterVector::new(
        (DRF[0] + DRF[1]) / 2.0,
        (CFW[0] + CFW[1]) / 2.0,
        (STPM[0] + STPM[1]) / 2.0,
        (FID_TIME[0] + FID_TIME[1]) / 2.0,
        (FID_SPACE[0] + FID_SPACE[1]) / 2.0,
    );
    let out = evaluator.evaluate(&center).unwrap();
    // Average of the corner values of drf + cfw.
    let expected = (DRF[0] + DRF[1]) / 2.0 + (CFW[0] + CFW[1]) / 2.0;
    assert!((out[0] - expected).abs() < 1e-12, "got {}, expected {expected}", out[0]);
}

#[test]
fn absurd_stpm_clamps_to_grid_maximum() {
    let dir = tempfile::tempdir().unwrap();
    let evaluator = build(dir.path());
    let absurd = ParameterVector::new(0.5, 0.2, 1e9, 90.0, 20.0);
    let at_max = ParameterVector::new(0.5, 0.2, STPM[1], 90.0, 20.0);
    assert_eq!(evaluator.evaluate(&absurd).unwrap(), evaluator.evaluate(&at_max).unwrap());
}

#[test]
fn snap_is_idempotent_and_enables_exact_lookup() {
    let dir = tempfile::tempdir().unwrap();
    let evaluator = build(dir.path());
    let genotype = ParameterVector::new(0.55, 0.12, 0.0016, 100.0, 30.0);

    let snapped = evaluator.snap_to_grid(&genotype);
    assert_eq!(evaluator.snap_to_grid(&snapped), snapped);

    // Off-grid vectors are a lookup miss, snapped ones resolve.
    assert!(matches!(evaluator.evaluate_at_node(&genotype), Err(Error::Lookup(_))));
    let exact = evaluator.evaluate_at_node(&snapped).unwrap();
    assert_eq!(exact[0], snapped.drf + snapped.cfw);
}

#[test]
fn second_build_reuses_cache_without_metric_calls() {
    let dir = tempfile::tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let metric = CountingMetric { calls: calls.clone() };

    let first =
        FitnessEvaluator::new(config(dir.path()), &metric, &table(), &catalog(), &observations())
            .unwrap();
    // 32 nodes x 2 stations.
    assert_eq!(calls.load(Ordering::Relaxed), 64);

    calls.store(0, Ordering::Relaxed);
    let second =
        FitnessEvaluator::new(config(dir.path()), &metric, &table(), &catalog(), &observations())
            .unwrap();
    assert_eq!(calls.load(Ordering::Relaxed), 0, "cached grid must skip recomputation");

    // Reloaded grid is bit-identical at every node.
    for node in all_nodes() {
        assert_eq!(first.evaluate(&node).unwrap(), second.evaluate(&node).unwrap());
    }
}

#[test]
fn corrupt_cache_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    build(dir.path());

    let cached: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().is_some_and(|e| e == "json"))
        .collect();
    assert_eq!(cached.len(), 1);
    std::fs::write(&cached[0], "not json").unwrap();

    let err =
        FitnessEvaluator::new(config(dir.path()), &RmseAll, &table(), &catalog(), &observations())
            .unwrap_err();
    assert!(matches!(err, Error::Cache(_)), "got {err}");
}

#[test]
fn missing_run_output_aborts_construction() {
    let dir = tempfile::tempdir().unwrap();
    let mut partial = runs();
    partial.pop();
    let catalog = InMemoryCatalog::new(partial).unwrap();
    let err = FitnessEvaluator::new(config(dir.path()), &RmseAll, &table(), &catalog, &observations())
        .unwrap_err();
    assert!(matches!(err, Error::ConfigurationMismatch(_)), "got {err}");
}

#[test]
fn missing_configuration_row_aborts_construction() {
    let dir = tempfile::tempdir().unwrap();
    // Drop one coefficient combination; its axis values survive via the
    // other rows, so the grid has a coordinate with no run id.
    let mut rows: Vec<ConfigurationRow> = table().rows().to_vec();
    rows.pop();
    let sparse = ConfigurationTable::from_rows(rows).unwrap();
    let err =
        FitnessEvaluator::new(config(dir.path()), &RmseAll, &sparse, &catalog(), &observations())
            .unwrap_err();
    assert!(matches!(err, Error::ConfigurationMismatch(_)), "got {err}");
}

#[test]
fn distinct_ranges_use_distinct_cache_files() {
    let dir = tempfile::tempdir().unwrap();
    build(dir.path());

    let mut half = config(dir.path());
    half.range = SeriesRange::LeadingFraction(0.5);
    FitnessEvaluator::new(half, &RmseAll, &table(), &catalog(), &observations()).unwrap();

    let cached = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().is_some_and(|e| e == "json"))
        .count();
    assert_eq!(cached, 2);
}

#[test]
fn surrogate_mode_is_deterministic_and_close_to_the_grid() {
    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();
    let surrogate = Some(SurrogateConfig { sample_count: 64, seed: 42 });

    let mut cfg_a = config(dir_a.path());
    cfg_a.surrogate = surrogate;
    let mut cfg_b = config(dir_b.path());
    cfg_b.surrogate = surrogate;

    let a = FitnessEvaluator::new(cfg_a, &RmseAll, &table(), &catalog(), &observations()).unwrap();
    let b = FitnessEvaluator::new(cfg_b, &RmseAll, &table(), &catalog(), &observations()).unwrap();
    assert!(a.uses_surrogate());

    let probe = ParameterVector::new(0.47, 0.22, 0.0013, 80.0, 17.0);
    assert_eq!(a.evaluate(&probe).unwrap(), b.evaluate(&probe).unwrap());

    // The error surface is linear, so the quadratic surrogate should
    // agree with the grid tightly at held-out nodes.
    let grid_backed = build(dir_a.path());
    for node in all_nodes() {
        let predicted = a.evaluate(&node).unwrap();
        let reference = grid_backed.evaluate(&node).unwrap();
        for (p, r) in predicted.iter().zip(&reference) {
            assert!((p - r).abs() < 1e-5, "surrogate {p} vs grid {r}");
        }
    }
}

#[test]
fn population_seeding_is_reusable_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let evaluator = build(dir.path());

    let population = evaluator.sample_population(12, 7).unwrap();
    assert_eq!(population.len(), 12);
    assert_eq!(population, evaluator.sample_population(12, 7).unwrap());

    let path = dir.path().join("population.json");
    wf_eval::save_population(&path, &population).unwrap();
    assert_eq!(wf_eval::load_population(&path).unwrap(), population);
}

#[test]
fn non_finite_query_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let evaluator = build(dir.path());
    let bad = ParameterVector::new(f64::NAN, 0.2, 0.001, 60.0, 14.0);
    assert!(matches!(evaluator.evaluate(&bad), Err(Error::Validation(_))));
}

#[test]
fn station_order_matches_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(dir.path());
    cfg.stations = vec![2, 1];
    let evaluator =
        FitnessEvaluator::new(cfg, &RmseAll, &table(), &catalog(), &observations()).unwrap();
    assert_eq!(evaluator.station_ids(), &[2, 1]);

    let node = ParameterVector::new(DRF[0], CFW[0], STPM[0], FID_TIME[0], FID_SPACE[0]);
    let out = evaluator.evaluate(&node).unwrap();
    assert_eq!(out[0], 1000.0 * STPM[0]);
    assert_eq!(out[1], DRF[0] + CFW[0]);
}
