//! Per-station regression surrogates.
//!
//! When exhaustive grid evaluation is too expensive, the evaluator can
//! train one quadratic polynomial model per station on a Latin-
//! hypercube sample of interpolated grid errors, and answer queries
//! from the fitted models instead. Surrogates are trained once at
//! construction and immutable afterwards; they are only valid inside
//! the bounding box of the axes they were trained on, and queries are
//! clamped exactly like interpolation queries.
//!
//! Surrogate/grid parity is not assumed: [`SurrogateSet::agreement_rmse`]
//! measures it at caller-chosen points.

use nalgebra::{DMatrix, DVector};
use wf_core::{Error, ParameterVector, Result, DIMENSIONS};

use crate::grid::ParameterGrid;
use crate::interp::Interpolator;
use crate::sampling::sample_parameters;

/// Quadratic polynomial in 5 standardized inputs: intercept, linear
/// terms, and all second-order products.
const N_FEATURES: usize = 1 + DIMENSIONS + DIMENSIONS * (DIMENSIONS + 1) / 2;

/// Input standardization fitted to the grid axes; raw parameter scales
/// span six orders of magnitude, which would wreck the least-squares
/// conditioning.
#[derive(Debug, Clone)]
struct Standardizer {
    mean: [f64; DIMENSIONS],
    scale: [f64; DIMENSIONS],
}

impl Standardizer {
    fn fit(grid: &ParameterGrid) -> Self {
        let mut mean = [0.0; DIMENSIONS];
        let mut scale = [1.0; DIMENSIONS];
        for d in 0..DIMENSIONS {
            let values = grid.axis_values(d);
            let n = values.len() as f64;
            mean[d] = values.iter().sum::<f64>() / n;
            let variance =
                values.iter().map(|v| (v - mean[d]) * (v - mean[d])).sum::<f64>() / n;
            let std = variance.sqrt();
            if std > 0.0 {
                scale[d] = std;
            }
        }
        Self { mean, scale }
    }

    fn standardize(&self, raw: [f64; DIMENSIONS]) -> [f64; DIMENSIONS] {
        std::array::from_fn(|d| (raw[d] - self.mean[d]) / self.scale[d])
    }
}

fn features(z: [f64; DIMENSIONS]) -> [f64; N_FEATURES] {
    let mut out = [0.0; N_FEATURES];
    out[0] = 1.0;
    out[1..1 + DIMENSIONS].copy_from_slice(&z);
    let mut k = 1 + DIMENSIONS;
    for i in 0..DIMENSIONS {
        for j in i..DIMENSIONS {
            out[k] = z[i] * z[j];
            k += 1;
        }
    }
    out
}

/// Fitted model for one station.
#[derive(Debug, Clone)]
struct StationSurrogate {
    weights: [f64; N_FEATURES],
}

impl StationSurrogate {
    fn predict(&self, phi: &[f64; N_FEATURES]) -> f64 {
        phi.iter().zip(&self.weights).map(|(&x, &w)| x * w).sum()
    }
}

/// One trained regression surrogate per station.
#[derive(Debug, Clone)]
pub struct SurrogateSet {
    stations: Vec<u32>,
    bounds: [(f64, f64); DIMENSIONS],
    standardizer: Standardizer,
    models: Vec<StationSurrogate>,
    sample_count: usize,
}

impl SurrogateSet {
    /// Fit surrogates on `sample_count` Latin-hypercube design points
    /// labeled by the interpolator.
    ///
    /// `sample_count` is deliberately required: too few samples relative
    /// to the 21 polynomial coefficients gives a poorly conditioned
    /// fit, more samples cost more interpolator evaluations. Counts
    /// below the coefficient count are rejected outright.
    pub fn train(
        interpolator: &Interpolator,
        grid: &ParameterGrid,
        sample_count: usize,
        seed: u64,
    ) -> Result<Self> {
        if sample_count < N_FEATURES {
            return Err(Error::Validation(format!(
                "surrogate training needs at least {N_FEATURES} samples \
                 (one per polynomial coefficient), got {sample_count}"
            )));
        }
        let stations = interpolator.grid().stations.clone();
        let standardizer = Standardizer::fit(grid);
        let bounds: [(f64, f64); DIMENSIONS] = std::array::from_fn(|d| grid.axis(d).bounds());

        // Design points are clamped before labeling, so features and
        // labels describe the same point.
        let samples = sample_parameters(grid, sample_count, seed)?;
        let mut design = DMatrix::zeros(sample_count, N_FEATURES);
        let mut labels = vec![DVector::zeros(sample_count); stations.len()];
        for (row, sample) in samples.iter().enumerate() {
            let clamped = grid.clamp(sample);
            let phi = features(standardizer.standardize(clamped.as_array()));
            for (col, &v) in phi.iter().enumerate() {
                design[(row, col)] = v;
            }
            let errors = interpolator.evaluate(&clamped);
            for (s, &e) in errors.iter().enumerate() {
                labels[s][row] = e;
            }
        }

        let svd = design.svd(true, true);
        let mut models = Vec::with_capacity(stations.len());
        for (s, y) in labels.iter().enumerate() {
            let solution = svd.solve(y, 1e-12).map_err(|e| {
                Error::Validation(format!(
                    "surrogate least-squares failed for station {}: {e}",
                    stations[s]
                ))
            })?;
            let mut weights = [0.0; N_FEATURES];
            for (w, &v) in weights.iter_mut().zip(solution.as_slice()) {
                *w = v;
            }
            models.push(StationSurrogate { weights });
        }

        log::info!(
            "surrogates trained: {} stations, {} samples, {} coefficients each",
            stations.len(),
            sample_count,
            N_FEATURES
        );

        Ok(Self { stations, bounds, standardizer, models, sample_count })
    }

    /// Stations, in output order.
    pub fn stations(&self) -> &[u32] {
        &self.stations
    }

    /// Number of design points the set was trained on.
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Per-station predicted error for a query vector.
    pub fn predict(&self, params: &ParameterVector) -> Vec<f64> {
        let raw = params.as_array();
        let clamped: [f64; DIMENSIONS] =
            std::array::from_fn(|d| raw[d].clamp(self.bounds[d].0, self.bounds[d].1));
        let phi = features(self.standardizer.standardize(clamped));
        self.models.iter().map(|m| m.predict(&phi)).collect()
    }

    /// Per-station RMSE between surrogate predictions and interpolated
    /// grid values at the given points.
    pub fn agreement_rmse(
        &self,
        interpolator: &Interpolator,
        points: &[ParameterVector],
    ) -> Vec<f64> {
        let mut sums = vec![0.0f64; self.stations.len()];
        for p in points {
            let predicted = self.predict(p);
            let reference = interpolator.evaluate(p);
            for (sum, (a, b)) in sums.iter_mut().zip(predicted.iter().zip(&reference)) {
                let d = a - b;
                *sum += d * d;
            }
        }
        let n = points.len().max(1) as f64;
        sums.into_iter().map(|s| (s / n).sqrt()).collect()
    }
}
