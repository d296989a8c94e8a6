//! Latin-hypercube sampling over the parameter space.
//!
//! Samples are drawn from a centered Latin-hypercube design on the
//! 5-dimensional unit cube, then each coordinate is pushed through the
//! inverse CDF of a Gaussian fitted to that dimension's axis (its mean
//! and population standard deviation). This spreads samples to match
//! the physical parameter distribution rather than uniform spacing.
//!
//! The same design feeds surrogate training and initial-population
//! seeding; populations can be persisted so repeated experiment runs
//! reuse an identical starting point.

use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use statrs::distribution::{ContinuousCDF, Normal};
use wf_core::{Error, ParameterVector, Result, DIMENSIONS, DIMENSION_NAMES};

use crate::grid::ParameterGrid;

/// Centered Latin-hypercube design on the unit cube: each dimension is
/// an independent random permutation of the stratum midpoints.
pub(crate) fn centered_lhs(samples: usize, rng: &mut StdRng) -> Vec<[f64; DIMENSIONS]> {
    let mut columns: Vec<Vec<f64>> = Vec::with_capacity(DIMENSIONS);
    for _ in 0..DIMENSIONS {
        let mut midpoints: Vec<f64> =
            (0..samples).map(|k| (k as f64 + 0.5) / samples as f64).collect();
        midpoints.shuffle(rng);
        columns.push(midpoints);
    }
    (0..samples).map(|i| std::array::from_fn(|d| columns[d][i])).collect()
}

/// Gaussian fitted to one axis.
struct AxisDistribution {
    mean: f64,
    normal: Option<Normal>,
}

impl AxisDistribution {
    fn fit(name: &str, values: &[f64]) -> Result<Self> {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
        let std = variance.sqrt();
        // A single-knot axis degenerates to its mean.
        let normal = if std > 0.0 {
            Some(Normal::new(mean, std).map_err(|e| {
                Error::Validation(format!("cannot fit Gaussian to axis {name}: {e}"))
            })?)
        } else {
            None
        };
        Ok(Self { mean, normal })
    }

    fn inverse_cdf(&self, u: f64) -> f64 {
        match &self.normal {
            Some(normal) => normal.inverse_cdf(u),
            None => self.mean,
        }
    }
}

/// Draw `count` parameter vectors via the LHS-plus-inverse-CDF scheme.
///
/// Deterministic for a fixed seed. Samples may fall outside the grid's
/// bounding box (Gaussian tails); evaluation clamps them later.
pub fn sample_parameters(
    grid: &ParameterGrid,
    count: usize,
    seed: u64,
) -> Result<Vec<ParameterVector>> {
    if count == 0 {
        return Err(Error::Validation("sample count must be positive".to_string()));
    }
    let mut distributions = Vec::with_capacity(DIMENSIONS);
    for d in 0..DIMENSIONS {
        distributions.push(AxisDistribution::fit(DIMENSION_NAMES[d], grid.axis_values(d))?);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let design = centered_lhs(count, &mut rng);
    Ok(design
        .into_iter()
        .map(|unit| {
            ParameterVector::from_array(std::array::from_fn(|d| {
                distributions[d].inverse_cdf(unit[d])
            }))
        })
        .collect())
}

/// Persist a population as JSON.
pub fn save_population<P: AsRef<Path>>(path: P, population: &[ParameterVector]) -> Result<()> {
    let json = serde_json::to_string_pretty(population)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Reload a previously persisted population.
pub fn load_population<P: AsRef<Path>>(path: P) -> Result<Vec<ParameterVector>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
