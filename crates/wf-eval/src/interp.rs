//! Multilinear interpolation over the error grid.
//!
//! Queries are clamped into the grid's bounding box first: out-of-range
//! vectors are expected optimizer output and degrade to boundary
//! behavior instead of failing. At a grid node the interpolation
//! weights degenerate to a Kronecker delta, so node queries reproduce
//! the stored cell values exactly.

use wf_core::{Error, ParameterVector, Result, DIMENSIONS};

use crate::cache::ErrorGrid;

/// One dimension of the query: bracketing knot indices and the
/// fractional position between them.
#[derive(Debug, Clone, Copy)]
struct AxisPosition {
    lower: usize,
    upper: usize,
    t: f64,
}

/// Continuous per-station error estimates over a discrete [`ErrorGrid`].
#[derive(Debug, Clone)]
pub struct Interpolator {
    grid: ErrorGrid,
}

impl Interpolator {
    /// Take ownership of a built (or reloaded) grid.
    ///
    /// Fails if any axis is not strictly increasing or any cell is not
    /// finite — a reloaded grid is trusted for content but must at
    /// least be interpolable.
    pub fn new(grid: ErrorGrid) -> Result<Self> {
        for (d, axis) in grid.axes.iter().enumerate() {
            if axis.is_empty() {
                return Err(Error::Validation(format!("grid axis {d} is empty")));
            }
            if axis.windows(2).any(|w| w[0] >= w[1]) {
                return Err(Error::Validation(format!(
                    "grid axis {d} is not strictly increasing"
                )));
            }
        }
        if grid.values.iter().any(|v| !v.is_finite()) {
            return Err(Error::Validation(
                "error grid contains non-finite cells".to_string(),
            ));
        }
        Ok(Self { grid })
    }

    /// The underlying grid.
    pub fn grid(&self) -> &ErrorGrid {
        &self.grid
    }

    /// Per-station interpolated error at an arbitrary parameter vector.
    pub fn evaluate(&self, params: &ParameterVector) -> Vec<f64> {
        let query = params.as_array();
        let positions: [AxisPosition; DIMENSIONS] =
            std::array::from_fn(|d| locate(&self.grid.axes[d], query[d]));

        let station_count = self.grid.station_count();
        let mut out = vec![0.0f64; station_count];

        // 2^5 corners; zero-weight corners are skipped so node queries
        // stay exact.
        for corner in 0u32..(1 << DIMENSIONS) {
            let mut weight = 1.0f64;
            let mut coord = [0usize; DIMENSIONS];
            for (d, pos) in positions.iter().enumerate() {
                if corner & (1 << d) != 0 {
                    weight *= pos.t;
                    coord[d] = pos.upper;
                } else {
                    weight *= 1.0 - pos.t;
                    coord[d] = pos.lower;
                }
            }
            if weight == 0.0 {
                continue;
            }
            let node = self.grid.node_errors(coord);
            for (o, &v) in out.iter_mut().zip(node) {
                *o += weight * v;
            }
        }
        out
    }

    /// The stored (non-interpolated) error vector at an exact grid node.
    ///
    /// Fails with a lookup miss if any component is off-grid; callers
    /// with continuous vectors snap first.
    pub fn evaluate_at_node(&self, params: &ParameterVector) -> Result<Vec<f64>> {
        let query = params.as_array();
        let mut coord = [0usize; DIMENSIONS];
        for d in 0..DIMENSIONS {
            coord[d] = self.grid.axes[d]
                .iter()
                .position(|&v| v == query[d])
                .ok_or_else(|| {
                    Error::Lookup(format!("value {} is not a knot of axis {d}", query[d]))
                })?;
        }
        Ok(self.grid.node_errors(coord).to_vec())
    }
}

/// Clamp `x` onto the axis and find its bracketing interval.
fn locate(axis: &[f64], x: f64) -> AxisPosition {
    let n = axis.len();
    let x = x.clamp(axis[0], axis[n - 1]);
    // Largest knot <= x; axis is strictly increasing.
    let j = axis.partition_point(|&v| v <= x) - 1;
    if j == n - 1 {
        AxisPosition { lower: j, upper: j, t: 0.0 }
    } else {
        AxisPosition { lower: j, upper: j + 1, t: (x - axis[j]) / (axis[j + 1] - axis[j]) }
    }
}
