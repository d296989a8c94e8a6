//! The discrete parameter grid.
//!
//! Each axis holds the distinct values *actually simulated* along one
//! parameter dimension: the three coefficient axes come from the
//! run-configuration table, the two fidelity axes from the runs present
//! in the catalog. Axes preserve first-seen order and serve both as
//! interpolation knots and as nearest-value snap targets.

use wf_catalog::{ConfigurationTable, RunCatalog};
use wf_core::{Error, ParameterVector, Result, DIMENSIONS, DIMENSION_NAMES};

/// Ordered distinct values along one parameter dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct GridAxis {
    values: Vec<f64>,
}

impl GridAxis {
    /// Deduplicate `values` preserving first-seen order.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        let mut unique: Vec<f64> = Vec::new();
        for v in values {
            if !unique.contains(&v) {
                unique.push(v);
            }
        }
        Self { values: unique }
    }

    /// The axis values, in insertion order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of knots.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the axis is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Exact-match index of `value`. Used only for values that are
    /// known to come from the axis itself (table rows, snapped vectors).
    pub fn index_of(&self, value: f64) -> Option<usize> {
        self.values.iter().position(|&v| v == value)
    }

    /// The axis value closest to `value`; ties go to the earlier knot.
    pub fn nearest(&self, value: f64) -> f64 {
        let mut best = self.values[0];
        let mut best_dist = (best - value).abs();
        for &v in &self.values[1..] {
            let dist = (v - value).abs();
            if dist < best_dist {
                best = v;
                best_dist = dist;
            }
        }
        best
    }

    /// Clamp `value` into the axis bounding interval.
    pub fn clamp(&self, value: f64) -> f64 {
        let (lo, hi) = self.bounds();
        value.clamp(lo, hi)
    }

    /// Minimum and maximum knot values.
    pub fn bounds(&self) -> (f64, f64) {
        let mut lo = self.values[0];
        let mut hi = self.values[0];
        for &v in &self.values[1..] {
            lo = lo.min(v);
            hi = hi.max(v);
        }
        (lo, hi)
    }

    /// Interpolation requires strictly increasing knots.
    fn is_strictly_increasing(&self) -> bool {
        self.values.windows(2).all(|w| w[0] < w[1])
    }
}

/// The five axes of the parameter space, in the fixed dimension order
/// of [`DIMENSION_NAMES`].
#[derive(Debug, Clone)]
pub struct ParameterGrid {
    axes: [GridAxis; DIMENSIONS],
}

impl ParameterGrid {
    /// Derive the grid from the configuration table (coefficient axes)
    /// and the run catalog (fidelity axes).
    pub fn from_catalog(table: &ConfigurationTable, catalog: &dyn RunCatalog) -> Result<Self> {
        let rows = table.rows();
        let axes = [
            GridAxis::from_values(rows.iter().map(|r| r.drf)),
            GridAxis::from_values(rows.iter().map(|r| r.cfw)),
            GridAxis::from_values(rows.iter().map(|r| r.stpm)),
            GridAxis::from_values(catalog.runs().iter().map(|r| r.fidelity.time)),
            GridAxis::from_values(catalog.runs().iter().map(|r| r.fidelity.space)),
        ];
        Self::from_axes(axes)
    }

    /// Build directly from axes.
    pub fn from_axes(axes: [GridAxis; DIMENSIONS]) -> Result<Self> {
        for (axis, name) in axes.iter().zip(DIMENSION_NAMES) {
            if axis.is_empty() {
                return Err(Error::Validation(format!("grid axis {name} has no values")));
            }
        }
        Ok(Self { axes })
    }

    /// One axis.
    pub fn axis(&self, dimension: usize) -> &GridAxis {
        &self.axes[dimension]
    }

    /// The distinct values along one dimension, in insertion order.
    pub fn axis_values(&self, dimension: usize) -> &[f64] {
        self.axes[dimension].values()
    }

    /// Shape of the dense grid (knots per dimension).
    pub fn shape(&self) -> [usize; DIMENSIONS] {
        std::array::from_fn(|d| self.axes[d].len())
    }

    /// Exact-match index along one dimension.
    ///
    /// Fails loudly on a miss: exact lookup is only valid for values
    /// that came from the grid, callers with off-grid vectors must use
    /// [`ParameterGrid::snap`] first.
    pub fn index_of(&self, dimension: usize, value: f64) -> Result<usize> {
        self.axes[dimension].index_of(value).ok_or_else(|| {
            Error::Lookup(format!(
                "value {value} is not a knot of axis {}",
                DIMENSION_NAMES[dimension]
            ))
        })
    }

    /// Grid coordinate of an exactly on-grid vector.
    pub fn coordinate_of(&self, params: &ParameterVector) -> Result<[usize; DIMENSIONS]> {
        let values = params.as_array();
        let mut coord = [0usize; DIMENSIONS];
        for d in 0..DIMENSIONS {
            coord[d] = self.index_of(d, values[d])?;
        }
        Ok(coord)
    }

    /// Snap every component to the closest actually-simulated value.
    pub fn snap(&self, params: &ParameterVector) -> ParameterVector {
        let values = params.as_array();
        ParameterVector::from_array(std::array::from_fn(|d| self.axes[d].nearest(values[d])))
    }

    /// Clamp every component into the grid's bounding box.
    pub fn clamp(&self, params: &ParameterVector) -> ParameterVector {
        let values = params.as_array();
        ParameterVector::from_array(std::array::from_fn(|d| self.axes[d].clamp(values[d])))
    }

    /// Interpolation and the Gaussian sampling map assume ascending
    /// knots; reject grids where discovery order broke that.
    pub fn validate_ascending(&self) -> Result<()> {
        for (axis, name) in self.axes.iter().zip(DIMENSION_NAMES) {
            if !axis.is_strictly_increasing() {
                return Err(Error::Validation(format!(
                    "axis {name} is not strictly increasing: {:?}",
                    axis.values()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis(values: &[f64]) -> GridAxis {
        GridAxis::from_values(values.iter().copied())
    }

    fn toy_grid() -> ParameterGrid {
        ParameterGrid::from_axes([
            axis(&[0.2, 0.4, 0.6]),
            axis(&[0.005, 0.01]),
            axis(&[0.001, 0.0025]),
            axis(&[60.0, 120.0]),
            axis(&[14.0, 28.0]),
        ])
        .unwrap()
    }

    #[test]
    fn dedup_preserves_insertion_order() {
        let a = axis(&[0.4, 0.2, 0.4, 0.2, 0.6]);
        assert_eq!(a.values(), &[0.4, 0.2, 0.6]);
    }

    #[test]
    fn index_of_exact_only() {
        let grid = toy_grid();
        assert_eq!(grid.index_of(0, 0.4).unwrap(), 1);
        assert!(matches!(grid.index_of(0, 0.41), Err(Error::Lookup(_))));
    }

    #[test]
    fn nearest_tie_goes_to_first_knot() {
        let a = axis(&[1.0, 3.0]);
        // 2.0 is equidistant; the earlier knot wins.
        assert_eq!(a.nearest(2.0), 1.0);
        assert_eq!(a.nearest(2.5), 3.0);
    }

    #[test]
    fn snap_is_idempotent() {
        let grid = toy_grid();
        let p = ParameterVector::new(0.31, 0.02, 0.0009, 100.0, 1e6);
        let snapped = grid.snap(&p);
        assert_eq!(grid.snap(&snapped), snapped);
        assert_eq!(snapped.drf, 0.4);
        assert_eq!(snapped.fidelity_space, 28.0);
    }

    #[test]
    fn clamp_into_bounding_box() {
        let grid = toy_grid();
        let p = ParameterVector::new(-5.0, 0.007, 1e9, 60.0, 20.0);
        let c = grid.clamp(&p);
        assert_eq!(c.drf, 0.2);
        assert_eq!(c.cfw, 0.007);
        assert_eq!(c.stpm, 0.0025);
        assert_eq!(c.fidelity_space, 20.0);
    }

    #[test]
    fn unsorted_axis_fails_ascending_check() {
        let grid = ParameterGrid::from_axes([
            axis(&[0.4, 0.2]),
            axis(&[0.005]),
            axis(&[0.001]),
            axis(&[60.0]),
            axis(&[14.0]),
        ])
        .unwrap();
        assert!(grid.validate_ascending().is_err());
    }

    #[test]
    fn empty_axis_rejected() {
        let result = ParameterGrid::from_axes([
            axis(&[0.2]),
            axis(&[0.005]),
            axis(&[0.001]),
            axis(&[]),
            axis(&[14.0]),
        ]);
        assert!(result.is_err());
    }
}
