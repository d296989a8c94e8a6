//! The calibrated parameter vector.
//!
//! Five continuous dimensions: three physical coefficients of the wave
//! model plus two fidelity knobs that control simulation resolution.
//! Vectors have value semantics — crossover and mutation in the outer
//! optimizer produce new vectors rather than mutating shared instances.

use serde::{Deserialize, Serialize};

/// Number of free parameters under calibration.
pub const DIMENSIONS: usize = 5;

/// Dimension names, in the fixed axis order used everywhere in WaveFit.
pub const DIMENSION_NAMES: [&str; DIMENSIONS] =
    ["drf", "cfw", "stpm", "fidelity_time", "fidelity_space"];

/// A candidate configuration of the wave model.
///
/// Immutable for the duration of an evaluation; the evaluator treats
/// every vector it receives as a value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterVector {
    /// Wind drag scaling coefficient.
    pub drf: f64,
    /// Bottom friction coefficient.
    pub cfw: f64,
    /// Whitecapping steepness coefficient.
    pub stpm: f64,
    /// Simulation time step, minutes (fidelity knob).
    pub fidelity_time: f64,
    /// Spatial grid resolution (fidelity knob).
    pub fidelity_space: f64,
}

impl ParameterVector {
    /// Create a vector from explicit components.
    pub fn new(drf: f64, cfw: f64, stpm: f64, fidelity_time: f64, fidelity_space: f64) -> Self {
        Self { drf, cfw, stpm, fidelity_time, fidelity_space }
    }

    /// The model's published default physical coefficients, at the
    /// coarsest fidelity. Used as the baseline configuration.
    pub fn reference() -> Self {
        Self::new(1.0, 0.015, 0.00302, 60.0, 14.0)
    }

    /// Components in the fixed axis order of [`DIMENSION_NAMES`].
    pub fn as_array(&self) -> [f64; DIMENSIONS] {
        [self.drf, self.cfw, self.stpm, self.fidelity_time, self.fidelity_space]
    }

    /// Build a vector from components in the fixed axis order.
    pub fn from_array(values: [f64; DIMENSIONS]) -> Self {
        Self::new(values[0], values[1], values[2], values[3], values[4])
    }

    /// Component along one axis.
    pub fn component(&self, dimension: usize) -> f64 {
        self.as_array()[dimension]
    }
}
