//! # wf-core
//!
//! Core types for WaveFit, a calibration engine for wave-forecast models.
//!
//! This crate provides:
//! - the error taxonomy shared across the workspace
//! - the five-dimensional [`ParameterVector`] the optimizer evolves
//! - the [`FitnessModel`] trait that decouples the outer search from
//!   the concrete evaluation backend (grid-interpolated or surrogate)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod params;
pub mod traits;

pub use error::{Error, Result};
pub use params::{ParameterVector, DIMENSIONS, DIMENSION_NAMES};
pub use traits::FitnessModel;
