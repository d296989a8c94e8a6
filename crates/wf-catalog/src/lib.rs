//! # wf-catalog
//!
//! The external-collaborator surface the WaveFit evaluator consumes:
//! precomputed simulation runs, the run-configuration table that maps
//! run ids to coefficient triples, and observation time series.
//!
//! Parsing of raw simulation output formats is out of scope here;
//! whatever reads those files populates [`RunRecord`]s and hands them
//! to an [`InMemoryCatalog`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod observations;
pub mod run;
pub mod table;

pub use observations::{InMemoryObservations, ObservationSource, SeriesRange};
pub use run::{Fidelity, InMemoryCatalog, RunCatalog, RunRecord, StationSeries};
pub use table::{ConfigurationRow, ConfigurationTable};
