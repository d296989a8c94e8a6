//! Observation sources and series sub-ranges.

use serde::{Deserialize, Serialize};
use wf_core::{Error, Result};

use crate::run::StationSeries;

/// Which part of each observation series the error metric compares.
///
/// Sub-ranges emulate partial or noisy data (e.g. calibrating against
/// the first half of the observation window only). Participates in the
/// error-grid cache key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SeriesRange {
    /// The whole series.
    Full,
    /// The leading fraction of the series, in (0, 1].
    LeadingFraction(f64),
    /// A half-open index window `[start, end)`.
    Window {
        /// First index included.
        start: usize,
        /// First index excluded.
        end: usize,
    },
}

impl SeriesRange {
    /// Check the range is well-formed.
    pub fn validate(&self) -> Result<()> {
        match *self {
            SeriesRange::Full => Ok(()),
            SeriesRange::LeadingFraction(f) => {
                if f > 0.0 && f <= 1.0 {
                    Ok(())
                } else {
                    Err(Error::Validation(format!(
                        "leading fraction must be in (0, 1], got {f}"
                    )))
                }
            }
            SeriesRange::Window { start, end } => {
                if start < end {
                    Ok(())
                } else {
                    Err(Error::Validation(format!(
                        "series window must be non-empty, got [{start}, {end})"
                    )))
                }
            }
        }
    }

    /// The selected slice of `series`. Windows are clipped to the
    /// series length.
    pub fn slice<'a>(&self, series: &'a [f64]) -> &'a [f64] {
        match *self {
            SeriesRange::Full => series,
            SeriesRange::LeadingFraction(f) => {
                let n = ((series.len() as f64) * f).round() as usize;
                &series[..n.min(series.len())]
            }
            SeriesRange::Window { start, end } => {
                let start = start.min(series.len());
                let end = end.min(series.len());
                &series[start..end]
            }
        }
    }
}

/// Read-only access to observed time series, one per station.
pub trait ObservationSource: Send + Sync {
    /// The observed series for one station.
    fn series(&self, station: u32) -> Result<&[f64]>;
}

/// Observations held in memory, keyed by station id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryObservations {
    stations: Vec<StationSeries>,
}

impl InMemoryObservations {
    /// Wrap per-station observation series.
    pub fn new(stations: Vec<StationSeries>) -> Self {
        Self { stations }
    }
}

impl ObservationSource for InMemoryObservations {
    fn series(&self, station: u32) -> Result<&[f64]> {
        self.stations
            .iter()
            .find(|s| s.station == station)
            .map(|s| s.values.as_slice())
            .ok_or_else(|| {
                Error::Validation(format!("no observation series for station {station}"))
            })
    }
}
