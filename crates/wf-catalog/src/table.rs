//! The run-configuration table.
//!
//! A CSV table mapping run ids to the coefficient triple each run was
//! simulated with. The coefficient axes of the parameter grid are the
//! deduplicated column values of this table, in row order.

use std::path::Path;

use serde::Deserialize;
use wf_core::{Error, Result};

/// One row of the configuration table: a run id and its coefficients.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConfigurationRow {
    /// Run id, referenced by [`crate::RunRecord::id`].
    #[serde(rename = "ID")]
    pub id: String,
    /// Wind drag scaling coefficient.
    #[serde(rename = "DRF")]
    pub drf: f64,
    /// Bottom friction coefficient.
    #[serde(rename = "CFW")]
    pub cfw: f64,
    /// Whitecapping steepness coefficient.
    #[serde(rename = "STPM")]
    pub stpm: f64,
}

/// Ordered run-configuration table.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationTable {
    rows: Vec<ConfigurationRow>,
}

impl ConfigurationTable {
    /// Read the table from a CSV file with ID, DRF, CFW, STPM columns.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path.as_ref()).map_err(|e| {
            Error::Validation(format!(
                "cannot open configuration table {}: {e}",
                path.as_ref().display()
            ))
        })?;
        let mut rows = Vec::new();
        for record in reader.deserialize() {
            let row: ConfigurationRow = record.map_err(|e| {
                Error::Validation(format!(
                    "malformed configuration row in {}: {e}",
                    path.as_ref().display()
                ))
            })?;
            rows.push(row);
        }
        Self::from_rows(rows)
    }

    /// Wrap rows that are already in memory.
    pub fn from_rows(rows: Vec<ConfigurationRow>) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::Validation("configuration table is empty".to_string()));
        }
        for (i, a) in rows.iter().enumerate() {
            if rows[i + 1..].iter().any(|b| b.id == a.id) {
                return Err(Error::Validation(format!("duplicate configuration id {}", a.id)));
            }
        }
        Ok(Self { rows })
    }

    /// Rows in file order.
    pub fn rows(&self) -> &[ConfigurationRow] {
        &self.rows
    }
}
