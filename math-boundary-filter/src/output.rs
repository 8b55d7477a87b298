//! JSON export of synthesized coefficients for the wave simulator

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::oblique::IncidenceDirection;
use crate::pipeline::BoundaryFilter;
use crate::transfer_function::TransferFunction;

/// Filter taps of one surface for one direction of incidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoefficientExport {
    /// Surface (material) name
    pub surface: String,
    /// Sample rate in Hz
    pub sample_rate: f64,
    /// Azimuth in radians
    pub azimuth: f64,
    /// Elevation in radians
    pub elevation: f64,
    /// Numerator taps, highest power first
    pub numerator: Vec<f64>,
    /// Denominator taps, `denominator[0] == 1`
    pub denominator: Vec<f64>,
}

impl CoefficientExport {
    /// Wrap a transfer function
    pub fn new(
        surface: impl Into<String>,
        sample_rate: f64,
        direction: IncidenceDirection,
        tf: &TransferFunction,
    ) -> Self {
        Self {
            surface: surface.into(),
            sample_rate,
            azimuth: direction.azimuth,
            elevation: direction.elevation,
            numerator: tf.numerator().to_vec(),
            denominator: tf.denominator().to_vec(),
        }
    }

    /// Derive and export the verified reflection filter of `filter` for `direction`
    pub fn from_filter(
        surface: impl Into<String>,
        filter: &BoundaryFilter,
        direction: IncidenceDirection,
    ) -> Result<Self> {
        let tf = filter.at_direction(direction)?;
        Ok(Self::new(surface, filter.sample_rate, direction, &tf))
    }

    /// The exported taps as a transfer function
    pub fn to_transfer_function(&self) -> Result<TransferFunction> {
        TransferFunction::new(self.numerator.clone(), self.denominator.clone())
    }
}

/// Exported filters keyed by surface name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoefficientSet {
    /// Every exported direction of each surface
    pub surfaces: BTreeMap<String, Vec<CoefficientExport>>,
}

impl CoefficientSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one export under its surface name
    pub fn insert(&mut self, export: CoefficientExport) {
        self.surfaces
            .entry(export.surface.clone())
            .or_default()
            .push(export);
    }

    /// Export every successful filter of a batch for each of `directions`.
    ///
    /// Failed surfaces are skipped; the first error met while deriving an
    /// oblique filter is returned.
    pub fn from_batch(
        results: &[(String, Result<BoundaryFilter>)],
        directions: &[IncidenceDirection],
    ) -> Result<Self> {
        let mut set = Self::new();
        for (name, result) in results {
            let Ok(filter) = result else {
                continue;
            };
            for &direction in directions {
                set.insert(CoefficientExport::from_filter(name.as_str(), filter, direction)?);
            }
        }
        Ok(set)
    }

    /// Exports for one surface
    pub fn get(&self, surface: &str) -> Option<&[CoefficientExport]> {
        self.surfaces.get(surface).map(Vec::as_slice)
    }

    /// Number of surfaces
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    /// `true` when nothing has been exported
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// Pretty printed JSON
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a set written by [`Self::to_json_string`]
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the set to a JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}
