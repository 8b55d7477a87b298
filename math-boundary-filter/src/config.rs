//! JSON configuration for boundary filter design and material presets

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{BoundaryFilterError, Result};
use crate::surface::SurfaceDescriptor;
use crate::{BAND_EDGES_HZ, BIQUAD_SECTIONS, DESIGN_Q, SRATE};

/// Band layout used to turn a surface into peaking sections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDesign {
    /// Frequency band edges in Hz, strictly increasing
    #[serde(default = "default_band_edges")]
    pub band_edges_hz: Vec<f64>,
    /// Q factor of every section
    #[serde(default = "default_q")]
    pub q: f64,
    /// Number of peaking sections (one per band, starting at the lowest)
    #[serde(default = "default_sections")]
    pub sections: usize,
}

fn default_band_edges() -> Vec<f64> {
    BAND_EDGES_HZ.to_vec()
}

fn default_q() -> f64 {
    DESIGN_Q
}

fn default_sections() -> usize {
    BIQUAD_SECTIONS
}

fn default_sample_rate() -> f64 {
    SRATE
}

impl Default for FilterDesign {
    fn default() -> Self {
        Self {
            band_edges_hz: default_band_edges(),
            q: default_q(),
            sections: default_sections(),
        }
    }
}

impl FilterDesign {
    /// Number of bands described by the edge table
    pub fn bands(&self) -> usize {
        self.band_edges_hz.len().saturating_sub(1)
    }

    /// Centre frequency of band `i`: the midpoint of its two edges
    pub fn centre(&self, band: usize) -> f64 {
        (self.band_edges_hz[band] + self.band_edges_hz[band + 1]) * 0.5
    }

    /// Check that the layout can be synthesized at all
    pub fn validate(&self) -> Result<()> {
        if self.band_edges_hz.len() < 2 {
            return Err(BoundaryFilterError::invalid(
                "band_edges_hz",
                self.band_edges_hz.len() as f64,
                "need at least two band edges",
            ));
        }
        if let Some(&bad) = self
            .band_edges_hz
            .iter()
            .find(|e| !e.is_finite() || **e <= 0.0)
        {
            return Err(BoundaryFilterError::invalid(
                "band_edges_hz",
                bad,
                "band edges must be positive and finite",
            ));
        }
        if let Some(pair) = self.band_edges_hz.windows(2).find(|w| w[1] <= w[0]) {
            return Err(BoundaryFilterError::invalid(
                "band_edges_hz",
                pair[1],
                "band edges must be strictly increasing",
            ));
        }
        if self.q <= 0.0 || !self.q.is_finite() {
            return Err(BoundaryFilterError::invalid(
                "q",
                self.q,
                "must be > 0 and finite",
            ));
        }
        if self.sections == 0 || self.sections > self.bands() {
            return Err(BoundaryFilterError::invalid(
                "sections",
                self.sections as f64,
                "must be between 1 and the number of bands",
            ));
        }
        Ok(())
    }

    /// Load a design from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let design: FilterDesign = serde_json::from_str(json)?;
        design.validate()?;
        Ok(design)
    }

    /// Load a design from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Save the design to a JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// A named material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfacePreset {
    /// Material name, used as the export key
    pub name: String,
    /// Absorption per band
    pub surface: SurfaceDescriptor,
}

impl SurfacePreset {
    /// Create a preset
    pub fn new(name: impl Into<String>, surface: SurfaceDescriptor) -> Self {
        Self {
            name: name.into(),
            surface,
        }
    }
}

/// A set of material presets sharing one design and sample rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetLibrary {
    /// Sample rate of the simulation in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f64,
    /// Band layout
    #[serde(default)]
    pub design: FilterDesign,
    /// Materials
    pub presets: Vec<SurfacePreset>,
}

impl PresetLibrary {
    /// Load a library from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let library: PresetLibrary = serde_json::from_str(json)?;
        library.design.validate()?;
        if library.sample_rate <= 0.0 || !library.sample_rate.is_finite() {
            return Err(BoundaryFilterError::invalid(
                "sample_rate",
                library.sample_rate,
                "must be > 0 and finite",
            ));
        }
        Ok(library)
    }

    /// Load a library from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Save the library to a JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Look up a preset by name
    pub fn get(&self, name: &str) -> Option<&SurfacePreset> {
        self.presets.iter().find(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_design_is_valid() {
        let design = FilterDesign::default();
        design.validate().unwrap();
        assert_eq!(design.bands(), 8);
        assert_eq!(design.centre(0), 107.5);
        assert_eq!(design.centre(2), 525.0);
    }

    #[test]
    fn test_design_defaults_from_empty_json() {
        let design = FilterDesign::from_json_str("{}").unwrap();
        assert_eq!(design, FilterDesign::default());
    }

    #[test]
    fn test_design_rejects_unsorted_edges() {
        let err = FilterDesign::from_json_str(r#"{"band_edges_hz": [100.0, 50.0, 200.0]}"#)
            .unwrap_err();
        assert!(err.is_parameter_error());
    }

    #[test]
    fn test_design_rejects_too_many_sections() {
        let design = FilterDesign {
            band_edges_hz: vec![100.0, 200.0, 400.0],
            q: 1.0,
            sections: 3,
        };
        assert!(design.validate().is_err());
    }

    #[test]
    fn test_design_rejects_bad_q() {
        let design = FilterDesign {
            q: 0.0,
            ..FilterDesign::default()
        };
        assert!(design.validate().is_err());
    }

    #[test]
    fn test_library_from_json() {
        let json = r#"{
            "sample_rate": 48000.0,
            "presets": [
                {"name": "carpet", "surface": {"specular": [0.1, 0.2, 0.3], "diffuse": [0.1, 0.2, 0.3]}},
                {"name": "plaster", "surface": {"specular": [0.02, 0.02, 0.03], "diffuse": [0.02, 0.02, 0.03]}}
            ]
        }"#;
        let library = PresetLibrary::from_json_str(json).unwrap();
        assert_eq!(library.sample_rate, 48000.0);
        assert_eq!(library.design, FilterDesign::default());
        assert_eq!(library.presets.len(), 2);
        assert!(library.get("plaster").is_some());
        assert!(library.get("glass").is_none());
    }

    #[test]
    fn test_library_rejects_invalid_surface() {
        let json = r#"{"presets": [{"name": "bad", "surface": {"specular": [1.5], "diffuse": [0.1]}}]}"#;
        assert!(PresetLibrary::from_json_str(json).is_err());
    }

    #[test]
    fn test_library_file_roundtrip() {
        let library = PresetLibrary {
            sample_rate: SRATE,
            design: FilterDesign::default(),
            presets: vec![SurfacePreset::new(
                "uniform",
                SurfaceDescriptor::uniform(0.5, 8).unwrap(),
            )],
        };
        let path = std::env::temp_dir().join(format!(
            "boundary_filter_library_{}.json",
            std::process::id()
        ));
        library.to_file(&path).unwrap();
        let loaded = PresetLibrary::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, library);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = FilterDesign::from_file("/nonexistent/boundary/design.json").unwrap_err();
        assert!(matches!(err, BoundaryFilterError::Io(_)));
    }
}
