//! Device configuration.
//!
//! The host hands the device a TOML document naming the device and listing
//! its coefficient specs:
//!
//! ```toml
//! name = "heatflow1"
//!
//! [[coeffs]]
//! name = "HFSV"
//! convname = "HFS_conv"
//! coeff = [2, 0, 9200, 0, 0, "W/m2"]
//! ```
//!
//! A trailing string in `coeff` is taken as the unit of the derived value;
//! an explicit `unit` key wins over it.
//!
//! # Example
//! ```
//! use heatflow::config::DeviceConfig;
//!
//! let config = DeviceConfig::from_toml_str(r#"
//!     name = "heatflow1"
//!     [[coeffs]]
//!     name = "hfV"
//!     convname = "hf_conv"
//!     coeff = [2, 0, 9200, 0, 0]
//! "#).unwrap();
//! let calibration = config.calibration().unwrap();
//! assert_eq!(calibration.specs().len(), 1);
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::calibration::{Calibration, CoeffSpec};
use crate::constants::DEFAULT_DEVICE_NAME;
use crate::error::{HeatflowError, Result};

/// One entry of a `coeff` array: a number, or the unit string at the end.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CoeffEntry {
    Number(f64),
    Unit(String),
}

/// A coefficient spec as written in the configuration document
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CoeffSection {
    pub name: String,
    pub convname: Option<String>,
    pub coeff: Vec<CoeffEntry>,
    pub unit: Option<String>,
}

impl CoeffSection {
    /// Resolve into a [`CoeffSpec`]; a missing `convname` or a misplaced
    /// unit string is an error.
    pub fn resolve(&self) -> Result<CoeffSpec> {
        let Some(convname) = self.convname.as_deref() else {
            return Err(HeatflowError::invalid_coeff(&self.name, "missing convname"));
        };

        let mut numbers = Vec::with_capacity(self.coeff.len());
        let mut trailing_unit = None;
        for (i, entry) in self.coeff.iter().enumerate() {
            match entry {
                CoeffEntry::Number(v) => numbers.push(*v),
                CoeffEntry::Unit(u) if i + 1 == self.coeff.len() => {
                    trailing_unit = Some(u.clone())
                }
                CoeffEntry::Unit(u) => {
                    return Err(HeatflowError::invalid_coeff(
                        &self.name,
                        format!("unexpected string {:?} at coeff[{}]", u, i),
                    ));
                }
            }
        }

        let spec = CoeffSpec::new(self.name.as_str(), convname, &numbers)?;
        Ok(match self.unit.clone().or(trailing_unit) {
            Some(unit) => spec.with_unit(unit),
            None => spec,
        })
    }
}

/// Configuration of one heat flow device
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeviceConfig {
    /// Device name attached to every emitted record
    #[serde(default = "default_name")]
    pub name: String,
    /// Coefficient specs, applied in order
    #[serde(default)]
    pub coeffs: Vec<CoeffSection>,
}

fn default_name() -> String {
    DEFAULT_DEVICE_NAME.to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            coeffs: Vec::new(),
        }
    }
}

impl DeviceConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| HeatflowError::Config(e.to_string()))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&content)?;
        log::debug!(
            "Loaded device '{}' with {} coefficient spec(s) from {}",
            config.name,
            config.coeffs.len(),
            path.as_ref().display()
        );
        Ok(config)
    }

    /// Resolve and validate the coefficient list.
    pub fn calibration(&self) -> Result<Calibration> {
        let specs = self
            .coeffs
            .iter()
            .map(CoeffSection::resolve)
            .collect::<Result<Vec<_>>>()?;
        Calibration::new(specs)
    }
}
