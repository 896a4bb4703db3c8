//! Coefficient based conversion of parsed sensor fields.
//!
//! A [`CoeffSpec`] maps one source field of a [`ParsedRecord`] to one derived
//! field. The transform is selected by the first coefficient:
//!
//! - `2`: cubic polynomial, `y = c0 + c1·x + c2·x² + c3·x³`
//! - anything else: unsupported, evaluates to NaN
//!
//! Specs are validated once, when a [`Calibration`] is built, so per-record
//! application cannot fail.

use std::collections::HashSet;
use std::sync::Arc;

use crate::constants::{POLYNOMIAL_COEFF_LEN, POLYNOMIAL_KIND};
use crate::error::{HeatflowError, Result};
use crate::sentence::{ParsedRecord, RECORD_KEYS, TEXT_KEYS};

/// Conversion applied to a source value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    /// Polynomial constants `[c0, c1, c2, c3]`
    Polynomial([f64; 4]),
    /// Transform kind with no implementation; always yields NaN
    Unsupported { kind: f64 },
}

impl Transform {
    /// Build a transform from a raw coefficient list, `coeff[0]` being the kind.
    ///
    /// Entries after the fifth are ignored for polynomials.
    pub fn from_coeffs(coeff: &[f64]) -> std::result::Result<Self, String> {
        let Some(&kind) = coeff.first() else {
            return Err("coefficient list is empty".to_string());
        };

        if kind == POLYNOMIAL_KIND {
            if coeff.len() < POLYNOMIAL_COEFF_LEN {
                return Err(format!(
                    "polynomial needs {} coefficients, got {}",
                    POLYNOMIAL_COEFF_LEN,
                    coeff.len()
                ));
            }
            Ok(Self::Polynomial([coeff[1], coeff[2], coeff[3], coeff[4]]))
        } else {
            Ok(Self::Unsupported { kind })
        }
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        match self {
            Self::Polynomial(c) => c[0] + x * c[1] + x.powi(2) * c[2] + x.powi(3) * c[3],
            Self::Unsupported { .. } => f64::NAN,
        }
    }
}

/// A named rule converting one parsed field into one derived field
#[derive(Debug, Clone, PartialEq)]
pub struct CoeffSpec {
    /// Source field
    pub name: String,
    /// Destination field
    pub convname: String,
    pub transform: Transform,
    /// Unit of the derived value, if known
    pub unit: Option<String>,
}

impl CoeffSpec {
    pub fn new(
        name: impl Into<String>,
        convname: impl Into<String>,
        coeff: &[f64],
    ) -> Result<Self> {
        let name = name.into();
        let convname = convname.into();

        if name.is_empty() {
            return Err(HeatflowError::invalid_coeff(&name, "source name is empty"));
        }
        if convname.is_empty() {
            return Err(HeatflowError::invalid_coeff(&name, "convname is empty"));
        }
        let transform = Transform::from_coeffs(coeff)
            .map_err(|reason| HeatflowError::invalid_coeff(&name, reason))?;

        Ok(Self {
            name,
            convname,
            transform,
            unit: None,
        })
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

/// A value computed by a [`CoeffSpec`]
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedValue {
    pub name: String,
    pub value: f64,
    pub unit: Option<String>,
}

/// A validated, read-only coefficient list.
///
/// Cloning shares the underlying list, so one `Calibration` can be handed to
/// any number of worker threads.
#[derive(Debug, Clone, Default)]
pub struct Calibration {
    specs: Arc<[CoeffSpec]>,
}

impl Calibration {
    /// Validate a coefficient list.
    ///
    /// Rejects a source `name` that is a text field, and a `convname` that is
    /// also some spec's source `name`, that shadows a parsed record key, or
    /// that appears twice.
    pub fn new(specs: Vec<CoeffSpec>) -> Result<Self> {
        let sources: HashSet<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        let mut destinations = HashSet::new();

        for spec in &specs {
            if TEXT_KEYS.contains(&spec.name.as_str()) {
                return Err(HeatflowError::invalid_coeff(
                    &spec.name,
                    "source is a text field, not a number",
                ));
            }
            if sources.contains(spec.convname.as_str()) {
                return Err(HeatflowError::invalid_coeff(
                    &spec.name,
                    format!("convname '{}' is used as a source name", spec.convname),
                ));
            }
            if RECORD_KEYS.contains(&spec.convname.as_str()) {
                return Err(HeatflowError::invalid_coeff(
                    &spec.name,
                    format!("convname '{}' shadows a sentence field", spec.convname),
                ));
            }
            if !destinations.insert(spec.convname.as_str()) {
                return Err(HeatflowError::invalid_coeff(
                    &spec.name,
                    format!("convname '{}' is defined twice", spec.convname),
                ));
            }
        }

        Ok(Self {
            specs: specs.into(),
        })
    }

    pub fn specs(&self) -> &[CoeffSpec] {
        &self.specs
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Compute the derived values for a record, in list order.
    ///
    /// Specs whose source field is absent from the record are skipped.
    pub fn derive(&self, record: &ParsedRecord) -> Vec<DerivedValue> {
        self.specs
            .iter()
            .filter_map(|spec| {
                let Some(x) = record.value(&spec.name) else {
                    log::trace!(
                        "{}: no field '{}' in record, skipped",
                        spec.convname,
                        spec.name
                    );
                    return None;
                };
                Some(DerivedValue {
                    name: spec.convname.clone(),
                    value: spec.transform.evaluate(x),
                    unit: spec.unit.clone(),
                })
            })
            .collect()
    }

    pub fn apply(&self, record: ParsedRecord) -> CalibratedRecord {
        let derived = self.derive(&record);
        CalibratedRecord { record, derived }
    }
}

/// A parsed record together with its derived values
#[derive(Debug, Clone, PartialEq)]
pub struct CalibratedRecord {
    pub record: ParsedRecord,
    pub derived: Vec<DerivedValue>,
}

impl CalibratedRecord {
    /// Wrap a record with no derived values
    pub fn uncalibrated(record: ParsedRecord) -> Self {
        Self {
            record,
            derived: Vec::new(),
        }
    }

    /// Apply another calibration. Derived values with the same name are
    /// replaced; parsed fields are never modified.
    pub fn recalibrate(&mut self, calibration: &Calibration) {
        for value in calibration.derive(&self.record) {
            match self.derived.iter_mut().find(|d| d.name == value.name) {
                Some(existing) => *existing = value,
                None => self.derived.push(value),
            }
        }
    }

    pub fn derived_value(&self, name: &str) -> Option<f64> {
        self.derived.iter().find(|d| d.name == name).map(|d| d.value)
    }

    /// Derived values are looked up before parsed fields.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.derived_value(name).or_else(|| self.record.value(name))
    }
}
