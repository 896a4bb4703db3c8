//! Fixed values of the sensor sentence grammar and the ingestion loop.

use std::time::Duration;

/// Number of comma separated fields in a complete sentence.
/// Sentences carrying more fields are accepted; the surplus is ignored.
pub const SENTENCE_FIELD_COUNT: usize = 17;

/// Field separator. Never appears inside a field.
pub const FIELD_SEPARATOR: char = ',';

/// `coeff[0]` value selecting the cubic polynomial transform.
pub const POLYNOMIAL_KIND: f64 = 2.0;

/// Number of entries a polynomial coefficient list needs: the kind plus four constants.
pub const POLYNOMIAL_COEFF_LEN: usize = 5;

/// How long the ingest loop waits for input before re-checking the control channel.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Device name used when the configuration does not provide one.
pub const DEFAULT_DEVICE_NAME: &str = "heatflowsensor";
