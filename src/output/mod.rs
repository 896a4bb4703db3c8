mod csv;
mod json;
mod text;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::record::EnrichedRecord;

pub use self::csv::CsvFormatter;
pub use self::json::JsonFormatter;
pub use self::text::TextFormatter;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

pub trait Formatter: Send {
    fn format(&self, record: &EnrichedRecord) -> String;

    fn header(&self) -> Option<String> {
        None
    }
}

/// `derived` lists the derived field names, in configuration order, for
/// formats with a fixed column set.
pub fn create_formatter(
    format: OutputFormat,
    verbose: bool,
    derived: Vec<String>,
) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter::new(verbose)),
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Csv => Box::new(CsvFormatter::new(derived)),
    }
}

/// Render seconds since the epoch as ISO-8601 with millisecond precision.
pub fn iso8601_timestamp(t: f64) -> String {
    let micros = (t * 1e6).round() as i64;
    match DateTime::<Utc>::from_timestamp_micros(micros) {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => format!("{:.3}", t),
    }
}

/// Current time in seconds since the epoch
pub fn now_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1e6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso8601_timestamp() {
        assert_eq!(iso8601_timestamp(0.0), "1970-01-01T00:00:00.000Z");
        assert_eq!(iso8601_timestamp(1.25), "1970-01-01T00:00:01.250Z");
    }

    #[test]
    fn test_now_is_recent() {
        // 2020-01-01
        assert!(now_seconds() > 1_577_836_800.0);
    }
}
