use super::{Formatter, iso8601_timestamp};
use crate::record::EnrichedRecord;

const VALUE_COLUMNS: [&str; 7] = ["ts", "hfV", "hf", "NTCV", "NTC", "VINV", "VIN"];

pub struct CsvFormatter {
    derived: Vec<String>,
}

impl CsvFormatter {
    pub fn new(derived: Vec<String>) -> Self {
        Self { derived }
    }
}

/// Quote a text cell when it holds a separator, quote or line break.
fn text_cell(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// NaN and missing values leave the cell empty.
fn cell(value: Option<f64>) -> String {
    match value {
        Some(v) if !v.is_nan() => format!("{:.6}", v),
        _ => String::new(),
    }
}

impl Formatter for CsvFormatter {
    fn format(&self, record: &EnrichedRecord) -> String {
        let mut cells = vec![
            iso8601_timestamp(record.meta.t),
            text_cell(&record.meta.device),
            text_cell(&record.record.record.sn),
        ];
        cells.extend(VALUE_COLUMNS.iter().map(|c| cell(record.value(c))));
        cells.extend(
            self.derived
                .iter()
                .map(|name| cell(record.record.derived_value(name))),
        );
        cells.join(",")
    }

    fn header(&self) -> Option<String> {
        let mut columns = vec!["t", "device", "sn"];
        columns.extend(VALUE_COLUMNS);
        let mut header: Vec<String> = columns.into_iter().map(String::from).collect();
        header.extend(self.derived.iter().map(|name| text_cell(name)));
        Some(header.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_cell_quoting() {
        assert_eq!(text_cell("heatflow1"), "heatflow1");
        assert_eq!(text_cell("lab,north"), "\"lab,north\"");
        assert_eq!(text_cell("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
