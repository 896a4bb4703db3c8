use super::Formatter;
use crate::record::EnrichedRecord;

pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format(&self, record: &EnrichedRecord) -> String {
        serde_json::to_string(record).unwrap_or_else(|e| {
            log::error!("Failed to serialize record: {}", e);
            String::from("{}")
        })
    }
}
