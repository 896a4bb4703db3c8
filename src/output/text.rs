use super::{Formatter, iso8601_timestamp};
use crate::record::EnrichedRecord;
use crate::sentence::SensorChannel;

pub struct TextFormatter {
    verbose: bool,
}

impl TextFormatter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

fn channel(c: &SensorChannel, verbose: bool) -> String {
    if verbose {
        format!(
            "{}: {:.6} {} ({:.6} {})",
            c.name, c.value, c.unit, c.volts, c.volts_unit
        )
    } else {
        format!("{}: {:.6} {}", c.name, c.value, c.unit)
    }
}

impl Formatter for TextFormatter {
    fn format(&self, record: &EnrichedRecord) -> String {
        let parsed = &record.record.record;
        let mut line = format!(
            "{} [{}] ",
            iso8601_timestamp(record.meta.t),
            record.meta.device
        );
        if self.verbose {
            line.push_str(&format!("sn={} ts={:.4} ", parsed.sn, parsed.ts));
        }
        line.push_str(&format!(
            "{} | {} | {}",
            channel(&parsed.hf, self.verbose),
            channel(&parsed.ntc, self.verbose),
            channel(&parsed.vin, self.verbose)
        ));
        for derived in &record.record.derived {
            line.push_str(&format!(" | {}: {:.6}", derived.name, derived.value));
            if let Some(unit) = &derived.unit {
                line.push(' ');
                line.push_str(unit);
            }
        }
        line
    }
}
