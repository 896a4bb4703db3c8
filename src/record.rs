//! Records as they leave the device.

use std::collections::HashSet;

use serde::Deserialize;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::calibration::CalibratedRecord;
use crate::sentence::FieldValue;

/// A raw line as delivered by the host, stamped with its arrival time.
///
/// Any other keys the host attaches are carried through in `extra`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InboundPacket {
    pub nmea: String,
    /// Arrival time, seconds since the Unix epoch
    pub t: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InboundPacket {
    pub fn new(nmea: impl Into<String>, t: f64) -> Self {
        Self {
            nmea: nmea.into(),
            t,
            extra: Map::new(),
        }
    }
}

/// Caller supplied fields merged into every record
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    pub device: String,
    /// Arrival time, seconds since the Unix epoch
    pub t: f64,
}

impl Metadata {
    pub const KEYS: [&'static str; 2] = ["device", "t"];
}

/// One output record per successfully parsed line.
///
/// Flattened for serialization with later sources overriding earlier ones:
/// inbound extras, `nmea`, parsed fields, derived fields, metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub meta: Metadata,
    pub nmea: String,
    pub record: CalibratedRecord,
    pub extra: Map<String, Value>,
}

impl EnrichedRecord {
    /// Look up a numeric value: `t`, then derived, then parsed fields.
    pub fn value(&self, name: &str) -> Option<f64> {
        if name == "t" {
            return Some(self.meta.t);
        }
        self.record.value(name)
    }
}

impl Serialize for EnrichedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        // Emitted highest precedence first; a key already written is skipped.
        let mut written: HashSet<&str> = HashSet::new();
        let mut map = serializer.serialize_map(None)?;

        map.serialize_entry("device", &self.meta.device)?;
        map.serialize_entry("t", &self.meta.t)?;
        written.extend(Metadata::KEYS);

        for derived in &self.record.derived {
            if written.insert(derived.name.as_str()) {
                map.serialize_entry(&derived.name, &FieldValue::Number(derived.value))?;
            }
        }
        for (key, value) in self.record.record.fields() {
            if written.insert(key) {
                map.serialize_entry(key, &value)?;
            }
        }
        if written.insert("nmea") {
            map.serialize_entry("nmea", &self.nmea)?;
        }
        for (key, value) in &self.extra {
            if written.insert(key.as_str()) {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::{Calibration, CoeffSpec};
    use crate::sentence::parse;

    const SAMPLE: &str = "$SN01,00000315.1035,HFS,-0.000196,V,-0.000392,W/m2,NTC,+0.028857,V,+33.926881,degC,VIN,+0.114332,V,+1.257654,VCC";

    fn enriched(convname: &str, extra: Map<String, Value>) -> EnrichedRecord {
        let spec = CoeffSpec::new("hfV", convname, &[2.0, 0.0, 9200.0, 0.0, 0.0]).unwrap();
        let cal = Calibration::new(vec![spec]).unwrap();
        EnrichedRecord {
            meta: Metadata {
                device: "heatflow1".to_string(),
                t: 1700000000.5,
            },
            nmea: SAMPLE.to_string(),
            record: cal.apply(parse(SAMPLE).unwrap()),
            extra,
        }
    }

    #[test]
    fn test_inbound_packet_keeps_extra_keys() {
        let packet: InboundPacket =
            serde_json::from_str(r#"{"nmea":"$x","t":12.5,"host":"logger1"}"#).unwrap();
        assert_eq!(packet.nmea, "$x");
        assert_eq!(packet.t, 12.5);
        assert_eq!(packet.extra["host"], "logger1");
    }

    #[test]
    fn test_serialized_keys() {
        let json = serde_json::to_value(enriched("hf_conv", Map::new())).unwrap();
        let obj = json.as_object().unwrap();
        // 17 parsed + 1 derived + device, t, nmea
        assert_eq!(obj.len(), 21);
        assert_eq!(obj["device"], "heatflow1");
        assert_eq!(obj["t"], 1700000000.5);
        assert_eq!(obj["sn"], "SN01");
        assert_eq!(obj["nmea"], SAMPLE);
        assert!((obj["hf_conv"].as_f64().unwrap() + 1.8032).abs() < 1e-12);
    }

    #[test]
    fn test_metadata_wins() {
        let mut extra = Map::new();
        extra.insert("device".to_string(), Value::from("upstream"));
        extra.insert("sn".to_string(), Value::from("spoofed"));
        extra.insert("port".to_string(), Value::from("/dev/ttyUSB0"));

        let json = serde_json::to_string(&enriched("t", extra)).unwrap();
        let obj: Map<String, Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(obj["device"], "heatflow1");
        assert_eq!(obj["t"], 1700000000.5);
        assert_eq!(obj["sn"], "SN01");
        assert_eq!(obj["port"], "/dev/ttyUSB0");
        assert_eq!(json.matches("\"t\":").count(), 1);
    }

    #[test]
    fn test_nan_serializes_as_null() {
        let spec = CoeffSpec::new("hfV", "odd", &[5.0]).unwrap();
        let mut record = enriched("hf_conv", Map::new());
        record.record = Calibration::new(vec![spec])
            .unwrap()
            .apply(parse(SAMPLE).unwrap());
        let json = serde_json::to_value(&record).unwrap();
        assert!(json["odd"].is_null());
    }

    #[test]
    fn test_value_lookup() {
        let record = enriched("hf_conv", Map::new());
        assert_eq!(record.value("t"), Some(1700000000.5));
        assert_eq!(record.value("NTC"), Some(33.926881));
        assert!(record.value("hf_conv").is_some());
        assert_eq!(record.value("device"), None);
    }
}
