//! Decoder for the heat flow sensor's NMEA-style sentence.
//!
//! A sentence is a single line of 17 comma separated fields:
//!
//! ```text
//! $SN01,00000315.1035,HFS,-0.000196,V,-0.000392,W/m2,NTC,+0.028857,V,+33.926881,degC,VIN,+0.114332,V,+1.257654,VCC
//! ```
//!
//! Field 0 is a sigil followed by the serial number, field 1 the sample
//! counter in seconds, and the rest three sensor groups of five fields each:
//! sensor name, voltage, voltage unit, converted value, value unit.
//!
//! # Example
//! ```
//! use heatflow::sentence::ParsedRecord;
//!
//! let line = "$SN01,00000315.1035,HFS,-0.000196,V,-0.000392,W/m2,NTC,+0.028857,V,+33.926881,degC,VIN,+0.114332,V,+1.257654,VCC";
//! let record: ParsedRecord = line.parse().unwrap();
//! assert_eq!(record.sn, "SN01");
//! assert_eq!(record.ntc.value, 33.926881);
//! ```

use std::str::FromStr;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::constants::{FIELD_SEPARATOR, SENTENCE_FIELD_COUNT};
use crate::error::{HeatflowError, Result, SentenceFault};

/// Flat key names of one sensor group.
#[derive(Debug, Clone, Copy)]
pub struct ChannelKeys {
    pub name: &'static str,
    pub volts: &'static str,
    pub volts_unit: &'static str,
    pub value: &'static str,
    pub unit: &'static str,
}

pub const HF_KEYS: ChannelKeys = ChannelKeys {
    name: "hfname",
    volts: "hfV",
    volts_unit: "hfV_unit",
    value: "hf",
    unit: "hf_unit",
};

pub const NTC_KEYS: ChannelKeys = ChannelKeys {
    name: "NTCname",
    volts: "NTCV",
    volts_unit: "NTCV_unit",
    value: "NTC",
    unit: "NTC_unit",
};

pub const VIN_KEYS: ChannelKeys = ChannelKeys {
    name: "VINname",
    volts: "VINV",
    volts_unit: "VINV_unit",
    value: "VIN",
    unit: "VIN_unit",
};

/// Every key of a parsed record, in sentence order.
pub const RECORD_KEYS: [&str; SENTENCE_FIELD_COUNT] = [
    "sn",
    "ts",
    HF_KEYS.name,
    HF_KEYS.volts,
    HF_KEYS.volts_unit,
    HF_KEYS.value,
    HF_KEYS.unit,
    NTC_KEYS.name,
    NTC_KEYS.volts,
    NTC_KEYS.volts_unit,
    NTC_KEYS.value,
    NTC_KEYS.unit,
    VIN_KEYS.name,
    VIN_KEYS.volts,
    VIN_KEYS.volts_unit,
    VIN_KEYS.value,
    VIN_KEYS.unit,
];

/// Keys holding text rather than numbers; never usable as a calibration source.
pub const TEXT_KEYS: [&str; 10] = [
    "sn",
    HF_KEYS.name,
    HF_KEYS.volts_unit,
    HF_KEYS.unit,
    NTC_KEYS.name,
    NTC_KEYS.volts_unit,
    NTC_KEYS.unit,
    VIN_KEYS.name,
    VIN_KEYS.volts_unit,
    VIN_KEYS.unit,
];

/// One sensor group: the raw voltage and the value the sensor derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorChannel {
    /// Sensor name as reported in the sentence (e.g. `HFS`)
    pub name: String,
    /// Measured voltage
    pub volts: f64,
    pub volts_unit: String,
    /// Converted value (heat flow, temperature, supply voltage)
    pub value: f64,
    pub unit: String,
}

/// A fully decoded sentence. Parsing never produces a partial record.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecord {
    /// Serial number, sigil stripped
    pub sn: String,
    /// Sample counter in seconds
    pub ts: f64,
    pub hf: SensorChannel,
    pub ntc: SensorChannel,
    pub vin: SensorChannel,
}

/// Value of a single flat record field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(f64),
}

impl Serialize for FieldValue<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Number(v) => serializer.serialize_f64(*v),
        }
    }
}

/// Parse one sentence into a record.
///
/// Fails with [`HeatflowError::MalformedSentence`] when fewer than 17 fields
/// are present or any numeric field does not parse. The first character of
/// field 0 is dropped whatever it is; a lone sigil gives an empty serial number.
pub fn parse(line: &str) -> Result<ParsedRecord> {
    let trimmed = line.trim_end_matches(['\r', '\n']);
    let fields: Vec<&str> = trimmed.split(FIELD_SEPARATOR).collect();

    if fields.len() < SENTENCE_FIELD_COUNT {
        return Err(HeatflowError::malformed(
            line,
            SentenceFault::TooFewFields {
                expected: SENTENCE_FIELD_COUNT,
                found: fields.len(),
            },
        ));
    }

    let mut sigil_and_sn = fields[0].chars();
    if sigil_and_sn.next().is_none() {
        return Err(HeatflowError::malformed(line, SentenceFault::MissingSigil));
    }
    let sn = sigil_and_sn.as_str().to_string();

    let number = |index: usize, key: &'static str| -> Result<f64> {
        let raw = fields[index];
        raw.trim().parse::<f64>().map_err(|_| {
            HeatflowError::malformed(
                line,
                SentenceFault::InvalidNumber {
                    field: key,
                    value: raw.to_string(),
                },
            )
        })
    };

    let channel = |start: usize, keys: &ChannelKeys| -> Result<SensorChannel> {
        Ok(SensorChannel {
            name: fields[start].to_string(),
            volts: number(start + 1, keys.volts)?,
            volts_unit: fields[start + 2].to_string(),
            value: number(start + 3, keys.value)?,
            unit: fields[start + 4].to_string(),
        })
    };

    Ok(ParsedRecord {
        sn,
        ts: number(1, "ts")?,
        hf: channel(2, &HF_KEYS)?,
        ntc: channel(7, &NTC_KEYS)?,
        vin: channel(12, &VIN_KEYS)?,
    })
}

impl FromStr for ParsedRecord {
    type Err = HeatflowError;

    fn from_str(s: &str) -> Result<Self> {
        parse(s)
    }
}

impl ParsedRecord {
    fn channels(&self) -> [(&SensorChannel, &'static ChannelKeys); 3] {
        [
            (&self.hf, &HF_KEYS),
            (&self.ntc, &NTC_KEYS),
            (&self.vin, &VIN_KEYS),
        ]
    }

    /// All 17 fields as flat `(key, value)` pairs, in sentence order.
    pub fn fields(&self) -> Vec<(&'static str, FieldValue<'_>)> {
        let mut out = Vec::with_capacity(SENTENCE_FIELD_COUNT);
        out.push(("sn", FieldValue::Text(&self.sn)));
        out.push(("ts", FieldValue::Number(self.ts)));
        for (channel, keys) in self.channels() {
            out.push((keys.name, FieldValue::Text(&channel.name)));
            out.push((keys.volts, FieldValue::Number(channel.volts)));
            out.push((keys.volts_unit, FieldValue::Text(&channel.volts_unit)));
            out.push((keys.value, FieldValue::Number(channel.value)));
            out.push((keys.unit, FieldValue::Text(&channel.unit)));
        }
        out
    }

    /// Look up a numeric field by name (case-sensitive).
    ///
    /// Canonical keys (`ts`, `hfV`, `NTC`, ...) are tried first. Failing that,
    /// names built from the sensor names in the sentence resolve too: with a
    /// sensor reporting itself as `HFS`, `HFSV` is its voltage and `HFS` its
    /// converted value.
    pub fn value(&self, name: &str) -> Option<f64> {
        if name == "ts" {
            return Some(self.ts);
        }
        let channels = self.channels();
        for (channel, keys) in channels {
            if name == keys.volts {
                return Some(channel.volts);
            }
            if name == keys.value {
                return Some(channel.value);
            }
        }
        for (channel, _) in channels {
            if channel.name.is_empty() {
                continue;
            }
            if name == channel.name {
                return Some(channel.value);
            }
            if name.strip_prefix(channel.name.as_str()) == Some("V") {
                return Some(channel.volts);
            }
        }
        None
    }
}

impl Serialize for ParsedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let fields = self.fields();
        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for (key, value) in &fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
