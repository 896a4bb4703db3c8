use crate::calibration::{Calibration, CalibratedRecord};
use crate::config::DeviceConfig;
use crate::error::Result;
use crate::record::{EnrichedRecord, InboundPacket, Metadata};
use crate::sentence;

/// Turns raw sentences into enriched records for one device.
///
/// Holds only read-only state, so a single processor can be shared between
/// threads by reference or cloned cheaply.
#[derive(Debug, Clone)]
pub struct HeatflowProcessor {
    device: String,
    calibration: Calibration,
}

impl HeatflowProcessor {
    pub fn new(device: impl Into<String>, calibration: Calibration) -> Self {
        Self {
            device: device.into(),
            calibration,
        }
    }

    /// Build from a configuration; fails if the coefficient list is invalid.
    pub fn from_config(config: &DeviceConfig) -> Result<Self> {
        Ok(Self::new(config.name.clone(), config.calibration()?))
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Parse, calibrate and stamp one inbound packet.
    pub fn process(&self, packet: &InboundPacket) -> Result<EnrichedRecord> {
        let parsed = sentence::parse(&packet.nmea)?;
        let record = if self.calibration.is_empty() {
            CalibratedRecord::uncalibrated(parsed)
        } else {
            self.calibration.apply(parsed)
        };

        Ok(EnrichedRecord {
            meta: Metadata {
                device: self.device.clone(),
                t: packet.t,
            },
            nmea: packet.nmea.clone(),
            record,
            extra: packet.extra.clone(),
        })
    }

    pub fn process_line(&self, line: &str, t: f64) -> Result<EnrichedRecord> {
        self.process(&InboundPacket::new(line, t))
    }
}
