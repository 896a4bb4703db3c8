pub mod calibration;
pub mod config;
pub mod constants;
pub mod error;
pub mod ingest;
pub mod output;
pub mod processing;
pub mod record;
pub mod sentence;

pub use calibration::{Calibration, CalibratedRecord, CoeffSpec, Transform};
pub use config::DeviceConfig;
pub use error::{HeatflowError, Result};
pub use processing::HeatflowProcessor;
pub use record::{EnrichedRecord, InboundPacket, Metadata};
pub use sentence::ParsedRecord;
