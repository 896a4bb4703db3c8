/// Sentence from the sensor documentation
pub const SAMPLE: &str = "$SN01,00000315.1035,HFS,-0.000196,V,-0.000392,W/m2,NTC,+0.028857,V,+33.926881,degC,VIN,+0.114332,V,+1.257654,VCC";

/// Builds sentences the way the sensor firmware prints them: signed,
/// six decimals, zero padded sample counter.
#[derive(Debug, Clone)]
pub struct SentenceBuilder {
    pub sn: String,
    pub ts: f64,
    pub hf_volts: f64,
    pub hf: f64,
    pub ntc_volts: f64,
    pub ntc: f64,
    pub vin_volts: f64,
    pub vin: f64,
}

impl Default for SentenceBuilder {
    fn default() -> Self {
        Self {
            sn: "SN01".to_string(),
            ts: 315.1035,
            hf_volts: -0.000196,
            hf: -0.000392,
            ntc_volts: 0.028857,
            ntc: 33.926881,
            vin_volts: 0.114332,
            vin: 1.257654,
        }
    }
}

impl SentenceBuilder {
    pub fn with_ts(mut self, ts: f64) -> Self {
        self.ts = ts;
        self
    }

    pub fn with_hf_volts(mut self, volts: f64) -> Self {
        self.hf_volts = volts;
        self
    }

    pub fn with_hf(mut self, value: f64) -> Self {
        self.hf = value;
        self
    }

    pub fn with_ntc_volts(mut self, volts: f64) -> Self {
        self.ntc_volts = volts;
        self
    }

    pub fn with_ntc(mut self, value: f64) -> Self {
        self.ntc = value;
        self
    }

    pub fn with_vin_volts(mut self, volts: f64) -> Self {
        self.vin_volts = volts;
        self
    }

    pub fn with_vin(mut self, value: f64) -> Self {
        self.vin = value;
        self
    }

    pub fn build(&self) -> String {
        format!(
            "${},{:013.4},HFS,{:+.6},V,{:+.6},W/m2,NTC,{:+.6},V,{:+.6},degC,VIN,{:+.6},V,{:+.6},VCC",
            self.sn,
            self.ts,
            self.hf_volts,
            self.hf,
            self.ntc_volts,
            self.ntc,
            self.vin_volts,
            self.vin
        )
    }
}
