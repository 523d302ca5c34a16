use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use crate::analysis::lcoe::EconomicParams;
use crate::config::constants::CSP_SENSITIVITY_TES_HOURS;
use crate::config::countries::{default_countries, Country};
use crate::models::csp::CspDesign;
use crate::models::pv::PvDesign;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    JsonError(serde_json::Error),
    InvalidRange(String),
    Invalid(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::JsonError(err)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::JsonError(e) => write!(f, "JSON error: {}", e),
            ConfigError::InvalidRange(s) => write!(f, "Invalid range: {}", s),
            ConfigError::Invalid(s) => write!(f, "Invalid configuration: {}", s),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Inclusive arithmetic range of sweep values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub start: f64,
    pub end: f64,
    pub step: f64,
}

impl ValueRange {
    pub const fn new(start: f64, end: f64, step: f64) -> Self {
        Self { start, end, step }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.step > 0.0) || !self.start.is_finite() || !self.end.is_finite() {
            return Err(ConfigError::InvalidRange(format!(
                "{}:{}:{} needs finite bounds and a positive step",
                self.start, self.end, self.step
            )));
        }
        if self.end < self.start {
            return Err(ConfigError::InvalidRange(format!("end {} is below start {}", self.end, self.start)));
        }
        Ok(())
    }

    /// Values from start to end inclusive, snapped to 1e-9 so 0.05 + 3 × 0.01 prints as 0.08.
    pub fn values(&self) -> Vec<f64> {
        if self.validate().is_err() {
            return Vec::new();
        }
        let count = ((self.end - self.start) / self.step + 1e-9).floor() as usize + 1;
        (0..count)
            .map(|i| ((self.start + i as f64 * self.step) * 1e9).round() / 1e9)
            .collect()
    }
}

impl std::str::FromStr for ValueRange {
    type Err = ConfigError;

    /// Parses `start:end:step`, or `start:end` with a step of 1.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').map(str::trim).collect();
        let parse = |p: &str| {
            p.parse::<f64>()
                .map_err(|_| ConfigError::InvalidRange(format!("'{}' in '{}' is not a number", p, s)))
        };
        let range = match parts.as_slice() {
            [start, end] => ValueRange::new(parse(start)?, parse(end)?, 1.0),
            [start, end, step] => ValueRange::new(parse(start)?, parse(end)?, parse(step)?),
            _ => return Err(ConfigError::InvalidRange(format!("expected start:end[:step], got '{}'", s))),
        };
        range.validate()?;
        Ok(range)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CspCampaign {
    pub design: CspDesign,
    pub economics: EconomicParams,
    pub storage_hours: ValueRange,
    pub fixed_charge_rates: ValueRange,
    pub solar_multiples: ValueRange,
    /// Storage size held fixed during the FCR and solar multiple sweeps.
    pub sensitivity_tes_hours: f64,
}

impl Default for CspCampaign {
    fn default() -> Self {
        Self {
            design: CspDesign::default(),
            economics: EconomicParams::csp_default(),
            storage_hours: ValueRange::new(4.0, 18.0, 1.0),
            fixed_charge_rates: ValueRange::new(0.05, 0.10, 0.01),
            solar_multiples: ValueRange::new(1.5, 3.0, 0.25),
            sensitivity_tes_hours: CSP_SENSITIVITY_TES_HOURS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PvCampaign {
    pub design: PvDesign,
    pub economics: EconomicParams,
    pub capacities_kw: Vec<f64>,
    pub tilts: ValueRange,
    pub dc_ac_ratios: ValueRange,
    pub fixed_charge_rates: ValueRange,
    pub inverter_efficiencies: ValueRange,
    pub capital_costs: ValueRange,
    pub fixed_operating_costs: ValueRange,
    pub variable_operating_costs: ValueRange,
    /// PV plant size used as the reference in CSP vs PV comparisons.
    pub reference_capacity_kw: f64,
}

impl Default for PvCampaign {
    fn default() -> Self {
        Self {
            design: PvDesign::default(),
            economics: EconomicParams::pv_default(),
            capacities_kw: vec![500.0, 1000.0, 2000.0, 5000.0, 10000.0],
            tilts: ValueRange::new(0.0, 90.0, 5.0),
            dc_ac_ratios: ValueRange::new(1.0, 2.0, 0.1),
            fixed_charge_rates: ValueRange::new(0.01, 0.10, 0.01),
            inverter_efficiencies: ValueRange::new(90.0, 99.0, 1.0),
            capital_costs: ValueRange::new(500_000.0, 1_500_000.0, 250_000.0),
            fixed_operating_costs: ValueRange::new(25_000.0, 100_000.0, 25_000.0),
            variable_operating_costs: ValueRange::new(0.005, 0.02, 0.005),
            reference_capacity_kw: 10_000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignConfig {
    pub countries: Vec<Country>,
    pub csp: CspCampaign,
    pub pv: PvCampaign,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            countries: default_countries(),
            csp: CspCampaign::default(),
            pv: PvCampaign::default(),
        }
    }
}

impl CampaignConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.countries.is_empty() {
            return Err(ConfigError::Invalid("at least one country is required".to_string()));
        }
        for country in &self.countries {
            if country.resource_files.is_empty() {
                return Err(ConfigError::Invalid(format!("country '{}' has no resource files", country.name)));
            }
        }
        for range in [
            &self.csp.storage_hours,
            &self.csp.fixed_charge_rates,
            &self.csp.solar_multiples,
            &self.pv.tilts,
            &self.pv.dc_ac_ratios,
            &self.pv.fixed_charge_rates,
            &self.pv.inverter_efficiencies,
            &self.pv.capital_costs,
            &self.pv.fixed_operating_costs,
            &self.pv.variable_operating_costs,
        ] {
            range.validate()?;
        }
        if self.pv.capacities_kw.is_empty() {
            return Err(ConfigError::Invalid("PV capacity list is empty".to_string()));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub fn load_config(path: &Path) -> Result<CampaignConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: CampaignConfig = serde_json::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}
