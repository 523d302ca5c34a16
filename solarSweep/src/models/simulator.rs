// The simulation capability: anything that turns a resource and a plant design
// into annual energy and installed cost.

use serde::{Deserialize, Serialize};
use crate::config::constants::{HOURS_PER_YEAR, MONTHS_PER_YEAR};
use crate::models::csp::{self, CspDesign};
use crate::models::pv::{self, PvDesign};
use crate::models::resource::SolarResource;
use crate::utils::logging::{self, OperationCategory, SimulationType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Technology {
    Pv,
    Csp,
}

impl std::fmt::Display for Technology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Technology::Pv => write!(f, "PV"),
            Technology::Csp => write!(f, "CSP"),
        }
    }
}

impl std::str::FromStr for Technology {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pv" => Ok(Technology::Pv),
            "csp" => Ok(Technology::Csp),
            other => Err(format!("unknown technology '{}', expected pv or csp", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlantConfig {
    Pv(PvDesign),
    Csp(CspDesign),
}

impl PlantConfig {
    pub fn technology(&self) -> Technology {
        match self {
            PlantConfig::Pv(_) => Technology::Pv,
            PlantConfig::Csp(_) => Technology::Csp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationOutput {
    pub annual_energy_kwh: f64,
    pub installed_cost: f64,
    pub nameplate_kw: f64,
    pub capacity_factor: f64,
    pub monthly_energy_kwh: [f64; MONTHS_PER_YEAR],
}

impl SimulationOutput {
    /// Builds an output and rejects non-finite results.
    pub fn new(
        annual_energy_kwh: f64,
        installed_cost: f64,
        nameplate_kw: f64,
        monthly_energy_kwh: [f64; MONTHS_PER_YEAR],
    ) -> Result<Self, SimulationError> {
        if !annual_energy_kwh.is_finite() || !installed_cost.is_finite() {
            return Err(SimulationError::NonFiniteResult(format!(
                "annual energy {} kWh, installed cost {}",
                annual_energy_kwh, installed_cost
            )));
        }
        Ok(Self {
            annual_energy_kwh,
            installed_cost,
            nameplate_kw,
            capacity_factor: crate::analysis::aggregation::capacity_factor(annual_energy_kwh, nameplate_kw, HOURS_PER_YEAR)
                .unwrap_or(0.0),
            monthly_energy_kwh,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    InvalidDesign(String),
    EmptyResource(String),
    NonFiniteResult(String),
    Backend(String),
}

impl std::fmt::Display for SimulationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulationError::InvalidDesign(s) => write!(f, "Invalid plant design: {}", s),
            SimulationError::EmptyResource(s) => write!(f, "Solar resource '{}' has no records", s),
            SimulationError::NonFiniteResult(s) => write!(f, "Simulation produced a non-finite result: {}", s),
            SimulationError::Backend(s) => write!(f, "Simulator failure: {}", s),
        }
    }
}

impl std::error::Error for SimulationError {}

pub trait Simulator: Sync {
    fn simulate(&self, resource: &SolarResource, plant: &PlantConfig) -> Result<SimulationOutput, SimulationError>;
}

/// Built-in simplified PV and molten-salt tower models.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceSimulator;

impl Simulator for ReferenceSimulator {
    fn simulate(&self, resource: &SolarResource, plant: &PlantConfig) -> Result<SimulationOutput, SimulationError> {
        match plant {
            PlantConfig::Pv(design) => {
                let _timing = logging::start_timing("pv::simulate",
                    OperationCategory::Simulation { subcategory: SimulationType::Pv });
                pv::simulate(resource, design)
            }
            PlantConfig::Csp(design) => {
                let _timing = logging::start_timing("csp::simulate",
                    OperationCategory::Simulation { subcategory: SimulationType::Csp });
                csp::simulate(resource, design)
            }
        }
    }
}
