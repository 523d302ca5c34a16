//! Simplified molten-salt power tower with two-tank thermal storage.
//!
//! The heliostat field is sized from the solar multiple at the design DNI.
//! Each time step the receiver output feeds the power cycle first. Surplus
//! heat charges storage, and storage tops up the cycle when the receiver falls
//! short. The cycle only runs above its cutoff fraction. Installed cost is a
//! component breakdown scaled by aperture, thermal ratings and storage size.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use crate::config::constants::*;
use crate::models::resource::SolarResource;
use crate::models::simulator::{SimulationError, SimulationOutput};
use crate::utils::solar_geometry::sun_position;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CspCosts {
    pub site_improvement_per_m2: f64,
    pub heliostat_per_m2: f64,
    pub tower_fixed: f64,
    pub tower_per_mwt: f64,
    pub receiver_per_kwt: f64,
    pub tes_per_kwht: f64,
    pub power_block_per_kwe: f64,
    pub bop_per_kwe: f64,
    pub contingency: f64,
    pub epc_owner: f64,
}

impl Default for CspCosts {
    fn default() -> Self {
        Self {
            site_improvement_per_m2: CSP_SITE_IMPROVEMENT_COST,
            heliostat_per_m2: CSP_HELIOSTAT_COST,
            tower_fixed: CSP_TOWER_FIXED_COST,
            tower_per_mwt: CSP_TOWER_COST_PER_MWT,
            receiver_per_kwt: CSP_RECEIVER_COST_PER_KWT,
            tes_per_kwht: CSP_TES_COST_PER_KWHT,
            power_block_per_kwe: CSP_POWER_BLOCK_COST_PER_KWE,
            bop_per_kwe: CSP_BOP_COST_PER_KWE,
            contingency: CSP_CONTINGENCY,
            epc_owner: CSP_EPC_OWNER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CspDesign {
    pub p_ref_mwe: f64,              // gross cycle rating
    pub gross_net_conversion: f64,
    pub cycle_efficiency: f64,
    pub solar_multiple: f64,
    pub tes_hours: f64,
    pub dni_design: f64,             // W/m²
    pub optical_efficiency: f64,
    pub receiver_efficiency: f64,
    pub cycle_cutoff_frac: f64,
    pub cycle_max_frac: f64,
    pub tes_loss_frac_per_hour: f64,
    pub costs: CspCosts,
}

impl Default for CspDesign {
    fn default() -> Self {
        Self {
            p_ref_mwe: CSP_DEFAULT_P_REF_MWE,
            gross_net_conversion: CSP_DEFAULT_GROSS_NET,
            cycle_efficiency: CSP_DEFAULT_CYCLE_EFFICIENCY,
            solar_multiple: CSP_DEFAULT_SOLAR_MULTIPLE,
            tes_hours: CSP_DEFAULT_TES_HOURS,
            dni_design: CSP_DEFAULT_DNI_DESIGN,
            optical_efficiency: CSP_DEFAULT_OPTICAL_EFFICIENCY,
            receiver_efficiency: CSP_DEFAULT_RECEIVER_EFFICIENCY,
            cycle_cutoff_frac: CSP_DEFAULT_CYCLE_CUTOFF,
            cycle_max_frac: CSP_DEFAULT_CYCLE_MAX,
            tes_loss_frac_per_hour: CSP_DEFAULT_TES_LOSS_PER_HOUR,
            costs: CspCosts::default(),
        }
    }
}

/// Installed cost by component, all in $.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CspCostBreakdown {
    pub site_improvement: f64,
    pub heliostats: f64,
    pub tower: f64,
    pub receiver: f64,
    pub storage: f64,
    pub power_block: f64,
    pub balance_of_plant: f64,
    pub contingency: f64,
    pub epc_owner: f64,
}

impl CspCostBreakdown {
    pub fn total(&self) -> f64 {
        self.site_improvement
            + self.heliostats
            + self.tower
            + self.receiver
            + self.storage
            + self.power_block
            + self.balance_of_plant
            + self.contingency
            + self.epc_owner
    }
}

impl CspDesign {
    pub fn cycle_thermal_mw(&self) -> f64 {
        self.p_ref_mwe / self.cycle_efficiency
    }

    pub fn receiver_design_mw(&self) -> f64 {
        self.solar_multiple * self.cycle_thermal_mw()
    }

    pub fn aperture_m2(&self) -> f64 {
        self.receiver_design_mw() * 1e6 / (self.dni_design * self.optical_efficiency * self.receiver_efficiency)
    }

    pub fn storage_capacity_mwh(&self) -> f64 {
        self.tes_hours * self.cycle_thermal_mw()
    }

    pub fn net_capacity_kw(&self) -> f64 {
        self.p_ref_mwe * self.gross_net_conversion * 1000.0
    }

    pub fn cost_breakdown(&self) -> CspCostBreakdown {
        let c = &self.costs;
        let aperture = self.aperture_m2();
        let receiver_mw = self.receiver_design_mw();
        let gross_kwe = self.p_ref_mwe * 1000.0;

        let site_improvement = aperture * c.site_improvement_per_m2;
        let heliostats = aperture * c.heliostat_per_m2;
        let tower = c.tower_fixed + c.tower_per_mwt * receiver_mw;
        let receiver = c.receiver_per_kwt * receiver_mw * 1000.0;
        let storage = c.tes_per_kwht * self.storage_capacity_mwh() * 1000.0;
        let power_block = c.power_block_per_kwe * gross_kwe;
        let balance_of_plant = c.bop_per_kwe * gross_kwe;

        let direct = site_improvement + heliostats + tower + receiver + storage + power_block + balance_of_plant;
        let contingency = direct * c.contingency;
        let epc_owner = (direct + contingency) * c.epc_owner;

        CspCostBreakdown {
            site_improvement,
            heliostats,
            tower,
            receiver,
            storage,
            power_block,
            balance_of_plant,
            contingency,
            epc_owner,
        }
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        let invalid = |reason: String| Err(SimulationError::InvalidDesign(reason));
        if !(self.p_ref_mwe > 0.0) {
            return invalid(format!("cycle rating must be positive, got {} MWe", self.p_ref_mwe));
        }
        if !(self.solar_multiple > 0.0) {
            return invalid(format!("solar multiple must be positive, got {}", self.solar_multiple));
        }
        if !(self.tes_hours >= 0.0) {
            return invalid(format!("storage hours must not be negative, got {}", self.tes_hours));
        }
        if !(self.dni_design > 0.0) {
            return invalid(format!("design DNI must be positive, got {}", self.dni_design));
        }
        for (name, value) in [
            ("gross to net conversion", self.gross_net_conversion),
            ("cycle efficiency", self.cycle_efficiency),
            ("optical efficiency", self.optical_efficiency),
            ("receiver efficiency", self.receiver_efficiency),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return invalid(format!("{} must be within (0, 1], got {}", name, value));
            }
        }
        if !(self.cycle_cutoff_frac >= 0.0 && self.cycle_cutoff_frac <= self.cycle_max_frac) {
            return invalid(format!(
                "cycle cutoff fraction {} must be within [0, max fraction {}]",
                self.cycle_cutoff_frac, self.cycle_max_frac
            ));
        }
        if !(0.0..1.0).contains(&self.tes_loss_frac_per_hour) {
            return invalid(format!("storage loss fraction must be within [0, 1), got {}", self.tes_loss_frac_per_hour));
        }
        Ok(())
    }
}

/// Thermal storage tank pair, tracked in MWh thermal.
#[derive(Debug, Clone)]
struct ThermalStorage {
    capacity: f64,
    stored: f64,
    loss_frac_per_hour: f64,
}

impl ThermalStorage {
    fn new(capacity: f64, loss_frac_per_hour: f64) -> Self {
        Self { capacity, stored: 0.0, loss_frac_per_hour }
    }

    /// Stores up to `amount` MWh, returning what did not fit.
    fn charge(&mut self, amount: f64) -> f64 {
        let accepted = amount.min(self.capacity - self.stored).max(0.0);
        self.stored += accepted;
        amount - accepted
    }

    fn discharge(&mut self, amount: f64) -> f64 {
        let delivered = amount.min(self.stored).max(0.0);
        self.stored -= delivered;
        delivered
    }

    fn apply_losses(&mut self, hours: f64) {
        self.stored *= (1.0 - self.loss_frac_per_hour).powf(hours);
    }
}

pub fn simulate(resource: &SolarResource, design: &CspDesign) -> Result<SimulationOutput, SimulationError> {
    design.validate()?;
    if resource.is_empty() {
        return Err(SimulationError::EmptyResource(resource.metadata.location.clone()));
    }

    let meta = &resource.metadata;
    let step_hours = resource.time_step_hours();
    let aperture = design.aperture_m2();
    let q_cycle = design.cycle_thermal_mw();
    let q_rec_design = design.receiver_design_mw();
    let receiver_loss = q_rec_design * (1.0 / design.receiver_efficiency - 1.0);
    let cycle_max = q_cycle * design.cycle_max_frac;
    let cycle_min = q_cycle * design.cycle_cutoff_frac;

    let mut storage = ThermalStorage::new(design.storage_capacity_mwh(), design.tes_loss_frac_per_hour);
    let mut monthly = [0.0_f64; MONTHS_PER_YEAR];
    let mut total_kwh = 0.0;

    for record in &resource.records {
        let clock = record.midpoint_clock_hours(step_hours);
        let sun = sun_position(meta.latitude, meta.longitude, meta.time_zone, record.day_of_year(), clock);

        // Receiver thermal output, MWt
        let q_rec = if sun.elevation > CSP_FIELD_STOW_ELEVATION && record.dni > 0.0 {
            let field_eff = design.optical_efficiency * (0.65 + 0.35 * (sun.elevation * PI / 180.0).sin());
            let incident = record.dni * aperture * field_eff / 1e6;
            (incident - receiver_loss).clamp(0.0, q_rec_design)
        } else {
            0.0
        };

        let available = q_rec + storage.stored / step_hours;
        let q_to_cycle = if available >= cycle_min && available > 0.0 {
            available.min(cycle_max)
        } else {
            0.0
        };

        let direct = q_to_cycle.min(q_rec);
        let from_storage = q_to_cycle - direct;
        storage.discharge(from_storage * step_hours);
        // Whatever does not fit in the tanks is defocused
        storage.charge((q_rec - direct) * step_hours);
        storage.apply_losses(step_hours);

        let net_mwe = q_to_cycle * design.cycle_efficiency * design.gross_net_conversion;
        let energy = net_mwe * step_hours * 1000.0;
        total_kwh += energy;
        if let Some(slot) = monthly.get_mut(record.month.saturating_sub(1) as usize) {
            *slot += energy;
        }
    }

    let years = resource.years_covered();
    monthly.iter_mut().for_each(|m| *m /= years);

    SimulationOutput::new(
        total_kwh / years,
        design.cost_breakdown().total(),
        design.net_capacity_kw(),
        monthly,
    )
}
