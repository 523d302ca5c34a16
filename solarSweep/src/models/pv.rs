//! Simplified hourly photovoltaic yield model.
//!
//! Pipeline per time step: solar position, plane-of-array transposition
//! (beam + isotropic diffuse + ground reflected), Faiman cell temperature,
//! DC output with temperature derate and system losses, then inverter
//! efficiency and AC clipping at the inverter nameplate.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use crate::config::constants::*;
use crate::models::resource::SolarResource;
use crate::models::simulator::{SimulationError, SimulationOutput};
use crate::utils::solar_geometry::{cos_incidence, sun_position, SunPosition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArrayType {
    FixedOpenRack,
    FixedRoofMount,
    OneAxis,
}

impl ArrayType {
    fn faiman_coefficients(&self) -> (f64, f64) {
        match self {
            ArrayType::FixedRoofMount => FAIMAN_ROOF_MOUNT,
            ArrayType::FixedOpenRack | ArrayType::OneAxis => FAIMAN_OPEN_RACK,
        }
    }
}

impl std::str::FromStr for ArrayType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "fixed" | "open_rack" | "fixed_open_rack" => Ok(ArrayType::FixedOpenRack),
            "roof" | "roof_mount" | "fixed_roof_mount" => Ok(ArrayType::FixedRoofMount),
            "one_axis" | "tracking" | "1axis" => Ok(ArrayType::OneAxis),
            other => Err(format!("unknown array type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PvDesign {
    pub capacity_kw: f64,     // DC nameplate
    pub dc_ac_ratio: f64,
    pub tilt: f64,
    pub azimuth: f64,
    pub array_type: ArrayType,
    pub gcr: f64,             // ground coverage ratio
    pub inv_eff: f64,         // %
    pub losses: f64,          // %
    pub cost_per_kw: f64,     // $/kW DC
}

impl Default for PvDesign {
    fn default() -> Self {
        Self {
            capacity_kw: PV_DEFAULT_CAPACITY_KW,
            dc_ac_ratio: PV_DEFAULT_DC_AC_RATIO,
            tilt: PV_DEFAULT_TILT,
            azimuth: PV_DEFAULT_AZIMUTH,
            array_type: ArrayType::FixedRoofMount,
            gcr: PV_DEFAULT_GCR,
            inv_eff: PV_DEFAULT_INVERTER_EFFICIENCY,
            losses: PV_DEFAULT_LOSSES,
            cost_per_kw: PV_DEFAULT_COST_PER_KW,
        }
    }
}

impl PvDesign {
    pub fn ac_capacity_kw(&self) -> f64 {
        self.capacity_kw / self.dc_ac_ratio
    }

    pub fn installed_cost(&self) -> f64 {
        self.capacity_kw * self.cost_per_kw
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        let invalid = |reason: String| Err(SimulationError::InvalidDesign(reason));
        if !(self.capacity_kw > 0.0) {
            return invalid(format!("system capacity must be positive, got {}", self.capacity_kw));
        }
        if !(0.0..=90.0).contains(&self.tilt) {
            return invalid(format!("tilt must be within 0-90 degrees, got {}", self.tilt));
        }
        if !(0.0..360.0).contains(&self.azimuth) {
            return invalid(format!("azimuth must be within 0-360 degrees, got {}", self.azimuth));
        }
        if !(self.dc_ac_ratio > 0.0) {
            return invalid(format!("DC/AC ratio must be positive, got {}", self.dc_ac_ratio));
        }
        if !(self.gcr > 0.0 && self.gcr <= 1.0) {
            return invalid(format!("ground coverage ratio must be within (0, 1], got {}", self.gcr));
        }
        if !(self.inv_eff > 0.0 && self.inv_eff <= 100.0) {
            return invalid(format!("inverter efficiency must be within (0, 100]%, got {}", self.inv_eff));
        }
        if !(0.0..100.0).contains(&self.losses) {
            return invalid(format!("system losses must be within [0, 100)%, got {}", self.losses));
        }
        if !(self.cost_per_kw >= 0.0) {
            return invalid(format!("cost per kW must not be negative, got {}", self.cost_per_kw));
        }
        Ok(())
    }
}

/// Surface orientation for one time step: (tilt, azimuth, beam shading factor).
fn surface_orientation(design: &PvDesign, sun: &SunPosition) -> (f64, f64, f64) {
    match design.array_type {
        ArrayType::FixedOpenRack | ArrayType::FixedRoofMount => (design.tilt, design.azimuth, 1.0),
        ArrayType::OneAxis => {
            // Horizontal axis along the design azimuth, true tracking limited to the mechanical stop
            let zenith = sun.zenith() * PI / 180.0;
            let rel_az = (sun.azimuth - design.azimuth) * PI / 180.0;
            let ideal = (zenith.tan() * rel_az.sin()).atan() * 180.0 / PI;
            let rotation = ideal.clamp(-PV_TRACKER_MAX_ROTATION, PV_TRACKER_MAX_ROTATION);
            let surface_azimuth = if rotation >= 0.0 {
                (design.azimuth + 90.0) % 360.0
            } else {
                (design.azimuth + 270.0) % 360.0
            };
            let shading = ((rotation * PI / 180.0).cos() / design.gcr).min(1.0);
            (rotation.abs(), surface_azimuth, shading)
        }
    }
}

pub fn simulate(resource: &SolarResource, design: &PvDesign) -> Result<SimulationOutput, SimulationError> {
    design.validate()?;
    if resource.is_empty() {
        return Err(SimulationError::EmptyResource(resource.metadata.location.clone()));
    }

    let meta = &resource.metadata;
    let step_hours = resource.time_step_hours();
    let (u0, u1) = design.array_type.faiman_coefficients();
    let ac_limit = design.ac_capacity_kw();
    let derate = 1.0 - design.losses / 100.0;
    let inverter = design.inv_eff / 100.0;

    let mut monthly = [0.0_f64; MONTHS_PER_YEAR];
    let mut total_kwh = 0.0;

    for record in &resource.records {
        // Evaluate geometry at the middle of the interval
        let clock = record.midpoint_clock_hours(step_hours);
        let sun = sun_position(meta.latitude, meta.longitude, meta.time_zone, record.day_of_year(), clock);
        if !sun.is_up() || record.ghi <= 0.0 {
            continue;
        }

        let (tilt, surface_azimuth, shading) = surface_orientation(design, &sun);
        let beta = tilt * PI / 180.0;
        let beam = record.dni.max(0.0) * cos_incidence(&sun, tilt, surface_azimuth) * shading;
        let diffuse = record.dhi.max(0.0) * (1.0 + beta.cos()) / 2.0;
        let reflected = record.ghi.max(0.0) * GROUND_ALBEDO * (1.0 - beta.cos()) / 2.0;
        let poa = beam + diffuse + reflected;

        let cell_temp = record.temperature + poa / (u0 + u1 * record.wind_speed.max(0.0));
        let temp_factor = 1.0 + PV_TEMPERATURE_COEFFICIENT * (cell_temp - STC_CELL_TEMPERATURE);
        let dc_kw = (design.capacity_kw * poa / STC_IRRADIANCE * temp_factor * derate).max(0.0);
        let ac_kw = (dc_kw * inverter).min(ac_limit);

        let energy = ac_kw * step_hours;
        total_kwh += energy;
        if let Some(slot) = monthly.get_mut(record.month.saturating_sub(1) as usize) {
            *slot += energy;
        }
    }

    let years = resource.years_covered();
    let annual_energy_kwh = total_kwh / years;
    monthly.iter_mut().for_each(|m| *m /= years);

    SimulationOutput::new(annual_energy_kwh, design.installed_cost(), ac_limit, monthly)
}
