//! Fixed-charge-rate levelized cost of energy.
//!
//! LCOE = (capital_cost × fcr + fixed_om) / annual_energy + variable_om
//!
//! Capital and fixed O&M are in $ and $/yr, energy in kWh/yr, variable O&M
//! in $/kWh, so the result is in $/kWh.

use serde::{Deserialize, Serialize};
use crate::config::constants::*;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LcoeInputs {
    pub annual_energy_kwh: f64,
    pub capital_cost: f64,
    pub fixed_charge_rate: f64,
    pub fixed_operating_cost: f64,
    pub variable_operating_cost: f64,
}

/// Economic assumptions applied to a simulation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomicParams {
    pub fixed_charge_rate: f64,
    pub fixed_operating_cost: f64,     // $/yr
    pub variable_operating_cost: f64,  // $/kWh
    /// Overrides the simulator's installed cost when set.
    pub capital_cost: Option<f64>,
}

impl EconomicParams {
    pub fn csp_default() -> Self {
        Self {
            fixed_charge_rate: CSP_FIXED_CHARGE_RATE,
            fixed_operating_cost: CSP_FIXED_OPERATING_COST,
            variable_operating_cost: CSP_VARIABLE_OPERATING_COST,
            capital_cost: None,
        }
    }

    pub fn pv_default() -> Self {
        Self {
            fixed_charge_rate: PV_FIXED_CHARGE_RATE,
            fixed_operating_cost: PV_FIXED_OPERATING_COST,
            variable_operating_cost: PV_VARIABLE_OPERATING_COST,
            capital_cost: Some(PV_CAPITAL_COST),
        }
    }

    /// Replaces the O&M costs with ones derived from a $/kW-yr rate on
    /// `capacity_kw` and a $/MWh variable rate.
    pub fn with_om_rates(mut self, fixed_per_kw_year: f64, capacity_kw: f64, variable_per_mwh: f64) -> Self {
        self.fixed_operating_cost = fixed_om_total(fixed_per_kw_year, capacity_kw);
        self.variable_operating_cost = variable_om_per_kwh(variable_per_mwh);
        self
    }

    pub fn capital_for(&self, installed_cost: f64) -> f64 {
        self.capital_cost.unwrap_or(installed_cost)
    }

    pub fn inputs(&self, annual_energy_kwh: f64, installed_cost: f64) -> LcoeInputs {
        LcoeInputs {
            annual_energy_kwh,
            capital_cost: self.capital_for(installed_cost),
            fixed_charge_rate: self.fixed_charge_rate,
            fixed_operating_cost: self.fixed_operating_cost,
            variable_operating_cost: self.variable_operating_cost,
        }
    }
}

/// Returns `None` when the LCOE is undefined: no (or non-finite) energy, or a
/// non-finite result.
pub fn fixed_charge_lcoe(inputs: &LcoeInputs) -> Option<f64> {
    let energy = inputs.annual_energy_kwh;
    if !energy.is_finite() || energy <= 0.0 {
        return None;
    }
    let lcoe = (inputs.capital_cost * inputs.fixed_charge_rate + inputs.fixed_operating_cost) / energy
        + inputs.variable_operating_cost;
    lcoe.is_finite().then_some(lcoe)
}

/// Annual fixed O&M in $ from a $/kW-yr rate.
pub fn fixed_om_total(per_kw_year: f64, capacity_kw: f64) -> f64 {
    per_kw_year * capacity_kw
}

/// Variable O&M in $/kWh from a $/MWh rate.
pub fn variable_om_per_kwh(per_mwh: f64) -> f64 {
    per_mwh / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn worked_example() {
        let inputs = LcoeInputs {
            annual_energy_kwh: 2_000_000.0,
            capital_cost: 1_000_000.0,
            fixed_charge_rate: 0.07,
            fixed_operating_cost: 50_000.0,
            variable_operating_cost: 0.01,
        };
        assert_relative_eq!(fixed_charge_lcoe(&inputs).unwrap(), 0.07, max_relative = 1e-12);
    }

    #[test]
    fn zero_energy_is_undefined() {
        let mut inputs = EconomicParams::pv_default().inputs(0.0, 0.0);
        assert_eq!(fixed_charge_lcoe(&inputs), None);
        inputs.annual_energy_kwh = f64::NAN;
        assert_eq!(fixed_charge_lcoe(&inputs), None);
        inputs.annual_energy_kwh = -5.0;
        assert_eq!(fixed_charge_lcoe(&inputs), None);
    }

    #[test]
    fn capital_override_beats_installed_cost() {
        assert_eq!(EconomicParams::pv_default().capital_for(5.0e6), PV_CAPITAL_COST);
        assert_eq!(EconomicParams::csp_default().capital_for(5.0e6), 5.0e6);
    }

    #[test]
    fn om_unit_conversions() {
        // 66 $/kWe-yr on a 115 MWe plant, 3.5 $/MWh
        assert_relative_eq!(fixed_om_total(66.0, 115_000.0), 7_590_000.0);
        assert_relative_eq!(variable_om_per_kwh(3.5), 0.0035);
        let economics = EconomicParams::csp_default().with_om_rates(66.0, 115_000.0, 3.5);
        assert_relative_eq!(economics.fixed_operating_cost, 7_590_000.0);
        assert_eq!(economics.fixed_charge_rate, CSP_FIXED_CHARGE_RATE);
    }
}
