use serde::{Deserialize, Serialize};
use crate::models::simulator::Technology;

/// A swept input. Physical parameters change the plant and need a fresh
/// simulation; economic parameters only re-price a base simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepParameter {
    StorageHours,
    SolarMultiple,
    Tilt,
    DcAcRatio,
    Capacity,
    InverterEfficiency,
    FixedChargeRate,
    CapitalCost,
    FixedOperatingCost,
    VariableOperatingCost,
}

impl SweepParameter {
    pub const ALL: [SweepParameter; 10] = [
        SweepParameter::StorageHours,
        SweepParameter::SolarMultiple,
        SweepParameter::Tilt,
        SweepParameter::DcAcRatio,
        SweepParameter::Capacity,
        SweepParameter::InverterEfficiency,
        SweepParameter::FixedChargeRate,
        SweepParameter::CapitalCost,
        SweepParameter::FixedOperatingCost,
        SweepParameter::VariableOperatingCost,
    ];

    pub fn applies_to(&self, technology: Technology) -> bool {
        match self {
            SweepParameter::StorageHours | SweepParameter::SolarMultiple => technology == Technology::Csp,
            SweepParameter::Tilt
            | SweepParameter::DcAcRatio
            | SweepParameter::Capacity
            | SweepParameter::InverterEfficiency => technology == Technology::Pv,
            _ => true,
        }
    }

    pub fn is_economic(&self) -> bool {
        matches!(
            self,
            SweepParameter::FixedChargeRate
                | SweepParameter::CapitalCost
                | SweepParameter::FixedOperatingCost
                | SweepParameter::VariableOperatingCost
        )
    }

    pub fn column_name(&self) -> &'static str {
        match self {
            SweepParameter::StorageHours => "storage_hours",
            SweepParameter::SolarMultiple => "solar_multiple",
            SweepParameter::Tilt => "tilt",
            SweepParameter::DcAcRatio => "dc_ac_ratio",
            SweepParameter::Capacity => "capacity_kw",
            SweepParameter::InverterEfficiency => "inverter_efficiency",
            SweepParameter::FixedChargeRate => "fixed_charge_rate",
            SweepParameter::CapitalCost => "capital_cost",
            SweepParameter::FixedOperatingCost => "fixed_operating_cost",
            SweepParameter::VariableOperatingCost => "variable_operating_cost",
        }
    }

    /// Axis label with units, for charts.
    pub fn label(&self) -> &'static str {
        match self {
            SweepParameter::StorageHours => "Storage (h)",
            SweepParameter::SolarMultiple => "Solar multiple",
            SweepParameter::Tilt => "Tilt (deg)",
            SweepParameter::DcAcRatio => "DC/AC ratio",
            SweepParameter::Capacity => "System capacity (kW)",
            SweepParameter::InverterEfficiency => "Inverter efficiency (%)",
            SweepParameter::FixedChargeRate => "Fixed charge rate",
            SweepParameter::CapitalCost => "Capital cost ($)",
            SweepParameter::FixedOperatingCost => "Fixed O&M ($/yr)",
            SweepParameter::VariableOperatingCost => "Variable O&M ($/kWh)",
        }
    }
}

impl std::fmt::Display for SweepParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.column_name())
    }
}

impl std::str::FromStr for SweepParameter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace(['-', ' '], "_");
        let parameter = match key.as_str() {
            "tshours" | "storage" => SweepParameter::StorageHours,
            "solarm" => SweepParameter::SolarMultiple,
            "dc_ac" | "dcac" => SweepParameter::DcAcRatio,
            "capacity" | "system_capacity" => SweepParameter::Capacity,
            "inv_eff" => SweepParameter::InverterEfficiency,
            "fcr" => SweepParameter::FixedChargeRate,
            other => match SweepParameter::ALL.iter().find(|p| p.column_name() == other) {
                Some(p) => *p,
                None => return Err(format!("unknown sweep parameter '{}'", s)),
            },
        };
        Ok(parameter)
    }
}

/// One successfully evaluated configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub country: String,
    pub technology: Technology,
    pub parameter: SweepParameter,
    pub value: f64,
    pub annual_energy_kwh: f64,
    // Tables from other tools may carry only the identifying columns and LCOE
    #[serde(default)]
    pub installed_cost: f64,
    #[serde(default)]
    pub capital_cost: f64,
    #[serde(default)]
    pub fixed_charge_rate: f64,
    #[serde(default)]
    pub fixed_operating_cost: f64,
    #[serde(default)]
    pub variable_operating_cost: f64,
    #[serde(default)]
    pub capacity_factor: f64,
    pub lcoe: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointFailure {
    pub country: String,
    pub technology: Technology,
    pub parameter: SweepParameter,
    pub value: f64,
    pub reason: String,
}

/// The tagged result of evaluating one (country, value) combination.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepOutcome {
    pub country: String,
    pub parameter: SweepParameter,
    pub value: f64,
    pub result: Result<SweepPoint, PointFailure>,
}

impl SweepOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn point(&self) -> Option<&SweepPoint> {
        self.result.as_ref().ok()
    }

    pub fn failure(&self) -> Option<&PointFailure> {
        self.result.as_ref().err()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_names_round_trip_through_from_str() {
        for parameter in SweepParameter::ALL {
            assert_eq!(parameter.column_name().parse::<SweepParameter>().unwrap(), parameter);
        }
        assert_eq!("tshours".parse::<SweepParameter>().unwrap(), SweepParameter::StorageHours);
        assert_eq!("DC-AC".parse::<SweepParameter>().unwrap(), SweepParameter::DcAcRatio);
        assert!("albedo".parse::<SweepParameter>().is_err());
    }

    #[test]
    fn applicability_by_technology() {
        assert!(SweepParameter::StorageHours.applies_to(Technology::Csp));
        assert!(!SweepParameter::StorageHours.applies_to(Technology::Pv));
        assert!(!SweepParameter::Tilt.applies_to(Technology::Csp));
        assert!(SweepParameter::FixedChargeRate.applies_to(Technology::Pv));
        assert!(SweepParameter::FixedChargeRate.applies_to(Technology::Csp));
    }

    #[test]
    fn only_pricing_inputs_are_economic() {
        let economic: Vec<_> = SweepParameter::ALL.iter().filter(|p| p.is_economic()).collect();
        assert_eq!(economic.len(), 4);
        assert!(!SweepParameter::InverterEfficiency.is_economic());
    }
}
