//! Parametric sweep driver.
//!
//! Evaluates every (country, value) combination of one swept parameter against
//! a [`Simulator`]. A failure evaluating one combination is recorded as an
//! `Err` outcome and never aborts the sweep. Aggregation downstream only sees
//! the `Ok` subset.

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{debug, warn};
use crate::analysis::lcoe::{fixed_charge_lcoe, EconomicParams};
use crate::config::countries::Country;
use crate::data::resource_loader::load_country;
use crate::models::resource::SolarResource;
use crate::models::simulator::{PlantConfig, SimulationOutput, Simulator, Technology};
use crate::models::sweep_point::{PointFailure, SweepOutcome, SweepPoint};
use crate::utils::logging::{self, OperationCategory};

pub use crate::models::sweep_point::SweepParameter;

#[derive(Debug, Clone, PartialEq)]
pub enum SweepSpecError {
    NotApplicable { parameter: SweepParameter, technology: Technology },
    NoValues(SweepParameter),
    PlantMismatch { expected: Technology, found: Technology },
}

impl std::fmt::Display for SweepSpecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SweepSpecError::NotApplicable { parameter, technology } => {
                write!(f, "Parameter '{}' cannot be swept for {}", parameter, technology)
            }
            SweepSpecError::NoValues(parameter) => write!(f, "No values given for '{}'", parameter),
            SweepSpecError::PlantMismatch { expected, found } => {
                write!(f, "Sweep is for {} but the base plant is {}", expected, found)
            }
        }
    }
}

impl std::error::Error for SweepSpecError {}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepSpec {
    pub technology: Technology,
    pub parameter: SweepParameter,
    pub values: Vec<f64>,
    pub base_plant: PlantConfig,
    pub economics: EconomicParams,
    /// Point PV arrays at the equator using each country's hemisphere.
    pub orient_pv_to_equator: bool,
}

impl SweepSpec {
    pub fn new(
        parameter: SweepParameter,
        values: Vec<f64>,
        base_plant: PlantConfig,
        economics: EconomicParams,
    ) -> Result<Self, SweepSpecError> {
        let spec = Self {
            technology: base_plant.technology(),
            parameter,
            values,
            base_plant,
            economics,
            orient_pv_to_equator: true,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<(), SweepSpecError> {
        if self.base_plant.technology() != self.technology {
            return Err(SweepSpecError::PlantMismatch {
                expected: self.technology,
                found: self.base_plant.technology(),
            });
        }
        if !self.parameter.applies_to(self.technology) {
            return Err(SweepSpecError::NotApplicable {
                parameter: self.parameter,
                technology: self.technology,
            });
        }
        if self.values.is_empty() {
            return Err(SweepSpecError::NoValues(self.parameter));
        }
        Ok(())
    }

    /// Base plant for one country, with the swept value applied when it is physical.
    pub fn plant_for(&self, country: &Country, value: Option<f64>) -> PlantConfig {
        let mut plant = self.base_plant.clone();
        if let PlantConfig::Pv(design) = &mut plant {
            if self.orient_pv_to_equator {
                design.azimuth = country.hemisphere.pv_azimuth();
            }
        }
        let Some(value) = value else { return plant };
        match (&mut plant, self.parameter) {
            (PlantConfig::Csp(design), SweepParameter::StorageHours) => design.tes_hours = value,
            (PlantConfig::Csp(design), SweepParameter::SolarMultiple) => design.solar_multiple = value,
            (PlantConfig::Pv(design), SweepParameter::Tilt) => design.tilt = value,
            (PlantConfig::Pv(design), SweepParameter::DcAcRatio) => design.dc_ac_ratio = value,
            (PlantConfig::Pv(design), SweepParameter::Capacity) => design.capacity_kw = value,
            (PlantConfig::Pv(design), SweepParameter::InverterEfficiency) => design.inv_eff = value,
            _ => {}
        }
        plant
    }

    pub fn economics_for(&self, value: f64) -> EconomicParams {
        let mut economics = self.economics.clone();
        match self.parameter {
            SweepParameter::FixedChargeRate => economics.fixed_charge_rate = value,
            SweepParameter::CapitalCost => economics.capital_cost = Some(value),
            SweepParameter::FixedOperatingCost => economics.fixed_operating_cost = value,
            SweepParameter::VariableOperatingCost => economics.variable_operating_cost = value,
            _ => {}
        }
        economics
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOptions {
    pub parallel: bool,
    pub show_progress: bool,
}

/// A country whose resource could not be loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedCountry {
    pub country: String,
    pub reason: String,
}

/// A country with its resource loaded and ready to simulate.
#[derive(Debug, Clone)]
pub struct LoadedSite {
    pub country: Country,
    pub resource: SolarResource,
}

#[derive(Debug, Clone)]
pub struct SweepTable {
    pub technology: Technology,
    pub parameter: SweepParameter,
    outcomes: Vec<SweepOutcome>,
    skipped: Vec<SkippedCountry>,
}

impl SweepTable {
    pub fn outcomes(&self) -> &[SweepOutcome] {
        &self.outcomes
    }

    pub fn valid_points(&self) -> Vec<SweepPoint> {
        self.outcomes.iter().filter_map(|o| o.point().cloned()).collect()
    }

    pub fn failures(&self) -> Vec<PointFailure> {
        self.outcomes.iter().filter_map(|o| o.failure().cloned()).collect()
    }

    pub fn skipped_countries(&self) -> &[SkippedCountry] {
        &self.skipped
    }

    pub fn has_valid_points(&self) -> bool {
        self.outcomes.iter().any(SweepOutcome::is_ok)
    }
}

/// Loads every country's resource. Countries that fail are returned as skipped.
pub fn load_sites(countries: &[Country]) -> (Vec<LoadedSite>, Vec<SkippedCountry>) {
    let mut sites = Vec::new();
    let mut skipped = Vec::new();
    for country in countries {
        match load_country(country) {
            Ok(resource) => sites.push(LoadedSite { country: country.clone(), resource }),
            Err(e) => {
                warn!("Skipping {}: {}", country.name, e);
                skipped.push(SkippedCountry { country: country.name.clone(), reason: e.to_string() });
            }
        }
    }
    (sites, skipped)
}

/// Loads each country's resource and sweeps the ones that loaded.
pub fn run_sweep<S: Simulator + ?Sized>(
    countries: &[Country],
    spec: &SweepSpec,
    simulator: &S,
    options: &SweepOptions,
) -> SweepTable {
    let (sites, skipped) = load_sites(countries);
    let mut table = sweep_sites(&sites, spec, simulator, options);
    table.skipped.extend(skipped);
    table
}

fn progress_bar(len: usize, options: &SweepOptions, spec: &SweepSpec) -> ProgressBar {
    if !options.show_progress {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message(format!("{} {}", spec.technology, spec.parameter));
    pb
}

fn price(
    site: &LoadedSite,
    spec: &SweepSpec,
    value: f64,
    output: &SimulationOutput,
    economics: &EconomicParams,
) -> SweepPoint {
    let _timing = logging::start_timing("price_point", OperationCategory::Economics);
    let inputs = economics.inputs(output.annual_energy_kwh, output.installed_cost);
    SweepPoint {
        country: site.country.name.clone(),
        technology: spec.technology,
        parameter: spec.parameter,
        value,
        annual_energy_kwh: output.annual_energy_kwh,
        installed_cost: output.installed_cost,
        capital_cost: inputs.capital_cost,
        fixed_charge_rate: inputs.fixed_charge_rate,
        fixed_operating_cost: inputs.fixed_operating_cost,
        variable_operating_cost: inputs.variable_operating_cost,
        capacity_factor: output.capacity_factor,
        lcoe: fixed_charge_lcoe(&inputs),
    }
}

fn outcome(
    site: &LoadedSite,
    spec: &SweepSpec,
    value: f64,
    simulated: &Result<SimulationOutput, String>,
) -> SweepOutcome {
    let result = match simulated {
        Ok(output) => {
            let point = price(site, spec, value, output, &spec.economics_for(value));
            if point.lcoe.is_none() {
                debug!("{} {}={}: LCOE undefined for {} kWh", site.country.name, spec.parameter, value, point.annual_energy_kwh);
            }
            Ok(point)
        }
        Err(reason) => {
            warn!("{} {} {}={} failed: {}", site.country.name, spec.technology, spec.parameter, value, reason);
            Err(PointFailure {
                country: site.country.name.clone(),
                technology: spec.technology,
                parameter: spec.parameter,
                value,
                reason: reason.clone(),
            })
        }
    };
    SweepOutcome {
        country: site.country.name.clone(),
        parameter: spec.parameter,
        value,
        result,
    }
}

fn simulate<S: Simulator + ?Sized>(simulator: &S, site: &LoadedSite, plant: &PlantConfig) -> Result<SimulationOutput, String> {
    simulator.simulate(&site.resource, plant).map_err(|e| e.to_string())
}

/// Sweeps already loaded sites. Output order is country-major, then value
/// order, whether or not the evaluation runs in parallel.
pub fn sweep_sites<S: Simulator + ?Sized>(
    sites: &[LoadedSite],
    spec: &SweepSpec,
    simulator: &S,
    options: &SweepOptions,
) -> SweepTable {
    let items: Vec<(usize, f64)> = sites
        .iter()
        .enumerate()
        .flat_map(|(i, _)| spec.values.iter().map(move |v| (i, *v)))
        .collect();
    let pb = progress_bar(items.len(), options, spec);

    let outcomes: Vec<SweepOutcome> = if spec.parameter.is_economic() {
        // One simulation per country; every value re-prices it
        let base = |site: &LoadedSite| simulate(simulator, site, &spec.plant_for(&site.country, None));
        let bases: Vec<Result<SimulationOutput, String>> = if options.parallel {
            sites.par_iter().map(base).collect()
        } else {
            sites.iter().map(base).collect()
        };
        items
            .iter()
            .map(|(i, value)| {
                pb.inc(1);
                let simulated = bases[*i].as_ref().map_err(|e| format!("base simulation failed: {}", e)).cloned();
                outcome(&sites[*i], spec, *value, &simulated)
            })
            .collect()
    } else {
        let evaluate = |(i, value): &(usize, f64)| {
            let site = &sites[*i];
            let simulated = simulate(simulator, site, &spec.plant_for(&site.country, Some(*value)));
            pb.inc(1);
            outcome(site, spec, *value, &simulated)
        };
        if options.parallel {
            items.par_iter().map(evaluate).collect()
        } else {
            items.iter().map(evaluate).collect()
        }
    };
    pb.finish_and_clear();

    SweepTable {
        technology: spec.technology,
        parameter: spec.parameter,
        outcomes,
        skipped: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::countries::Hemisphere;
    use crate::models::csp::CspDesign;
    use crate::models::pv::PvDesign;
    use crate::models::resource::test_support::flat_resource;
    use crate::models::simulator::SimulationError;
    use parking_lot::Mutex;

    /// Energy equals the swept physical value; fails above a threshold.
    struct EchoSimulator {
        fail_above: f64,
        calls: Mutex<usize>,
    }

    impl Simulator for EchoSimulator {
        fn simulate(&self, _resource: &SolarResource, plant: &PlantConfig) -> Result<SimulationOutput, SimulationError> {
            *self.calls.lock() += 1;
            let value = match plant {
                PlantConfig::Csp(d) => d.tes_hours,
                PlantConfig::Pv(d) => d.tilt,
            };
            if value > self.fail_above {
                return Err(SimulationError::Backend(format!("value {} out of range", value)));
            }
            SimulationOutput::new(value * 1000.0, 1.0e6, 1000.0, [0.0; 12])
        }
    }

    fn sites(names: &[&str]) -> Vec<LoadedSite> {
        names
            .iter()
            .map(|name| LoadedSite {
                country: Country::new(name, "unused.csv", Hemisphere::Southern),
                resource: flat_resource(1, 900.0),
            })
            .collect()
    }

    fn storage_spec(values: Vec<f64>) -> SweepSpec {
        SweepSpec::new(
            SweepParameter::StorageHours,
            values,
            PlantConfig::Csp(CspDesign::default()),
            EconomicParams::csp_default(),
        )
        .unwrap()
    }

    #[test]
    fn rejects_parameter_for_wrong_technology() {
        let err = SweepSpec::new(
            SweepParameter::Tilt,
            vec![10.0],
            PlantConfig::Csp(CspDesign::default()),
            EconomicParams::csp_default(),
        )
        .unwrap_err();
        assert!(matches!(err, SweepSpecError::NotApplicable { .. }));
        assert!(matches!(
            SweepSpec::new(SweepParameter::Tilt, vec![], PlantConfig::Pv(PvDesign::default()), EconomicParams::pv_default()),
            Err(SweepSpecError::NoValues(_))
        ));
    }

    #[test]
    fn failures_are_isolated() {
        let sim = EchoSimulator { fail_above: 10.0, calls: Mutex::new(0) };
        let spec = storage_spec(vec![4.0, 8.0, 12.0, 16.0]);
        let table = sweep_sites(&sites(&["chile", "espana"]), &spec, &sim, &SweepOptions::default());
        assert_eq!(table.outcomes().len(), 8);
        assert_eq!(table.valid_points().len(), 4);
        assert_eq!(table.failures().len(), 4);
        assert!(table.failures().iter().all(|f| f.value > 10.0));
    }

    #[test]
    fn parallel_preserves_sequential_order() {
        let sim = EchoSimulator { fail_above: 100.0, calls: Mutex::new(0) };
        let spec = storage_spec((0..20).map(|v| v as f64).collect());
        let all = sites(&["chile", "australia", "espana"]);
        let sequential = sweep_sites(&all, &spec, &sim, &SweepOptions::default());
        let parallel = sweep_sites(&all, &spec, &sim, &SweepOptions { parallel: true, show_progress: false });
        assert_eq!(sequential.outcomes(), parallel.outcomes());
        assert_eq!(parallel.outcomes()[20].country, "australia");
    }

    #[test]
    fn economic_sweep_simulates_once_per_country() {
        let sim = EchoSimulator { fail_above: 100.0, calls: Mutex::new(0) };
        let spec = SweepSpec::new(
            SweepParameter::FixedChargeRate,
            vec![0.05, 0.06, 0.07],
            PlantConfig::Csp(CspDesign { tes_hours: 12.0, ..CspDesign::default() }),
            EconomicParams::csp_default(),
        )
        .unwrap();
        let table = sweep_sites(&sites(&["chile", "espana"]), &spec, &sim, &SweepOptions::default());
        assert_eq!(*sim.calls.lock(), 2);
        let points = table.valid_points();
        assert_eq!(points.len(), 6);
        assert_eq!(points[1].fixed_charge_rate, 0.06);
        assert!(points[0].lcoe < points[2].lcoe);
    }

    #[test]
    fn failed_base_fails_every_economic_point() {
        let sim = EchoSimulator { fail_above: 5.0, calls: Mutex::new(0) };
        let spec = SweepSpec::new(
            SweepParameter::FixedChargeRate,
            vec![0.05, 0.06],
            PlantConfig::Csp(CspDesign { tes_hours: 12.0, ..CspDesign::default() }),
            EconomicParams::csp_default(),
        )
        .unwrap();
        let table = sweep_sites(&sites(&["chile"]), &spec, &sim, &SweepOptions::default());
        assert!(!table.has_valid_points());
        assert!(table.failures().iter().all(|f| f.reason.starts_with("base simulation failed")));
    }

    #[test]
    fn pv_arrays_face_the_equator() {
        let spec = SweepSpec::new(
            SweepParameter::Tilt,
            vec![20.0],
            PlantConfig::Pv(PvDesign::default()),
            EconomicParams::pv_default(),
        )
        .unwrap();
        let south = Country::new("chile", "x.csv", Hemisphere::Southern);
        match spec.plant_for(&south, Some(35.0)) {
            PlantConfig::Pv(design) => {
                assert_eq!(design.azimuth, 0.0);
                assert_eq!(design.tilt, 35.0);
            }
            other => panic!("unexpected plant {:?}", other),
        }
    }

    #[test]
    fn missing_resource_files_skip_the_country() {
        let countries = vec![Country::new("atlantis", "/nonexistent/atlantis.csv", Hemisphere::Northern)];
        let table = run_sweep(&countries, &storage_spec(vec![4.0]), &crate::ReferenceSimulator, &SweepOptions::default());
        assert!(table.outcomes().is_empty());
        assert_eq!(table.skipped_countries()[0].country, "atlantis");
    }
}
