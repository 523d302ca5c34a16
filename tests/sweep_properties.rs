use approx::assert_relative_eq;
use proptest::prelude::*;

use solarsweep::analysis::aggregation::{country_summaries, min_lcoe_by_country};
use solarsweep::analysis::lcoe::{fixed_charge_lcoe, LcoeInputs};
use solarsweep::config::countries::{Country, Hemisphere};
use solarsweep::core::sweep::{sweep_sites, LoadedSite, SweepOptions, SweepParameter, SweepSpec};
use solarsweep::analysis::lcoe::EconomicParams;
use solarsweep::models::csp::CspDesign;
use solarsweep::models::resource::{ResourceMetadata, SolarResource};
use solarsweep::models::simulator::{PlantConfig, SimulationError, SimulationOutput, Simulator, Technology};
use solarsweep::models::sweep_point::SweepPoint;

/// Energy grows with storage hours; anything above `fail_above` errors.
struct ThresholdSimulator {
    fail_above: f64,
}

impl Simulator for ThresholdSimulator {
    fn simulate(&self, _resource: &SolarResource, plant: &PlantConfig) -> Result<SimulationOutput, SimulationError> {
        let hours = match plant {
            PlantConfig::Csp(design) => design.tes_hours,
            PlantConfig::Pv(design) => design.tilt,
        };
        if hours > self.fail_above {
            return Err(SimulationError::Backend(format!("{} h rejected", hours)));
        }
        SimulationOutput::new(1.0e8 + hours * 1.0e6, 4.0e8, 1.0e5, [0.0; 12])
    }
}

fn site(name: &str) -> LoadedSite {
    LoadedSite {
        country: Country::new(name, "unused.csv", Hemisphere::Southern),
        resource: SolarResource::new(
            ResourceMetadata {
                location: name.to_string(),
                latitude: -23.0,
                longitude: -70.0,
                time_zone: -4.0,
                elevation: 0.0,
            },
            Vec::new(),
        ),
    }
}

fn point(country: &str, value: f64, lcoe: Option<f64>) -> SweepPoint {
    SweepPoint {
        country: country.to_string(),
        technology: Technology::Pv,
        parameter: SweepParameter::Tilt,
        value,
        annual_energy_kwh: 1.0e6 + value,
        installed_cost: 1.0e6,
        capital_cost: 1.0e6,
        fixed_charge_rate: 0.07,
        fixed_operating_cost: 0.0,
        variable_operating_cost: 0.0,
        capacity_factor: 0.2,
        lcoe,
    }
}

proptest! {
    #[test]
    fn lcoe_matches_fixed_charge_formula(
        fcr in 0.01f64..0.2,
        capital in 1.0e5f64..1.0e9,
        fixed_om in 0.0f64..1.0e7,
        variable_om in 0.0f64..0.05,
        energy in 1.0e3f64..1.0e9,
    ) {
        let inputs = LcoeInputs {
            fixed_charge_rate: fcr,
            capital_cost: capital,
            fixed_operating_cost: fixed_om,
            variable_operating_cost: variable_om,
            annual_energy_kwh: energy,
        };
        let lcoe = fixed_charge_lcoe(&inputs).unwrap();
        let expected = (fcr * capital + fixed_om) / energy + variable_om;
        prop_assert_eq!(lcoe, expected);
    }

    #[test]
    fn lcoe_undefined_without_positive_energy(energy in -1.0e6f64..=0.0) {
        let inputs = LcoeInputs {
            fixed_charge_rate: 0.07,
            capital_cost: 1.0e6,
            fixed_operating_cost: 0.0,
            variable_operating_cost: 0.0,
            annual_energy_kwh: energy,
        };
        prop_assert_eq!(fixed_charge_lcoe(&inputs), None);
    }

    #[test]
    fn failed_points_leave_the_rest_intact(
        hours in prop::collection::btree_set(0u32..30, 1..12),
        fail_above in 0u32..30,
        parallel in any::<bool>(),
    ) {
        let values: Vec<f64> = hours.iter().map(|h| *h as f64).collect();
        let expected_failures = values.iter().filter(|v| **v > fail_above as f64).count();
        let spec = SweepSpec::new(
            SweepParameter::StorageHours,
            values.clone(),
            PlantConfig::Csp(CspDesign::default()),
            EconomicParams::csp_default(),
        ).unwrap();
        let sites = vec![site("chile"), site("espana")];
        let sim = ThresholdSimulator { fail_above: fail_above as f64 };
        let table = sweep_sites(&sites, &spec, &sim, &SweepOptions { parallel, show_progress: false });

        prop_assert_eq!(table.outcomes().len(), 2 * values.len());
        prop_assert_eq!(table.failures().len(), 2 * expected_failures);
        prop_assert_eq!(table.valid_points().len(), 2 * (values.len() - expected_failures));
        prop_assert!(table.valid_points().iter().all(|p| p.lcoe.is_some()));
        let order: Vec<(String, f64)> = table.outcomes().iter().map(|o| (o.country.clone(), o.value)).collect();
        let expected: Vec<(String, f64)> = ["chile", "espana"]
            .iter()
            .flat_map(|c| values.iter().map(move |v| (c.to_string(), *v)))
            .collect();
        prop_assert_eq!(order, expected);
    }

    #[test]
    fn extrema_ignore_undefined_lcoe(lcoes in prop::collection::vec(prop::option::of(0.01f64..1.0), 1..20)) {
        let points: Vec<SweepPoint> = lcoes.iter().enumerate().map(|(i, l)| point("chile", i as f64, *l)).collect();
        let defined: Vec<f64> = lcoes.iter().flatten().copied().collect();
        let summary = &country_summaries(&points)[0];
        prop_assert_eq!(summary.points, points.len());
        if defined.is_empty() {
            prop_assert_eq!(summary.min_lcoe, None);
            prop_assert!(min_lcoe_by_country(&points).is_empty());
        } else {
            let min = defined.iter().copied().fold(f64::INFINITY, f64::min);
            let max = defined.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            prop_assert_eq!(summary.min_lcoe, Some(min));
            prop_assert_eq!(summary.max_lcoe, Some(max));
            prop_assert_eq!(min_lcoe_by_country(&points)[0].lcoe, min);
        }
    }
}

#[test]
fn economic_sweep_reprices_one_simulation() {
    let spec = SweepSpec::new(
        SweepParameter::FixedChargeRate,
        vec![0.05, 0.10],
        PlantConfig::Csp(CspDesign::default()),
        EconomicParams::csp_default(),
    )
    .unwrap();
    let table = sweep_sites(&[site("chile")], &spec, &ThresholdSimulator { fail_above: 100.0 }, &SweepOptions::default());
    let points = table.valid_points();
    assert_eq!(points.len(), 2);
    assert_eq!(points[0].annual_energy_kwh, points[1].annual_energy_kwh);
    assert_relative_eq!(points[0].fixed_charge_rate, 0.05);
    assert!(points[1].lcoe.unwrap() > points[0].lcoe.unwrap());
}
