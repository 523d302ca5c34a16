use std::fs;
use std::path::Path;

use solarsweep::config::campaign_config::{CampaignConfig, ValueRange};
use solarsweep::config::countries::{Country, Hemisphere};
use solarsweep::analysis::lcoe::EconomicParams;
use solarsweep::core::campaign::{export_sweep, run_campaign, run_comparison, CampaignScope, ComparisonInputs};
use solarsweep::core::sweep::{sweep_sites, LoadedSite, SweepOptions, SweepParameter, SweepSpec};
use solarsweep::data::synthetic;
use solarsweep::models::csp::CspDesign;
use solarsweep::models::simulator::{PlantConfig, ReferenceSimulator, SimulationError, SimulationOutput, Simulator};
use solarsweep::models::resource::{ResourceMetadata, SolarResource};
use solarsweep::utils::csv_export::CsvExporter;

fn small_config(dir: &Path) -> CampaignConfig {
    let chile = dir.join("chile.csv");
    let espana = dir.join("espana.csv");
    synthetic::write_nsrdb_csv(&synthetic::generate(-23.6, -70.4, -4.0, 2023, 1), &chile).unwrap();
    synthetic::write_nsrdb_csv(&synthetic::generate(37.4, -5.9, 1.0, 2023, 2), &espana).unwrap();

    let mut config = CampaignConfig::default();
    config.countries = vec![
        Country::new("chile", &chile, Hemisphere::Southern),
        Country::new("espana", &espana, Hemisphere::Northern),
        Country::new("australia", dir.join("missing.csv"), Hemisphere::Southern),
    ];
    config.csp.storage_hours = ValueRange::new(4.0, 8.0, 4.0);
    config.csp.fixed_charge_rates = ValueRange::new(0.05, 0.06, 0.01);
    config.csp.solar_multiples = ValueRange::new(2.0, 2.5, 0.5);
    config.pv.capacities_kw = vec![1_000.0, 10_000.0];
    config.pv.tilts = ValueRange::new(20.0, 30.0, 10.0);
    config.pv.dc_ac_ratios = ValueRange::new(1.1, 1.2, 0.1);
    config.pv.fixed_charge_rates = ValueRange::new(0.05, 0.06, 0.01);
    config.pv.inverter_efficiencies = ValueRange::new(95.0, 96.0, 1.0);
    config.pv.capital_costs = ValueRange::new(1.0e6, 1.5e6, 0.5e6);
    config.pv.fixed_operating_costs = ValueRange::new(25_000.0, 50_000.0, 25_000.0);
    config.pv.variable_operating_costs = ValueRange::new(0.005, 0.01, 0.005);
    config.pv.reference_capacity_kw = 10_000.0;
    config
}

#[test]
fn full_campaign_writes_tables_charts_and_index() {
    let dir = std::env::temp_dir().join(format!("solarsweep_campaign_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    let config = small_config(&dir);
    config.validate().unwrap();

    let exporter = CsvExporter::in_dir(dir.join("out"), "e2e".to_string(), false);
    let options = SweepOptions { parallel: true, show_progress: false };
    let report = run_campaign(&config, CampaignScope::Both, &ReferenceSimulator, options, &exporter, true).unwrap();

    assert_eq!(report.sweeps.len(), 11);
    assert_eq!(report.total_failed(), 0);
    assert_eq!(report.csp_storage.len(), 4);
    assert_eq!(report.pv_capacity.len(), 4);
    assert_eq!(report.pv_tilt.len(), 4);
    assert_eq!(report.comparisons_written, 2);
    assert_eq!(report.resources.len(), 2);
    assert!(report.csp_storage.iter().all(|p| p.lcoe.is_some() && p.annual_energy_kwh > 0.0));

    let chile: Vec<_> = report.csp_storage.iter().filter(|p| p.country == "chile").map(|p| p.value).collect();
    assert_eq!(chile, vec![4.0, 8.0]);

    let out = exporter.output_dir();
    for file in [
        "csp_storage_hours.csv",
        "csp_storage_hours_summary.csv",
        "csp_storage_hours_lcoe.svg",
        "pv_capacity.csv",
        "pv_sensitivity_variable_om_energy.svg",
        "csp_vs_pv_lcoe.csv",
        "csp_vs_pv_lcoe.svg",
        "min_lcoe_by_country.svg",
        "generation_chile.csv",
        "resource_monthly.csv",
        "resource_daily_chile.svg",
        "resource_max_daily.svg",
        "index.html",
    ] {
        assert!(out.join(file).exists(), "missing {}", file);
    }
    assert!(!out.join("csp_storage_hours_failures.csv").exists());

    let index = fs::read_to_string(out.join("index.html")).unwrap();
    assert!(index.contains("min_lcoe_by_country.svg"));
    assert!(!fs::read_to_string(out.join("csp_storage_hours.csv")).unwrap().contains("australia"));
}

#[test]
fn campaign_without_any_resource_writes_nothing() {
    let dir = std::env::temp_dir().join(format!("solarsweep_empty_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();

    let mut config = CampaignConfig::default();
    config.countries = vec![Country::new("chile", dir.join("nope.csv"), Hemisphere::Southern)];
    let exporter = CsvExporter::in_dir(dir.join("out"), "empty".to_string(), false);
    let report = run_campaign(&config, CampaignScope::Csp, &ReferenceSimulator, SweepOptions::default(), &exporter, true).unwrap();

    assert!(report.sweeps.is_empty());
    assert!(exporter.artifacts().is_empty());
    assert!(!exporter.output_dir().exists());
}

fn comparison_inputs<'a>(csp: &'a Path, pv: &'a Path) -> ComparisonInputs<'a> {
    ComparisonInputs {
        csp,
        pv,
        pv_capacity: None,
        reference_capacity_kw: 10_000.0,
        country: None,
    }
}

#[test]
fn compare_runs_with_only_the_pv_table() {
    let dir = std::env::temp_dir().join(format!("solarsweep_compare_one_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    let pv = dir.join("pv.csv");
    fs::write(
        &pv,
        "country,technology,parameter,value,annual_energy_kwh,lcoe\nchile,pv,tilt,20,2000000,0.05\nchile,pv,tilt,30,2100000,0.045\n",
    )
    .unwrap();

    let exporter = CsvExporter::in_dir(dir.join("out"), "compare".to_string(), false);
    let written = run_comparison(&exporter, &[], &comparison_inputs(&dir.join("missing_csp.csv"), &pv), true).unwrap();
    assert_eq!(written, Some(0));

    let merged = fs::read_to_string(exporter.output_dir().join("csp_vs_pv_lcoe.csv")).unwrap();
    assert_eq!(merged.lines().count(), 2);
    assert!(merged.contains("chile,,,,0.045,"));
    assert!(exporter.output_dir().join("index.html").exists());
}

#[test]
fn compare_without_any_table_writes_nothing() {
    let dir = std::env::temp_dir().join(format!("solarsweep_compare_none_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    let exporter = CsvExporter::in_dir(dir.join("out"), "compare".to_string(), false);
    let written = run_comparison(&exporter, &[], &comparison_inputs(&dir.join("a.csv"), &dir.join("b.csv")), true).unwrap();
    assert_eq!(written, None);
    assert!(!exporter.output_dir().exists());
}

struct RejectingSimulator;

impl Simulator for RejectingSimulator {
    fn simulate(&self, _resource: &SolarResource, _plant: &PlantConfig) -> Result<SimulationOutput, SimulationError> {
        Err(SimulationError::Backend("solver diverged".to_string()))
    }
}

#[test]
fn sweep_where_every_point_fails_writes_nothing() {
    let dir = std::env::temp_dir().join(format!("solarsweep_all_failed_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    let site = LoadedSite {
        country: Country::new("chile", "unused.csv", Hemisphere::Southern),
        resource: SolarResource::new(
            ResourceMetadata {
                location: "chile".to_string(),
                latitude: -23.6,
                longitude: -70.4,
                time_zone: -4.0,
                elevation: 0.0,
            },
            Vec::new(),
        ),
    };
    let spec = SweepSpec::new(
        SweepParameter::StorageHours,
        vec![4.0, 8.0],
        PlantConfig::Csp(CspDesign::default()),
        EconomicParams::csp_default(),
    )
    .unwrap();
    let table = sweep_sites(&[site], &spec, &RejectingSimulator, &SweepOptions::default());
    assert_eq!(table.failures().len(), 2);

    let exporter = CsvExporter::in_dir(dir.join("out"), "failed".to_string(), false);
    assert!(!export_sweep(&exporter, &[], "csp_storage_hours", "CSP storage", &table).unwrap());
    assert!(exporter.artifacts().is_empty());
    assert!(!exporter.output_dir().exists());
}
