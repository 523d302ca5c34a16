//! The study campaigns: named groups of sweeps for CSP and PV, the CSP vs PV
//! comparison, and the solar resource analysis. Each sweep exports its valid
//! rows, its failures, a per-country summary and its charts.

use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};
use crate::analysis::aggregation::{country_summaries, mean_lcoe_by_value, min_lcoe_by_country, MinLcoeRow};
use crate::analysis::lcoe::EconomicParams;
use crate::analysis::merge::{generation_comparison, outer_join_on_country};
use crate::analysis::reporting;
use crate::analysis::resource_stats::{self, ResourceReport, Variable};
use crate::config::campaign_config::CampaignConfig;
use crate::config::constants::FALLBACK_COLOR;
use crate::config::countries::Country;
use crate::data::results_loader::load_sweep_points;
use crate::core::sweep::{load_sites, sweep_sites, LoadedSite, SweepOptions, SweepParameter, SweepSpec, SweepTable};
use crate::models::csp::CspDesign;
use crate::models::simulator::{PlantConfig, Simulator, Technology};
use crate::models::sweep_point::SweepPoint;
use crate::utils::charts::{BarChart, LineChart, Series};
use crate::utils::csv_export::CsvExporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignScope {
    Csp,
    Pv,
    Both,
}

impl CampaignScope {
    pub fn includes(&self, technology: Technology) -> bool {
        match self {
            CampaignScope::Both => true,
            CampaignScope::Csp => technology == Technology::Csp,
            CampaignScope::Pv => technology == Technology::Pv,
        }
    }
}

impl std::str::FromStr for CampaignScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csp" => Ok(CampaignScope::Csp),
            "pv" => Ok(CampaignScope::Pv),
            "both" | "all" => Ok(CampaignScope::Both),
            other => Err(format!("unknown campaign '{}', expected csp, pv or both", other)),
        }
    }
}

/// Everything a sweep needs besides its spec.
pub struct CampaignContext<'a, S: Simulator + ?Sized> {
    pub countries: &'a [Country],
    pub sites: &'a [LoadedSite],
    pub simulator: &'a S,
    pub options: SweepOptions,
    pub exporter: &'a CsvExporter,
    pub quiet: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepRunSummary {
    pub name: String,
    pub technology: Technology,
    pub parameter: SweepParameter,
    pub valid: usize,
    pub failed: usize,
    pub written: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CampaignReport {
    pub sweeps: Vec<SweepRunSummary>,
    pub csp_storage: Vec<SweepPoint>,
    pub pv_capacity: Vec<SweepPoint>,
    pub pv_tilt: Vec<SweepPoint>,
    pub comparisons_written: usize,
    pub resources: Vec<ResourceReport>,
}

impl CampaignReport {
    pub fn total_valid(&self) -> usize {
        self.sweeps.iter().map(|s| s.valid).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.sweeps.iter().map(|s| s.failed).sum()
    }
}

pub fn color_for(countries: &[Country], name: &str, technology: Technology) -> String {
    countries
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(name))
        .map(|c| match technology {
            Technology::Pv => c.pv_color(),
            Technology::Csp => c.csp_color(),
        })
        .unwrap_or(FALLBACK_COLOR)
        .to_string()
}

/// One series per country, in first-seen order. Points without a metric value are dropped.
pub fn series_by_country(
    points: &[SweepPoint],
    countries: &[Country],
    metric: impl Fn(&SweepPoint) -> Option<f64>,
) -> Vec<Series> {
    let mut series: Vec<Series> = Vec::new();
    for point in points {
        let Some(y) = metric(point) else { continue };
        match series.iter_mut().find(|s| s.name == point.country) {
            Some(s) => s.points.push((point.value, y)),
            None => series.push(Series {
                name: point.country.clone(),
                color: color_for(countries, &point.country, point.technology),
                points: vec![(point.value, y)],
            }),
        }
    }
    series
}

fn write_chart(exporter: &CsvExporter, file_name: &str, title: &str, svg: Option<String>) -> Result<bool> {
    match svg {
        Some(svg) => {
            exporter.write_chart(file_name, title, &svg)?;
            Ok(true)
        }
        None => {
            warn!("Chart '{}' has no data, skipped", title);
            Ok(false)
        }
    }
}

/// Writes the tables and charts of a finished sweep. Returns false when there
/// was nothing valid to write.
pub fn export_sweep(exporter: &CsvExporter, countries: &[Country], name: &str, title: &str, table: &SweepTable) -> Result<bool> {
    let failures = table.failures();
    if !table.has_valid_points() {
        for failure in &failures {
            warn!("{} {} = {}: {}", failure.country, table.parameter, failure.value, failure.reason);
        }
        println!("No valid results for '{}'; nothing written.", title);
        return Ok(false);
    }
    if !failures.is_empty() {
        exporter.write_rows(&format!("{}_failures", name), &format!("{} (failed points)", title), &failures)?;
    }

    let points = table.valid_points();
    exporter.write_rows(name, title, &points)?;
    exporter.write_rows(&format!("{}_summary", name), &format!("{} (per-country summary)", title), &country_summaries(&points))?;

    let x_label = table.parameter.label().to_string();
    let mut lcoe_series = series_by_country(&points, countries, |p| p.lcoe);
    if table.parameter.is_economic() && lcoe_series.len() > 1 {
        lcoe_series.push(Series {
            name: "mean".to_string(),
            color: "black".to_string(),
            points: mean_lcoe_by_value(&points),
        });
    }
    let lcoe_chart = LineChart {
        title: format!("{}: LCOE", title),
        x_label: x_label.clone(),
        y_label: "LCOE ($/kWh)".to_string(),
        series: lcoe_series,
    };
    write_chart(exporter, &format!("{}_lcoe.svg", name), &lcoe_chart.title, lcoe_chart.render())?;

    let energy_chart = LineChart {
        title: format!("{}: annual energy", title),
        x_label,
        y_label: "Annual energy (MWh)".to_string(),
        series: series_by_country(&points, countries, |p| Some(p.annual_energy_kwh / 1000.0)),
    };
    write_chart(exporter, &format!("{}_energy.svg", name), &energy_chart.title, energy_chart.render())?;

    Ok(true)
}

/// Runs one sweep over the loaded sites and exports it.
pub fn run_and_export<S: Simulator + ?Sized>(
    ctx: &CampaignContext<'_, S>,
    name: &str,
    title: &str,
    spec: &SweepSpec,
) -> Result<(SweepTable, SweepRunSummary)> {
    info!("Running sweep '{}' over {} values", name, spec.values.len());
    let table = sweep_sites(ctx.sites, spec, ctx.simulator, &ctx.options);
    if !ctx.quiet {
        reporting::print_sweep_summary(title, &table);
    }
    let written = export_sweep(ctx.exporter, ctx.countries, name, title, &table)?;
    let failed = table.failures().len();
    let summary = SweepRunSummary {
        name: name.to_string(),
        technology: spec.technology,
        parameter: spec.parameter,
        valid: table.outcomes().len() - failed,
        failed,
        written,
    };
    Ok((table, summary))
}

pub fn run_csp_campaign<S: Simulator + ?Sized>(
    ctx: &CampaignContext<'_, S>,
    config: &CampaignConfig,
    report: &mut CampaignReport,
) -> Result<()> {
    let csp = &config.csp;
    let sensitivity_design = CspDesign { tes_hours: csp.sensitivity_tes_hours, ..csp.design.clone() };

    let sweeps = [
        ("csp_storage_hours", "CSP: storage hours", SweepParameter::StorageHours, csp.storage_hours.values(), &csp.design),
        ("csp_fixed_charge_rate", "CSP: fixed charge rate", SweepParameter::FixedChargeRate, csp.fixed_charge_rates.values(), &sensitivity_design),
        ("csp_solar_multiple", "CSP: solar multiple", SweepParameter::SolarMultiple, csp.solar_multiples.values(), &sensitivity_design),
    ];

    for (name, title, parameter, values, design) in sweeps {
        let spec = SweepSpec::new(parameter, values, PlantConfig::Csp(design.clone()), csp.economics.clone())?;
        let (table, summary) = run_and_export(ctx, name, title, &spec)?;
        if parameter == SweepParameter::StorageHours {
            report.csp_storage = table.valid_points();
            if !ctx.quiet {
                reporting::print_country_summaries(&country_summaries(&report.csp_storage));
            }
        }
        report.sweeps.push(summary);
    }
    Ok(())
}

pub fn run_pv_campaign<S: Simulator + ?Sized>(
    ctx: &CampaignContext<'_, S>,
    config: &CampaignConfig,
    report: &mut CampaignReport,
) -> Result<()> {
    let pv = &config.pv;
    let base = PlantConfig::Pv(pv.design.clone());
    // Plant size changes the installed cost, so the capacity sweep prices from the simulator
    let size_priced = EconomicParams { capital_cost: None, ..pv.economics.clone() };

    let sweeps = [
        ("pv_capacity", "PV: system capacity", SweepParameter::Capacity, pv.capacities_kw.clone(), &size_priced),
        ("pv_tilt", "PV: tilt", SweepParameter::Tilt, pv.tilts.values(), &pv.economics),
        ("pv_dc_ac_ratio", "PV: DC/AC ratio", SweepParameter::DcAcRatio, pv.dc_ac_ratios.values(), &pv.economics),
        ("pv_fixed_charge_rate", "PV: fixed charge rate", SweepParameter::FixedChargeRate, pv.fixed_charge_rates.values(), &pv.economics),
        ("pv_sensitivity_inverter_efficiency", "PV sensitivity: inverter efficiency", SweepParameter::InverterEfficiency, pv.inverter_efficiencies.values(), &pv.economics),
        ("pv_sensitivity_capital_cost", "PV sensitivity: capital cost", SweepParameter::CapitalCost, pv.capital_costs.values(), &pv.economics),
        ("pv_sensitivity_fixed_om", "PV sensitivity: fixed O&M", SweepParameter::FixedOperatingCost, pv.fixed_operating_costs.values(), &pv.economics),
        ("pv_sensitivity_variable_om", "PV sensitivity: variable O&M", SweepParameter::VariableOperatingCost, pv.variable_operating_costs.values(), &pv.economics),
    ];

    for (name, title, parameter, values, economics) in sweeps {
        let spec = SweepSpec::new(parameter, values, base.clone(), economics.clone())?;
        let (table, summary) = run_and_export(ctx, name, title, &spec)?;
        match parameter {
            SweepParameter::Capacity => report.pv_capacity = table.valid_points(),
            SweepParameter::Tilt => report.pv_tilt = table.valid_points(),
            _ => {}
        }
        report.sweeps.push(summary);
    }
    Ok(())
}

/// Writes the CSP vs PV tables and charts. Returns how many generation
/// comparisons were written.
pub fn export_comparison(
    exporter: &CsvExporter,
    countries: &[Country],
    csp_storage: &[SweepPoint],
    pv_points: &[SweepPoint],
    pv_capacity_points: &[SweepPoint],
    reference_capacity_kw: f64,
    quiet: bool,
) -> Result<usize> {
    let pv_min = min_lcoe_by_country(pv_points);
    let csp_min = min_lcoe_by_country(csp_storage);
    if csp_storage.is_empty() && pv_min.is_empty() {
        println!("No CSP or PV results to compare; nothing written.");
        return Ok(0);
    }

    let merged = outer_join_on_country(csp_storage, &pv_min);
    exporter.write_rows("csp_vs_pv_lcoe", "CSP LCOE vs storage with PV minimum LCOE", &merged)?;

    // CSP curves, with each country's PV minimum drawn flat across the storage range
    let mut series = series_by_country(csp_storage, countries, |p| p.lcoe);
    let (lo, hi) = csp_storage
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.value), hi.max(p.value)));
    if lo.is_finite() {
        for row in &pv_min {
            series.push(Series {
                name: format!("{} PV min", row.country),
                color: color_for(countries, &row.country, Technology::Pv),
                points: vec![(lo, row.lcoe), (hi, row.lcoe)],
            });
        }
    }
    let line = LineChart {
        title: "LCOE: CSP by storage hours vs best PV".to_string(),
        x_label: SweepParameter::StorageHours.label().to_string(),
        y_label: "LCOE ($/kWh)".to_string(),
        series,
    };
    write_chart(exporter, "csp_vs_pv_lcoe.svg", &line.title, line.render())?;

    let mut names: Vec<String> = csp_min.iter().map(|r| r.country.clone()).collect();
    for row in &pv_min {
        if !names.iter().any(|n| n.eq_ignore_ascii_case(&row.country)) {
            names.push(row.country.clone());
        }
    }
    let lookup = |rows: &[MinLcoeRow], name: &str| {
        rows.iter().find(|r| r.country.eq_ignore_ascii_case(name)).map(|r| r.lcoe)
    };
    let bars = BarChart {
        title: "Minimum LCOE by country".to_string(),
        y_label: "LCOE ($/kWh)".to_string(),
        series: vec![("CSP".to_string(), "red".to_string()), ("PV".to_string(), "deeppink".to_string())],
        groups: names
            .iter()
            .map(|name| (name.clone(), vec![lookup(&csp_min, name), lookup(&pv_min, name)]))
            .collect(),
    };
    write_chart(exporter, "min_lcoe_by_country.svg", &bars.title, bars.render())?;

    let mut written = 0;
    for country in &names {
        match generation_comparison(csp_storage, pv_capacity_points, country, reference_capacity_kw) {
            Some(comparison) => {
                if !quiet {
                    reporting::print_generation_comparison(&comparison);
                }
                let name = format!("generation_{}", country.to_lowercase());
                exporter.write_rows(&name, &format!("Generation: CSP vs {:.0} kW PV, {}", reference_capacity_kw, country), &comparison.rows())?;
                let chart = LineChart {
                    title: format!("{}: CSP energy vs storage, PV {:.0} kW reference", country, reference_capacity_kw),
                    x_label: SweepParameter::StorageHours.label().to_string(),
                    y_label: "Annual energy (MWh)".to_string(),
                    series: vec![
                        Series {
                            name: "CSP".to_string(),
                            color: color_for(countries, country, Technology::Csp),
                            points: comparison.csp_by_storage.iter().map(|(h, e)| (*h, e / 1000.0)).collect(),
                        },
                        Series {
                            name: format!("PV {:.0} kW", reference_capacity_kw),
                            color: color_for(countries, country, Technology::Pv),
                            points: vec![(lo, comparison.pv_annual_energy_kwh / 1000.0), (hi, comparison.pv_annual_energy_kwh / 1000.0)],
                        },
                    ],
                };
                write_chart(exporter, &format!("{}.svg", name), &chart.title, chart.render())?;
                written += 1;
            }
            None => warn!("No CSP storage and {:.0} kW PV results for {}, generation comparison skipped", reference_capacity_kw, country),
        }
    }
    Ok(written)
}

/// Result tables handed to `compare`.
#[derive(Debug, Clone)]
pub struct ComparisonInputs<'a> {
    pub csp: &'a Path,
    pub pv: &'a Path,
    pub pv_capacity: Option<&'a Path>,
    pub reference_capacity_kw: f64,
    pub country: Option<&'a str>,
}

/// A table that cannot be read is reported and left out.
fn load_or_skip(path: &Path) -> Option<Vec<SweepPoint>> {
    match load_sweep_points(path) {
        Ok(points) => Some(points),
        Err(e) => {
            println!("Skipping {}: {}", path.display(), e);
            None
        }
    }
}

/// Compares previously exported tables. Returns `None` when neither the CSP
/// nor the PV table could be read, in which case nothing is written.
pub fn run_comparison(
    exporter: &CsvExporter,
    countries: &[Country],
    inputs: &ComparisonInputs,
    quiet: bool,
) -> Result<Option<usize>> {
    let csp = load_or_skip(inputs.csp);
    let pv = load_or_skip(inputs.pv);
    if csp.is_none() && pv.is_none() {
        println!("Neither CSP nor PV results could be loaded; no comparison produced.");
        return Ok(None);
    }
    let pv_capacity = inputs.pv_capacity.and_then(load_or_skip);

    let only = |points: Option<Vec<SweepPoint>>| -> Vec<SweepPoint> {
        let points = points.unwrap_or_default();
        match inputs.country {
            Some(name) => points.into_iter().filter(|p| p.country.eq_ignore_ascii_case(name)).collect(),
            None => points,
        }
    };
    let written = export_comparison(
        exporter,
        countries,
        &only(csp),
        &only(pv),
        &only(pv_capacity),
        inputs.reference_capacity_kw,
        quiet,
    )?;
    if !exporter.artifacts().is_empty() {
        exporter.write_index("CSP vs PV comparison")?;
    }
    Ok(Some(written))
}

/// Statistics, tables and charts for each loaded resource, plus cross-country charts.
pub fn export_resource_analysis(
    exporter: &CsvExporter,
    countries: &[Country],
    sites: &[LoadedSite],
    quiet: bool,
) -> Result<Vec<ResourceReport>> {
    let reports: Vec<ResourceReport> = sites.iter().map(|site| resource_stats::analyze(&site.resource)).collect();
    if reports.is_empty() {
        println!("No resource data to analyse; nothing written.");
        return Ok(reports);
    }

    let descriptive: Vec<_> = reports.iter().flat_map(|r| r.descriptive.clone()).collect();
    let outliers: Vec<_> = reports.iter().flat_map(|r| r.outliers.clone()).collect();
    let annual: Vec<_> = reports.iter().flat_map(|r| r.annual.clone()).collect();
    let monthly: Vec<_> = reports.iter().flat_map(|r| r.monthly.clone()).collect();
    let daily: Vec<_> = reports.iter().flat_map(|r| r.daily.clone()).collect();
    exporter.write_rows("resource_descriptive", "Resource: descriptive statistics", &descriptive)?;
    exporter.write_rows("resource_outliers", "Resource: IQR outliers", &outliers)?;
    exporter.write_rows("resource_annual", "Resource: annual irradiation", &annual)?;
    exporter.write_rows("resource_monthly", "Resource: monthly mean irradiance", &monthly)?;
    exporter.write_rows("resource_daily", "Resource: daily irradiation", &daily)?;

    for (site, report) in sites.iter().zip(&reports) {
        if !quiet {
            reporting::print_resource_report(report);
        }
        let channel = |name: &str, color: &str, pick: fn(&resource_stats::MonthlyMean) -> f64| Series {
            name: name.to_string(),
            color: color.to_string(),
            points: report.monthly.iter().map(|m| (m.month as f64, pick(m))).collect(),
        };
        let chart = LineChart {
            title: format!("{}: monthly mean irradiance", report.location),
            x_label: "Month".to_string(),
            y_label: "Irradiance (W/m²)".to_string(),
            series: vec![
                channel("GHI", "orange", |m| m.ghi),
                channel("DHI", "steelblue", |m| m.dhi),
                channel("DNI", "firebrick", |m| m.dni),
            ],
        };
        let file_name = format!("resource_monthly_{}.svg", report.location.to_lowercase());
        write_chart(exporter, &file_name, &chart.title, chart.render())?;

        let daily_series = |name: &str, color: &str, variable: Variable| Series {
            name: name.to_string(),
            color: color.to_string(),
            points: resource_stats::daily_irradiation(&site.resource, variable)
                .into_iter()
                .enumerate()
                .map(|(i, kwh)| ((i + 1) as f64, kwh))
                .collect(),
        };
        let daily_chart = LineChart {
            title: format!("{}: daily irradiation", report.location),
            x_label: "Day".to_string(),
            y_label: "kWh/m²/day".to_string(),
            series: vec![
                daily_series("GHI", "orange", Variable::Ghi),
                daily_series("DNI", "firebrick", Variable::Dni),
            ],
        };
        let file_name = format!("resource_daily_{}.svg", report.location.to_lowercase());
        write_chart(exporter, &file_name, &daily_chart.title, daily_chart.render())?;
    }

    let ghi_by_country = LineChart {
        title: "Monthly mean GHI by country".to_string(),
        x_label: "Month".to_string(),
        y_label: "GHI (W/m²)".to_string(),
        series: reports
            .iter()
            .map(|r| Series {
                name: r.location.clone(),
                color: color_for(countries, &r.location, Technology::Pv),
                points: r.monthly.iter().map(|m| (m.month as f64, m.ghi)).collect(),
            })
            .collect(),
    };
    write_chart(exporter, "resource_monthly_ghi_by_country.svg", &ghi_by_country.title, ghi_by_country.render())?;

    let max_daily = BarChart {
        title: "Maximum daily irradiation".to_string(),
        y_label: "kWh/m²/day".to_string(),
        series: vec![
            ("GHI".to_string(), "orange".to_string()),
            ("DNI".to_string(), "firebrick".to_string()),
        ],
        groups: reports
            .iter()
            .map(|r| (r.location.clone(), vec![r.max_daily(Variable::Ghi), r.max_daily(Variable::Dni)]))
            .collect(),
    };
    write_chart(exporter, "resource_max_daily.svg", &max_daily.title, max_daily.render())?;

    Ok(reports)
}

/// Runs the campaigns in `scope` end to end and writes the run index.
/// When no resource file loads, prints a message and writes nothing.
pub fn run_campaign<S: Simulator + ?Sized>(
    config: &CampaignConfig,
    scope: CampaignScope,
    simulator: &S,
    options: SweepOptions,
    exporter: &CsvExporter,
    quiet: bool,
) -> Result<CampaignReport> {
    let (sites, skipped) = load_sites(&config.countries);
    for s in &skipped {
        println!("Skipping {}: {}", s.country, s.reason);
    }
    let mut report = CampaignReport::default();
    if sites.is_empty() {
        println!("No usable resource files; no results produced.");
        return Ok(report);
    }

    let ctx = CampaignContext {
        countries: &config.countries,
        sites: &sites,
        simulator,
        options,
        exporter,
        quiet,
    };

    report.resources = export_resource_analysis(exporter, &config.countries, &sites, true)?;
    if scope.includes(Technology::Csp) {
        run_csp_campaign(&ctx, config, &mut report)?;
    }
    if scope.includes(Technology::Pv) {
        run_pv_campaign(&ctx, config, &mut report)?;
    }
    if scope == CampaignScope::Both {
        report.comparisons_written = export_comparison(
            exporter,
            &config.countries,
            &report.csp_storage,
            &report.pv_tilt,
            &report.pv_capacity,
            config.pv.reference_capacity_kw,
            quiet,
        )?;
    }

    exporter.write_index("Solar plant sweep campaign")?;
    info!(
        "Campaign finished: {} valid points, {} failed, output in {}",
        report.total_valid(),
        report.total_failed(),
        exporter.output_dir().display()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregation::test_support::point;
    use crate::config::countries::{default_countries, Hemisphere};

    #[test]
    fn scope_parses_and_filters() {
        assert_eq!("BOTH".parse::<CampaignScope>().unwrap(), CampaignScope::Both);
        assert!(CampaignScope::Csp.includes(Technology::Csp));
        assert!(!CampaignScope::Csp.includes(Technology::Pv));
        assert!("wind".parse::<CampaignScope>().is_err());
    }

    #[test]
    fn series_use_country_colors_and_skip_missing_values() {
        let points = vec![
            point("chile", 4.0, 1.0, Some(0.1)),
            point("chile", 8.0, 1.0, None),
            point("espana", 4.0, 1.0, Some(0.2)),
        ];
        let series = series_by_country(&points, &default_countries(), |p| p.lcoe);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].color, "red");
        assert_eq!(series[0].points, vec![(4.0, 0.1)]);
        assert_eq!(color_for(&[Country::new("x", "x.csv", Hemisphere::Northern)], "y", Technology::Pv), FALLBACK_COLOR);
    }
}
