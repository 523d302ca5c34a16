use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;

use solarsweep::analysis::lcoe::EconomicParams;
use solarsweep::cli::cli::{Args, Command, SweepArgs};
use solarsweep::config::campaign_config::{load_config, CampaignConfig};
use solarsweep::config::countries::{Country, Hemisphere};
use solarsweep::core::campaign::{self, CampaignContext, ComparisonInputs};
use solarsweep::core::sweep::{load_sites, LoadedSite, SweepOptions, SweepParameter, SweepSpec};
use solarsweep::data::{resource_loader, synthetic};
use solarsweep::models::simulator::{PlantConfig, ReferenceSimulator, Technology};
use solarsweep::utils::csv_export::CsvExporter;
use solarsweep::utils::logging::{self, FileIOType, OperationCategory};

fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_logging(args.enable_timing(), args.debug_logging())
        .context("failed to initialise logging")?;

    let config = match args.config() {
        Some(path) => load_config(path).with_context(|| format!("loading {}", path.display()))?,
        None => CampaignConfig::default(),
    };
    config.validate()?;

    if args.dump_config() {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    if !args.quiet() {
        println!("solarsweep: CSP and PV parametric sweeps");
        println!("Countries: {}, parallel: {}, timing: {}",
                 config.countries.iter().map(|c| c.name.as_str()).collect::<Vec<_>>().join(", "),
                 if args.parallel() { "enabled" } else { "disabled" },
                 if args.enable_timing() { "enabled" } else { "disabled" });
    }

    if let Command::Synth { lat, lon, tz, year, seed, out } = args.command() {
        let _timing = logging::start_timing("write_synthetic_resource",
            OperationCategory::FileIO { subcategory: FileIOType::ResultsSave });
        let resource = synthetic::generate(*lat, *lon, *tz, *year, *seed);
        synthetic::write_nsrdb_csv(&resource, out)
            .with_context(|| format!("writing {}", out.display()))?;
        println!("Wrote {} hourly records to {}", resource.records.len(), out.display());
        return Ok(());
    }

    let exporter = CsvExporter::new(args.output_dir(), args.debug_logging());
    let options = SweepOptions { parallel: args.parallel(), show_progress: !args.quiet() };
    let simulator = ReferenceSimulator;

    match args.command() {
        Command::Campaign { technology } => {
            campaign::run_campaign(&config, *technology, &simulator, options, &exporter, args.quiet())?;
        }
        Command::Sweep(sweep) => {
            let spec = sweep_spec(&config, sweep)?;
            let (sites, skipped) = load_sites(&config.countries);
            for s in &skipped {
                println!("Skipping {}: {}", s.country, s.reason);
            }
            if sites.is_empty() {
                println!("No usable resource files; no results produced.");
            } else {
                let ctx = CampaignContext {
                    countries: &config.countries,
                    sites: &sites,
                    simulator: &simulator,
                    options,
                    exporter: &exporter,
                    quiet: args.quiet(),
                };
                let title = format!("{} sweep: {}", spec.technology, spec.parameter.label());
                campaign::run_and_export(&ctx, sweep.name(), &title, &spec)?;
                if !exporter.artifacts().is_empty() {
                    exporter.write_index("Parameter sweep")?;
                }
            }
        }
        Command::Compare { csp, pv, pv_capacity, reference_capacity_kw, country } => {
            let inputs = ComparisonInputs {
                csp,
                pv,
                pv_capacity: pv_capacity.as_deref(),
                reference_capacity_kw: *reference_capacity_kw,
                country: country.as_deref(),
            };
            campaign::run_comparison(&exporter, &config.countries, &inputs, args.quiet())?;
        }
        Command::Resource { files } => {
            let sites = if files.is_empty() {
                let (sites, skipped) = load_sites(&config.countries);
                for s in &skipped {
                    println!("Skipping {}: {}", s.country, s.reason);
                }
                sites
            } else {
                files.iter().filter_map(|path| site_from_file(path)).collect()
            };
            if sites.is_empty() {
                println!("No usable resource files; no results produced.");
            } else {
                campaign::export_resource_analysis(&exporter, &config.countries, &sites, args.quiet())?;
                exporter.write_index("Solar resource analysis")?;
            }
        }
        Command::Synth { .. } => {}
    }

    if !exporter.artifacts().is_empty() {
        println!("Results written to {}", exporter.output_dir().display());
    }

    if args.enable_timing() {
        logging::print_timing_report();
    }

    Ok(())
}

/// Base plant from the configuration with the command-line overrides applied.
fn sweep_spec(config: &CampaignConfig, sweep: &SweepArgs) -> Result<SweepSpec> {
    let values = sweep.values();
    if values.is_empty() {
        bail!("no sweep values given; pass --values or --range");
    }

    let (plant, mut economics): (PlantConfig, EconomicParams) = match sweep.technology() {
        Technology::Csp => {
            let mut design = config.csp.design.clone();
            if let Some(hours) = sweep.tes_hours() {
                design.tes_hours = hours;
            }
            if let Some(sm) = sweep.solar_multiple() {
                design.solar_multiple = sm;
            }
            (PlantConfig::Csp(design), config.csp.economics.clone())
        }
        Technology::Pv => {
            let mut design = config.pv.design.clone();
            if let Some(capacity) = sweep.capacity_kw() {
                design.capacity_kw = capacity;
            }
            if let Some(tilt) = sweep.tilt() {
                design.tilt = tilt;
            }
            if let Some(ratio) = sweep.dc_ac_ratio() {
                design.dc_ac_ratio = ratio;
            }
            if let Some(array_type) = sweep.array_type() {
                design.array_type = array_type;
            }
            let mut economics = config.pv.economics.clone();
            if sweep.parameter() == SweepParameter::Capacity {
                economics.capital_cost = None;
            }
            (PlantConfig::Pv(design), economics)
        }
    };
    if let Some(rate) = sweep.fixed_charge_rate() {
        economics.fixed_charge_rate = rate;
    }
    if let Some(cost) = sweep.capital_cost() {
        economics.capital_cost = Some(cost);
    }
    if let Some((fixed, variable)) = sweep.om_rates() {
        let nameplate_kw = match &plant {
            PlantConfig::Csp(design) => design.net_capacity_kw(),
            PlantConfig::Pv(design) => design.capacity_kw,
        };
        economics = economics.with_om_rates(fixed, nameplate_kw, variable);
    }

    let mut spec = SweepSpec::new(sweep.parameter(), values, plant, economics)?;
    spec.orient_pv_to_equator = !sweep.keep_azimuth();
    Ok(spec)
}

fn site_from_file(path: &Path) -> Option<LoadedSite> {
    let name = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| "site".to_string());
    match resource_loader::load_resource(path, &name) {
        Ok(resource) => {
            let hemisphere = Hemisphere::from_latitude(resource.metadata.latitude);
            Some(LoadedSite { country: Country::new(&name, path, hemisphere), resource })
        }
        Err(e) => {
            eprintln!("Failed to load {}: {}. Skipping.", path.display(), e);
            None
        }
    }
}
