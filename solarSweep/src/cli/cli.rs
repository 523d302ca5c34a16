use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use crate::config::campaign_config::ValueRange;
use crate::core::campaign::CampaignScope;
use crate::models::pv::ArrayType;
use crate::models::simulator::Technology;
use crate::models::sweep_point::SweepParameter;

#[derive(Parser)]
#[command(author, version, about = "Parametric CSP and PV plant sweeps across countries", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, global = true, help = "JSON campaign configuration; built-in defaults when omitted")]
    config: Option<PathBuf>,

    #[arg(short, long, global = true, default_value = "results")]
    output_dir: PathBuf,

    #[arg(short, long, global = true, default_value_t = false)]
    parallel: bool,

    #[arg(long, global = true, default_value_t = false)]
    enable_timing: bool,

    #[arg(long, global = true, default_value_t = false)]
    debug_logging: bool,

    #[arg(short, long, global = true, default_value_t = false, help = "Suppress console summaries and progress bars")]
    quiet: bool,

    #[arg(long, global = true, default_value_t = false, help = "Print the effective configuration as JSON and exit")]
    dump_config: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the predefined study campaigns
    Campaign {
        #[arg(short, long, default_value = "both")]
        technology: CampaignScope,
    },
    /// Sweep one parameter of one technology over every configured country
    Sweep(SweepArgs),
    /// Compare previously exported CSP and PV sweep tables
    Compare {
        #[arg(long)]
        csp: PathBuf,
        #[arg(long)]
        pv: PathBuf,
        #[arg(long, help = "PV capacity sweep table for the generation comparison")]
        pv_capacity: Option<PathBuf>,
        #[arg(long, default_value_t = 10_000.0)]
        reference_capacity_kw: f64,
        #[arg(long, help = "Restrict the comparison to one country")]
        country: Option<String>,
    },
    /// Statistics and charts for solar resource files
    Resource {
        #[arg(help = "Resource files; the configured countries when omitted")]
        files: Vec<PathBuf>,
    },
    /// Write a synthetic hourly resource file in NSRDB layout
    Synth {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long, allow_hyphen_values = true, default_value_t = 0.0)]
        tz: f64,
        #[arg(long, default_value_t = 2023)]
        year: i32,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct SweepArgs {
    #[arg(short, long)]
    technology: Technology,

    #[arg(short = 'm', long)]
    parameter: SweepParameter,

    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, conflicts_with = "range")]
    values: Vec<f64>,

    #[arg(long, help = "start:end[:step], inclusive")]
    range: Option<ValueRange>,

    #[arg(long, help = "Output file stem", default_value = "sweep")]
    name: String,

    #[arg(long, help = "Keep the configured PV azimuth instead of facing the equator", default_value_t = false)]
    keep_azimuth: bool,

    #[arg(long)]
    tes_hours: Option<f64>,

    #[arg(long)]
    solar_multiple: Option<f64>,

    #[arg(long)]
    capacity_kw: Option<f64>,

    #[arg(long)]
    tilt: Option<f64>,

    #[arg(long)]
    dc_ac_ratio: Option<f64>,

    #[arg(long)]
    array_type: Option<ArrayType>,

    #[arg(long)]
    fixed_charge_rate: Option<f64>,

    #[arg(long)]
    capital_cost: Option<f64>,

    #[arg(long, requires = "variable_om_per_mwh", help = "Fixed O&M in $/kW-yr on the plant nameplate")]
    fixed_om_per_kw_year: Option<f64>,

    #[arg(long, requires = "fixed_om_per_kw_year", help = "Variable O&M in $/MWh")]
    variable_om_per_mwh: Option<f64>,
}

impl Args {
    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn config(&self) -> Option<&Path> {
        self.config.as_deref()
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }

    pub fn enable_timing(&self) -> bool {
        self.enable_timing
    }

    pub fn debug_logging(&self) -> bool {
        self.debug_logging
    }

    pub fn quiet(&self) -> bool {
        self.quiet
    }

    pub fn dump_config(&self) -> bool {
        self.dump_config
    }
}

impl SweepArgs {
    pub fn technology(&self) -> Technology {
        self.technology
    }

    pub fn parameter(&self) -> SweepParameter {
        self.parameter
    }

    /// The explicit list, else the expanded range.
    pub fn values(&self) -> Vec<f64> {
        match &self.range {
            Some(range) => range.values(),
            None => self.values.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keep_azimuth(&self) -> bool {
        self.keep_azimuth
    }

    pub fn tes_hours(&self) -> Option<f64> {
        self.tes_hours
    }

    pub fn solar_multiple(&self) -> Option<f64> {
        self.solar_multiple
    }

    pub fn capacity_kw(&self) -> Option<f64> {
        self.capacity_kw
    }

    pub fn tilt(&self) -> Option<f64> {
        self.tilt
    }

    pub fn dc_ac_ratio(&self) -> Option<f64> {
        self.dc_ac_ratio
    }

    pub fn array_type(&self) -> Option<ArrayType> {
        self.array_type
    }

    pub fn fixed_charge_rate(&self) -> Option<f64> {
        self.fixed_charge_rate
    }

    pub fn capital_cost(&self) -> Option<f64> {
        self.capital_cost
    }

    /// Both O&M rates, when given.
    pub fn om_rates(&self) -> Option<(f64, f64)> {
        self.fixed_om_per_kw_year.zip(self.variable_om_per_mwh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sweep_with_range() {
        let args = Args::try_parse_from([
            "solarsweep", "--parallel", "sweep", "-t", "csp", "-m", "tshours", "--range", "4:8:2",
        ])
        .unwrap();
        assert!(args.parallel());
        match args.command() {
            Command::Sweep(sweep) => {
                assert_eq!(sweep.technology(), Technology::Csp);
                assert_eq!(sweep.parameter(), SweepParameter::StorageHours);
                assert_eq!(sweep.values(), vec![4.0, 6.0, 8.0]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn parses_value_list_and_global_flags_after_subcommand() {
        let args = Args::try_parse_from([
            "solarsweep", "sweep", "-t", "pv", "-m", "tilt", "--values", "10,20,30", "--quiet", "--array-type", "one_axis",
        ])
        .unwrap();
        assert!(args.quiet());
        assert_eq!(args.output_dir(), Path::new("results"));
        let Command::Sweep(sweep) = args.command() else { panic!("expected sweep") };
        assert_eq!(sweep.values(), vec![10.0, 20.0, 30.0]);
        assert_eq!(sweep.array_type(), Some(ArrayType::OneAxis));
    }

    #[test]
    fn campaign_defaults_to_both() {
        let args = Args::try_parse_from(["solarsweep", "campaign"]).unwrap();
        assert!(matches!(args.command(), Command::Campaign { technology: CampaignScope::Both }));
        assert!(Args::try_parse_from(["solarsweep", "campaign", "-t", "wind"]).is_err());
    }
}
