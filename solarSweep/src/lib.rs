// Main module declarations for solarsweep

// Sweep orchestration
pub mod core {
    pub mod sweep;
    pub mod campaign;
}

// Configuration modules
pub mod config {
    pub mod constants;
    pub mod countries;
    pub mod campaign_config;
}

// Plant models and the simulator capability
pub mod models {
    pub mod resource;
    pub mod simulator;
    pub mod pv;
    pub mod csp;
    pub mod sweep_point;
}

// Data loaders
pub mod data {
    pub mod resource_loader;
    pub mod results_loader;
    pub mod synthetic;
}

// Economics, aggregation and reporting
pub mod analysis {
    pub mod lcoe;
    pub mod aggregation;
    pub mod merge;
    pub mod resource_stats;
    pub mod reporting;
}

// Utility functions
pub mod utils {
    pub mod solar_geometry;
    pub mod logging;
    pub mod csv_export;
    pub mod charts;
}

// CLI interface
pub mod cli {
    pub mod cli;
}

// Re-export commonly used items
pub use crate::core::sweep::{run_sweep, SweepOptions, SweepSpec, SweepTable};
pub use crate::models::simulator::{ReferenceSimulator, Simulator};
pub use crate::analysis::lcoe::fixed_charge_lcoe;
