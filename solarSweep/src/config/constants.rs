// Time Constants
pub const HOURS_PER_YEAR: f64 = 8760.0;
pub const DEFAULT_TIME_STEP_MINUTES: u32 = 60;
pub const MONTHS_PER_YEAR: usize = 12;

// Physical Constants
pub const SOLAR_CONSTANT: f64 = 1361.0;              // W/m²
pub const STC_IRRADIANCE: f64 = 1000.0;              // W/m², standard test conditions
pub const STC_CELL_TEMPERATURE: f64 = 25.0;          // °C
pub const GROUND_ALBEDO: f64 = 0.20;

// PV Defaults (1 MW reference plant)
pub const PV_DEFAULT_CAPACITY_KW: f64 = 1000.0;
pub const PV_DEFAULT_DC_AC_RATIO: f64 = 1.2;
pub const PV_DEFAULT_TILT: f64 = 20.0;
pub const PV_DEFAULT_AZIMUTH: f64 = 180.0;
pub const PV_DEFAULT_GCR: f64 = 0.4;
pub const PV_DEFAULT_INVERTER_EFFICIENCY: f64 = 96.0; // %
pub const PV_DEFAULT_LOSSES: f64 = 14.0;              // %
pub const PV_DEFAULT_COST_PER_KW: f64 = 1000.0;       // $/kW DC
pub const PV_TEMPERATURE_COEFFICIENT: f64 = -0.0037;  // 1/°C, crystalline silicon
pub const PV_TRACKER_MAX_ROTATION: f64 = 60.0;        // degrees

// Faiman heat loss coefficients (U0 W/m²K, U1 W/m³sK)
pub const FAIMAN_OPEN_RACK: (f64, f64) = (25.0, 6.84);
pub const FAIMAN_ROOF_MOUNT: (f64, f64) = (20.0, 4.0);

// CSP Defaults (molten-salt tower, ~115 MWe gross)
pub const CSP_DEFAULT_P_REF_MWE: f64 = 115.0;
pub const CSP_DEFAULT_GROSS_NET: f64 = 0.9;
pub const CSP_DEFAULT_CYCLE_EFFICIENCY: f64 = 0.412;
pub const CSP_DEFAULT_SOLAR_MULTIPLE: f64 = 2.4;
pub const CSP_DEFAULT_TES_HOURS: f64 = 10.0;
pub const CSP_DEFAULT_DNI_DESIGN: f64 = 950.0;        // W/m²
pub const CSP_DEFAULT_OPTICAL_EFFICIENCY: f64 = 0.55;
pub const CSP_DEFAULT_RECEIVER_EFFICIENCY: f64 = 0.88;
pub const CSP_DEFAULT_CYCLE_CUTOFF: f64 = 0.2;
pub const CSP_DEFAULT_CYCLE_MAX: f64 = 1.05;
pub const CSP_DEFAULT_TES_LOSS_PER_HOUR: f64 = 0.0005;
pub const CSP_FIELD_STOW_ELEVATION: f64 = 5.0;        // degrees

// CSP Cost Defaults
pub const CSP_SITE_IMPROVEMENT_COST: f64 = 16.0;      // $/m² aperture
pub const CSP_HELIOSTAT_COST: f64 = 127.0;            // $/m² aperture
pub const CSP_TOWER_FIXED_COST: f64 = 3_000_000.0;    // $
pub const CSP_TOWER_COST_PER_MWT: f64 = 25_000.0;     // $/MWt receiver design
pub const CSP_RECEIVER_COST_PER_KWT: f64 = 103.0;     // $/kWt receiver design
pub const CSP_TES_COST_PER_KWHT: f64 = 22.0;          // $/kWht
pub const CSP_POWER_BLOCK_COST_PER_KWE: f64 = 1040.0; // $/kWe gross
pub const CSP_BOP_COST_PER_KWE: f64 = 290.0;          // $/kWe gross
pub const CSP_CONTINGENCY: f64 = 0.07;
pub const CSP_EPC_OWNER: f64 = 0.13;

// CSP Economics (storage-hours study)
pub const CSP_FIXED_CHARGE_RATE: f64 = 0.08;
pub const CSP_FIXED_OPERATING_COST: f64 = 1_000_000.0; // $/yr
pub const CSP_VARIABLE_OPERATING_COST: f64 = 0.02;     // $/kWh

// PV Economics
pub const PV_FIXED_CHARGE_RATE: f64 = 0.07;
pub const PV_CAPITAL_COST: f64 = 1_000_000.0;          // $
pub const PV_FIXED_OPERATING_COST: f64 = 50_000.0;     // $/yr
pub const PV_VARIABLE_OPERATING_COST: f64 = 0.01;      // $/kWh

// Sensitivity anchors
pub const CSP_SENSITIVITY_TES_HOURS: f64 = 12.0;

// Resource statistics
pub const IQR_OUTLIER_FACTOR: f64 = 1.5;

// Chart colours used when a country has none configured
pub const FALLBACK_COLOR: &str = "gray";
