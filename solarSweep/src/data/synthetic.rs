//! Deterministic synthetic weather years for demos and tests.
//!
//! Clear-sky irradiance attenuated by a daily cloud factor, with seasonal and
//! diurnal temperature and wind cycles. The same seed always yields the same
//! year, so files written here are reproducible inputs.

use chrono::{Datelike, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;
use std::path::Path;
use crate::models::resource::{ResourceMetadata, ResourceRecord, SolarResource};
use crate::utils::solar_geometry::{clear_sky, sun_position};

const CLEAR_DAY_PROBABILITY: f64 = 0.7;

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn generate(latitude: f64, longitude: f64, time_zone: f64, year: i32, seed: u64) -> SolarResource {
    let mut rng = StdRng::seed_from_u64(seed);
    let metadata = ResourceMetadata {
        location: format!("synthetic_{:.2}_{:.2}", latitude, longitude),
        latitude,
        longitude,
        time_zone,
        elevation: 0.0,
    };

    // Seasons are mirrored south of the equator
    let season_sign = if latitude < 0.0 { -1.0 } else { 1.0 };
    let mean_temperature = 25.0 - 0.3 * latitude.abs();

    let mut records = Vec::with_capacity(8760);
    let mut date = NaiveDate::from_ymd_opt(year, 1, 1);
    while let Some(day) = date.filter(|d| d.year() == year) {
        date = day.succ_opt();
        if day.month() == 2 && day.day() == 29 {
            continue;
        }

        let clearness: f64 = if rng.gen_bool(CLEAR_DAY_PROBABILITY) {
            rng.gen_range(0.85..=1.0)
        } else {
            rng.gen_range(0.2..0.7)
        };
        let doy = day.ordinal().min(365);
        let seasonal = 8.0 * season_sign * (2.0 * PI * (doy as f64 - 200.0) / 365.0).cos();

        for hour in 0..24u32 {
            let sun = sun_position(latitude, longitude, time_zone, doy, hour as f64 + 0.5);
            let (clear_ghi, clear_dni, clear_dhi) = clear_sky(&sun, doy);
            let sin_elevation = (sun.elevation * PI / 180.0).sin().max(0.0);

            let dni = clear_dni * clearness * clearness;
            let dhi = clear_dhi + (1.0 - clearness) * 0.3 * clear_ghi;
            let ghi = dni * sin_elevation + dhi;

            let diurnal = 5.0 * (2.0 * PI * (hour as f64 - 9.0) / 24.0).sin();
            let temperature = mean_temperature + seasonal + diurnal + rng.gen_range(-1.0..1.0);
            let wind = (3.0 + 1.5 * (2.0 * PI * (hour as f64 - 6.0) / 24.0).sin() + rng.gen_range(-1.0..1.0)).max(0.3);

            records.push(ResourceRecord {
                year,
                month: day.month(),
                day: day.day(),
                hour,
                minute: 0,
                ghi: round1(ghi),
                dni: round1(dni),
                dhi: round1(dhi),
                temperature: round1(temperature),
                wind_speed: round1(wind),
                dew_point: Some(round1(temperature - 8.0)),
                pressure: Some(1013.0),
            });
        }
    }

    SolarResource::new(metadata, records)
}

/// Writes a resource in NSRDB layout: metadata keys, metadata values, data header, rows.
pub fn write_nsrdb_csv(resource: &SolarResource, path: &Path) -> Result<(), csv::Error> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_path(path)?;
    let meta = &resource.metadata;

    writer.write_record([
        "Source", "Location ID", "City", "State", "Country",
        "Latitude", "Longitude", "Time Zone", "Elevation", "Local Time Zone",
    ])?;
    writer.write_record([
        "Synthetic".to_string(),
        "0".to_string(),
        meta.location.clone(),
        "-".to_string(),
        "-".to_string(),
        meta.latitude.to_string(),
        meta.longitude.to_string(),
        meta.time_zone.to_string(),
        meta.elevation.to_string(),
        meta.time_zone.to_string(),
    ])?;
    writer.write_record([
        "Year", "Month", "Day", "Hour", "Minute", "GHI", "DNI", "DHI",
        "Temperature", "Wind Speed", "Dew Point", "Pressure",
    ])?;

    let optional = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
    for r in &resource.records {
        writer.write_record([
            r.year.to_string(),
            r.month.to_string(),
            r.day.to_string(),
            r.hour.to_string(),
            r.minute.to_string(),
            r.ghi.to_string(),
            r.dni.to_string(),
            r.dhi.to_string(),
            r.temperature.to_string(),
            r.wind_speed.to_string(),
            optional(r.dew_point),
            optional(r.pressure),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_year_without_leap_day() {
        let resource = generate(-23.6, -70.4, -4.0, 2020, 7);
        assert_eq!(resource.len(), 8760);
        assert!(!resource.records.iter().any(|r| r.month == 2 && r.day == 29));
        assert_eq!(resource.time_step_minutes(), 60);
    }

    #[test]
    fn same_seed_same_year() {
        let a = generate(40.4, -3.7, 1.0, 2021, 42);
        let b = generate(40.4, -3.7, 1.0, 2021, 42);
        let c = generate(40.4, -3.7, 1.0, 2021, 43);
        assert_eq!(a.records, b.records);
        assert_ne!(a.records, c.records);
    }

    #[test]
    fn nights_are_dark_and_days_are_bright() {
        let resource = generate(40.4, -3.7, 1.0, 2021, 1);
        let midnight = &resource.records[0];
        assert_eq!(midnight.ghi, 0.0);
        let peak = resource.records.iter().map(|r| r.dni).fold(0.0, f64::max);
        assert!(peak > 600.0);
        assert!(resource.records.iter().all(|r| r.ghi >= 0.0 && r.wind_speed > 0.0));
    }
}
