//! Solar position and irradiance helpers shared by the PV and CSP models.
//!
//! Angles are in degrees unless a name says otherwise. Azimuths are measured
//! clockwise from north, so a south-facing array has azimuth 180°.

use std::f64::consts::PI;
use crate::config::constants::SOLAR_CONSTANT;

const DEG: f64 = PI / 180.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunPosition {
    pub elevation: f64,
    pub azimuth: f64,
}

impl SunPosition {
    pub fn zenith(&self) -> f64 {
        90.0 - self.elevation
    }

    pub fn is_up(&self) -> bool {
        self.elevation > 0.0
    }
}

fn day_angle(day_of_year: u32) -> f64 {
    2.0 * PI * (day_of_year as f64 - 1.0) / 365.0
}

/// Solar declination in degrees (Spencer 1971).
pub fn declination(day_of_year: u32) -> f64 {
    let b = day_angle(day_of_year);
    (0.006918
        - 0.399912 * b.cos()
        + 0.070257 * b.sin()
        - 0.006758 * (2.0 * b).cos()
        + 0.000907 * (2.0 * b).sin()
        - 0.002697 * (3.0 * b).cos()
        + 0.00148 * (3.0 * b).sin())
        / DEG
}

/// Equation of time in minutes (Spencer 1971).
pub fn equation_of_time(day_of_year: u32) -> f64 {
    let b = day_angle(day_of_year);
    229.18
        * (0.000075
            + 0.001868 * b.cos()
            - 0.032077 * b.sin()
            - 0.014615 * (2.0 * b).cos()
            - 0.04089 * (2.0 * b).sin())
}

/// Eccentricity-corrected extraterrestrial normal irradiance, W/m².
pub fn extraterrestrial_irradiance(day_of_year: u32) -> f64 {
    let b = day_angle(day_of_year);
    SOLAR_CONSTANT
        * (1.00011
            + 0.034221 * b.cos()
            + 0.00128 * b.sin()
            + 0.000719 * (2.0 * b).cos()
            + 0.000077 * (2.0 * b).sin())
}

/// Sun position for a local standard clock time.
///
/// `clock_hours` is the decimal hour on the local standard clock, `time_zone`
/// the offset of that clock from UTC in hours.
pub fn sun_position(latitude: f64, longitude: f64, time_zone: f64, day_of_year: u32, clock_hours: f64) -> SunPosition {
    let decl = declination(day_of_year) * DEG;
    let standard_meridian = 15.0 * time_zone;
    let solar_time = clock_hours + (4.0 * (longitude - standard_meridian) + equation_of_time(day_of_year)) / 60.0;
    let hour_angle = 15.0 * (solar_time - 12.0);
    let omega = hour_angle * DEG;
    let lat = latitude * DEG;

    let sin_alpha = (lat.sin() * decl.sin() + lat.cos() * decl.cos() * omega.cos()).clamp(-1.0, 1.0);
    let alpha = sin_alpha.asin();

    let cos_alpha = alpha.cos();
    let cos_az = if cos_alpha.abs() > 1e-9 && lat.cos().abs() > 1e-9 {
        (decl.sin() - sin_alpha * lat.sin()) / (cos_alpha * lat.cos())
    } else {
        0.0
    };
    let az_abs = cos_az.clamp(-1.0, 1.0).acos() / DEG;
    let azimuth = if hour_angle > 0.0 { 360.0 - az_abs } else { az_abs };

    SunPosition {
        elevation: alpha / DEG,
        azimuth,
    }
}

/// Cosine of the angle of incidence on a surface with the given tilt and azimuth.
pub fn cos_incidence(sun: &SunPosition, tilt: f64, surface_azimuth: f64) -> f64 {
    let alpha = sun.elevation * DEG;
    let beta = tilt * DEG;
    let az_diff = (sun.azimuth - surface_azimuth) * DEG;
    (alpha.sin() * beta.cos() + alpha.cos() * beta.sin() * az_diff.cos()).max(0.0)
}

/// Clear-sky irradiance (GHI, DNI, DHI) in W/m², simplified Bird & Hulstrom.
pub fn clear_sky(sun: &SunPosition, day_of_year: u32) -> (f64, f64, f64) {
    if sun.elevation <= 0.1 {
        return (0.0, 0.0, 0.0);
    }
    let e0 = extraterrestrial_irradiance(day_of_year);
    let sin_alpha = (sun.elevation * DEG).sin();
    let air_mass = (1.0 / (sin_alpha + 0.50572 * (sun.elevation + 6.07995_f64).powf(-1.6364))).max(1.0);

    let rayleigh = (-0.0903 * air_mass.powf(0.84) * (1.0 + air_mass - air_mass.powf(1.01))).exp();
    let ozone = 1.0 - 0.0013 * air_mass;
    let aerosol = (-0.09 * 3.0_f64.powf(0.978) * air_mass.powf(0.9455)).exp();
    let water = 1.0 - 0.0075 * air_mass.powf(0.65);
    let total = rayleigh * ozone * aerosol * water;

    let dni = 0.9762 * e0 * total;
    let dhi = (0.79 * e0 * sin_alpha * (1.0 - total) * 0.5 * (1.0 - rayleigh)
        / (1.0 - air_mass + air_mass.powf(1.02)))
        .max(0.0);
    let ghi = (dni * sin_alpha + dhi).max(0.0);
    (ghi, dni, dhi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn declination_peaks_near_solstices() {
        assert!(declination(172) > 23.0);
        assert!(declination(355) < -23.0);
        assert_abs_diff_eq!(declination(80), 0.0, epsilon = 1.5);
    }

    #[test]
    fn noon_sun_faces_equator() {
        // Antofagasta, local noon in June: sun is in the north, well above the horizon
        let sun = sun_position(-23.6, -70.4, -4.0, 172, 12.7);
        assert!(sun.is_up());
        assert!(sun.azimuth < 30.0 || sun.azimuth > 330.0);

        // Madrid, local noon in June: sun is in the south
        let sun = sun_position(40.4, -3.7, 0.0, 172, 12.2);
        assert!((sun.azimuth - 180.0).abs() < 30.0);
        assert!(sun.elevation > 65.0);
    }

    #[test]
    fn midnight_sun_is_down() {
        let sun = sun_position(40.4, -3.7, 0.0, 172, 0.5);
        assert!(!sun.is_up());
        assert_eq!(clear_sky(&sun, 172), (0.0, 0.0, 0.0));
    }

    #[test]
    fn horizontal_surface_incidence_matches_elevation() {
        let sun = SunPosition { elevation: 30.0, azimuth: 120.0 };
        assert_abs_diff_eq!(cos_incidence(&sun, 0.0, 180.0), 0.5, epsilon = 1e-12);
    }
}
