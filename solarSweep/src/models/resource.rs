use serde::{Deserialize, Serialize};
use chrono::{NaiveDate, NaiveDateTime};
use crate::config::constants::DEFAULT_TIME_STEP_MINUTES;

/// Site metadata read from a resource file preamble (or supplied by the country config).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceMetadata {
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub time_zone: f64,   // hours offset from UTC
    pub elevation: f64,   // m
}

/// One time step of weather data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub ghi: f64,          // W/m²
    pub dni: f64,          // W/m²
    pub dhi: f64,          // W/m²
    pub temperature: f64,  // °C
    pub wind_speed: f64,   // m/s
    pub dew_point: Option<f64>,
    pub pressure: Option<f64>,
}

impl ResourceRecord {
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
            .and_then(|date| date.and_hms_opt(self.hour, self.minute, 0))
    }

    /// Local clock hour at the middle of the interval this record covers.
    /// Stamps on the hour mark the interval start; any other stamp (NSRDB's `:30`) is already the midpoint.
    pub fn midpoint_clock_hours(&self, step_hours: f64) -> f64 {
        let clock = self.hour as f64 + self.minute as f64 / 60.0;
        if self.minute == 0 {
            clock + step_hours / 2.0
        } else {
            clock
        }
    }

    /// Day of year, with Feb 29 folded onto Feb 28 so leap years stay on a 365 day grid.
    pub fn day_of_year(&self) -> u32 {
        let day = if self.month == 2 && self.day == 29 { 28 } else { self.day };
        NaiveDate::from_ymd_opt(2023, self.month, day)
            .map(|d| chrono::Datelike::ordinal(&d))
            .unwrap_or(1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolarResource {
    pub metadata: ResourceMetadata,
    pub records: Vec<ResourceRecord>,
}

impl SolarResource {
    pub fn new(metadata: ResourceMetadata, records: Vec<ResourceRecord>) -> Self {
        Self { metadata, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Time step in minutes inferred from the first two records.
    pub fn time_step_minutes(&self) -> u32 {
        if self.records.len() < 2 {
            return DEFAULT_TIME_STEP_MINUTES;
        }
        match (self.records[0].timestamp(), self.records[1].timestamp()) {
            (Some(a), Some(b)) => {
                let minutes = (b - a).num_minutes();
                if minutes > 0 && minutes <= 24 * 60 {
                    minutes as u32
                } else {
                    DEFAULT_TIME_STEP_MINUTES
                }
            }
            _ => DEFAULT_TIME_STEP_MINUTES,
        }
    }

    pub fn time_step_hours(&self) -> f64 {
        self.time_step_minutes() as f64 / 60.0
    }

    /// Number of years the records span, used to annualise multi-year files.
    pub fn years_covered(&self) -> f64 {
        let hours = self.records.len() as f64 * self.time_step_hours();
        (hours / crate::config::constants::HOURS_PER_YEAR).max(1.0 / 365.0)
    }

    pub fn sort_by_timestamp(&mut self) {
        self.records.sort_by_key(|r| (r.year, r.month, r.day, r.hour, r.minute));
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// A flat week of data: sunny 06:00-18:00, dark otherwise.
    pub fn flat_resource(days: u32, dni: f64) -> SolarResource {
        let mut records = Vec::new();
        for day in 1..=days {
            for hour in 0..24 {
                let lit = (6..18).contains(&hour);
                records.push(ResourceRecord {
                    year: 2023,
                    month: 6,
                    day,
                    hour,
                    minute: 0,
                    ghi: if lit { dni * 0.8 } else { 0.0 },
                    dni: if lit { dni } else { 0.0 },
                    dhi: if lit { 80.0 } else { 0.0 },
                    temperature: 20.0,
                    wind_speed: 2.0,
                    dew_point: None,
                    pressure: None,
                });
            }
        }
        SolarResource::new(
            ResourceMetadata {
                location: "test".to_string(),
                latitude: -23.6,
                longitude: -70.4,
                time_zone: -4.0,
                elevation: 100.0,
            },
            records,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::test_support::flat_resource;

    #[test]
    fn infers_hourly_step() {
        let resource = flat_resource(2, 900.0);
        assert_eq!(resource.time_step_minutes(), 60);
        assert_eq!(resource.len(), 48);
    }

    #[test]
    fn midpoint_shifts_only_interval_starts() {
        let mut record = flat_resource(1, 0.0).records[12].clone();
        assert_eq!(record.midpoint_clock_hours(1.0), 12.5);
        record.minute = 30;
        assert_eq!(record.midpoint_clock_hours(1.0), 12.5);
        record.minute = 15;
        assert_eq!(record.midpoint_clock_hours(0.5), 12.25);
    }

    #[test]
    fn leap_day_folds_onto_feb_28() {
        let mut record = flat_resource(1, 0.0).records[0].clone();
        record.year = 2020;
        record.month = 2;
        record.day = 29;
        assert_eq!(record.day_of_year(), 59);
    }

    #[test]
    fn sorting_orders_by_time() {
        let mut resource = flat_resource(2, 900.0);
        resource.records.reverse();
        resource.sort_by_timestamp();
        assert_eq!(resource.records[0].day, 1);
        assert_eq!(resource.records[0].hour, 0);
    }
}
