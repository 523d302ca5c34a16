use serde::Serialize;
use std::collections::BTreeMap;
use crate::config::constants::{IQR_OUTLIER_FACTOR, MONTHS_PER_YEAR};
use crate::models::resource::{ResourceRecord, SolarResource};
use crate::utils::logging::{self, OperationCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Variable {
    #[serde(rename = "GHI")]
    Ghi,
    #[serde(rename = "DHI")]
    Dhi,
    #[serde(rename = "DNI")]
    Dni,
    Temperature,
    #[serde(rename = "Wind Speed")]
    WindSpeed,
}

impl Variable {
    pub const ALL: [Variable; 5] = [Variable::Ghi, Variable::Dhi, Variable::Dni, Variable::Temperature, Variable::WindSpeed];
    pub const IRRADIANCE: [Variable; 3] = [Variable::Ghi, Variable::Dhi, Variable::Dni];

    pub fn name(&self) -> &'static str {
        match self {
            Variable::Ghi => "GHI",
            Variable::Dhi => "DHI",
            Variable::Dni => "DNI",
            Variable::Temperature => "Temperature",
            Variable::WindSpeed => "Wind Speed",
        }
    }

    fn value(&self, record: &ResourceRecord) -> f64 {
        match self {
            Variable::Ghi => record.ghi,
            Variable::Dhi => record.dhi,
            Variable::Dni => record.dni,
            Variable::Temperature => record.temperature,
            Variable::WindSpeed => record.wind_speed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveStats {
    pub location: String,
    pub variable: Variable,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierSummary {
    pub location: String,
    pub variable: Variable,
    pub count: usize,
    pub percentage: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub total_valid: usize,
}

/// Annual irradiance summary in W/m², with the year's total in kWh/m².
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnualSummary {
    pub location: String,
    pub variable: Variable,
    pub mean: f64,
    pub max: f64,
    pub min: f64,
    pub total_kwh_m2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyMean {
    pub location: String,
    pub month: u32,
    pub ghi: f64,
    pub dhi: f64,
    pub dni: f64,
}

/// Statistics of daily irradiation totals, kWh/m² per day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub location: String,
    pub variable: Variable,
    pub days: usize,
    pub mean: f64,
    pub max: f64,
    pub min: f64,
    pub std: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceReport {
    pub location: String,
    pub descriptive: Vec<DescriptiveStats>,
    pub outliers: Vec<OutlierSummary>,
    pub annual: Vec<AnnualSummary>,
    pub monthly: Vec<MonthlyMean>,
    pub daily: Vec<DailySummary>,
}

impl ResourceReport {
    pub fn max_daily(&self, variable: Variable) -> Option<f64> {
        self.daily.iter().find(|d| d.variable == variable).map(|d| d.max)
    }
}

/// Linear-interpolated quantile of an ascending slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    if n == 0 {
        return (f64::NAN, f64::NAN);
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let std = if n > 1 {
        (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64).sqrt()
    } else {
        0.0
    };
    (mean, std)
}

fn sorted_values(resource: &SolarResource, variable: Variable) -> Vec<f64> {
    let mut values: Vec<f64> = resource.records.iter().map(|r| variable.value(r)).filter(|v| v.is_finite()).collect();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    values
}

pub fn describe(resource: &SolarResource) -> Vec<DescriptiveStats> {
    Variable::ALL
        .iter()
        .filter_map(|variable| {
            let values = sorted_values(resource, *variable);
            let (mean, std) = mean_std(&values);
            Some(DescriptiveStats {
                location: resource.metadata.location.clone(),
                variable: *variable,
                count: values.len(),
                mean,
                std,
                min: *values.first()?,
                p25: quantile(&values, 0.25),
                p50: quantile(&values, 0.5),
                p75: quantile(&values, 0.75),
                max: *values.last()?,
            })
        })
        .collect()
}

pub fn iqr_outliers(resource: &SolarResource, factor: f64) -> Vec<OutlierSummary> {
    Variable::ALL
        .iter()
        .filter_map(|variable| {
            let values = sorted_values(resource, *variable);
            if values.is_empty() {
                return None;
            }
            let q1 = quantile(&values, 0.25);
            let q3 = quantile(&values, 0.75);
            let iqr = q3 - q1;
            let lower_bound = q1 - factor * iqr;
            let upper_bound = q3 + factor * iqr;
            let count = values.iter().filter(|v| **v < lower_bound || **v > upper_bound).count();
            Some(OutlierSummary {
                location: resource.metadata.location.clone(),
                variable: *variable,
                count,
                percentage: count as f64 / values.len() as f64 * 100.0,
                lower_bound,
                upper_bound,
                total_valid: values.len(),
            })
        })
        .collect()
}

pub fn annual_summary(resource: &SolarResource) -> Vec<AnnualSummary> {
    let step_hours = resource.time_step_hours();
    let years = resource.years_covered();
    Variable::IRRADIANCE
        .iter()
        .filter_map(|variable| {
            let values = sorted_values(resource, *variable);
            let (mean, _) = mean_std(&values);
            Some(AnnualSummary {
                location: resource.metadata.location.clone(),
                variable: *variable,
                mean,
                max: *values.last()?,
                min: *values.first()?,
                total_kwh_m2: values.iter().sum::<f64>() * step_hours / 1000.0 / years,
            })
        })
        .collect()
}

/// Mean irradiance per calendar month. Months without data report zero.
pub fn monthly_means(resource: &SolarResource) -> Vec<MonthlyMean> {
    let mut sums = [(0.0_f64, 0.0_f64, 0.0_f64, 0_usize); MONTHS_PER_YEAR];
    for record in &resource.records {
        if let Some(slot) = sums.get_mut(record.month.saturating_sub(1) as usize) {
            slot.0 += record.ghi;
            slot.1 += record.dhi;
            slot.2 += record.dni;
            slot.3 += 1;
        }
    }
    sums.iter()
        .enumerate()
        .map(|(i, (ghi, dhi, dni, n))| {
            let mean = |sum: f64| if *n > 0 { sum / *n as f64 } else { 0.0 };
            MonthlyMean {
                location: resource.metadata.location.clone(),
                month: i as u32 + 1,
                ghi: mean(*ghi),
                dhi: mean(*dhi),
                dni: mean(*dni),
            }
        })
        .collect()
}

/// Daily irradiation totals in kWh/m², keyed by (year, month, day).
pub fn daily_irradiation(resource: &SolarResource, variable: Variable) -> Vec<f64> {
    let step_hours = resource.time_step_hours();
    let mut days: BTreeMap<(i32, u32, u32), f64> = BTreeMap::new();
    for record in &resource.records {
        *days.entry((record.year, record.month, record.day)).or_insert(0.0) += variable.value(record) * step_hours / 1000.0;
    }
    days.into_values().collect()
}

pub fn daily_summary(resource: &SolarResource) -> Vec<DailySummary> {
    Variable::IRRADIANCE
        .iter()
        .filter_map(|variable| {
            let daily = daily_irradiation(resource, *variable);
            let (mean, std) = mean_std(&daily);
            Some(DailySummary {
                location: resource.metadata.location.clone(),
                variable: *variable,
                days: daily.len(),
                mean,
                max: daily.iter().copied().reduce(f64::max)?,
                min: daily.iter().copied().reduce(f64::min)?,
                std,
            })
        })
        .collect()
}

pub fn analyze(resource: &SolarResource) -> ResourceReport {
    let _timing = logging::start_timing("analyze_resource", OperationCategory::Aggregation);
    ResourceReport {
        location: resource.metadata.location.clone(),
        descriptive: describe(resource),
        outliers: iqr_outliers(resource, IQR_OUTLIER_FACTOR),
        annual: annual_summary(resource),
        monthly: monthly_means(resource),
        daily: daily_summary(resource),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resource::test_support::flat_resource;
    use approx::assert_relative_eq;

    #[test]
    fn quantiles_interpolate() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(quantile(&values, 0.5), 2.5);
        assert_relative_eq!(quantile(&values, 0.25), 1.75);
        assert_eq!(quantile(&values, 1.0), 4.0);
    }

    #[test]
    fn daily_totals_sum_hourly_irradiance() {
        // 12 lit hours of 900 W/m² DNI per day
        let resource = flat_resource(3, 900.0);
        let daily = daily_irradiation(&resource, Variable::Dni);
        assert_eq!(daily.len(), 3);
        assert_relative_eq!(daily[0], 10.8, epsilon = 1e-9);
        let summary = daily_summary(&resource);
        assert_relative_eq!(summary[2].max, 10.8, epsilon = 1e-9);
        assert_relative_eq!(summary[2].std, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn monthly_means_always_cover_twelve_months() {
        let resource = flat_resource(2, 900.0);
        let monthly = monthly_means(&resource);
        assert_eq!(monthly.len(), 12);
        assert_eq!(monthly[0].ghi, 0.0);
        assert_relative_eq!(monthly[5].dni, 450.0);
    }

    #[test]
    fn outlier_bounds_follow_iqr() {
        let mut resource = flat_resource(1, 900.0);
        resource.records[0].temperature = 60.0;
        let outliers = iqr_outliers(&resource, 1.5);
        let temperature = outliers.iter().find(|o| o.variable == Variable::Temperature).unwrap();
        assert_eq!(temperature.count, 1);
        assert_eq!(temperature.total_valid, 24);
        let report = analyze(&resource);
        assert_eq!(report.descriptive.len(), 5);
        assert_eq!(report.annual.len(), 3);
    }
}
