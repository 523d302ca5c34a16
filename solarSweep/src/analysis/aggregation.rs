//! Per-country summaries over valid sweep points. Failed points never reach
//! this module, and undefined LCOEs are skipped for the LCOE extrema.

use serde::Serialize;
use std::collections::BTreeMap;
use crate::models::sweep_point::{SweepParameter, SweepPoint};
use crate::models::simulator::Technology;
use crate::utils::logging::{self, OperationCategory};

/// Ratio of annual energy to nameplate running for `hours`.
pub fn capacity_factor(energy_kwh: f64, nameplate_kw: f64, hours: f64) -> Option<f64> {
    if !(nameplate_kw > 0.0) || !(hours > 0.0) || !energy_kwh.is_finite() {
        return None;
    }
    Some(energy_kwh / (nameplate_kw * hours))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountrySummary {
    pub country: String,
    pub technology: Technology,
    pub parameter: SweepParameter,
    pub points: usize,
    pub min_lcoe: Option<f64>,
    pub min_lcoe_at: Option<f64>,
    pub max_lcoe: Option<f64>,
    pub max_lcoe_at: Option<f64>,
    pub min_energy_kwh: f64,
    pub max_energy_kwh: f64,
    pub max_energy_at: f64,
    pub mean_capacity_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinLcoeRow {
    pub country: String,
    pub technology: Technology,
    pub parameter: SweepParameter,
    pub value: f64,
    pub lcoe: f64,
    pub annual_energy_kwh: f64,
}

/// Groups points by country, keeping first-seen order.
pub fn group_by_country<'a>(points: &'a [SweepPoint]) -> Vec<(&'a str, Vec<&'a SweepPoint>)> {
    let mut groups: Vec<(&str, Vec<&SweepPoint>)> = Vec::new();
    for point in points {
        match groups.iter_mut().find(|(country, _)| *country == point.country) {
            Some((_, members)) => members.push(point),
            None => groups.push((point.country.as_str(), vec![point])),
        }
    }
    groups
}

fn lcoe_extremum<'a>(points: &[&'a SweepPoint], want_min: bool) -> Option<&'a SweepPoint> {
    points
        .iter()
        .copied()
        .filter(|p| p.lcoe.is_some())
        .fold(None, |best: Option<&SweepPoint>, p| match best {
            None => Some(p),
            Some(b) => {
                let (pl, bl) = (p.lcoe.unwrap_or(f64::NAN), b.lcoe.unwrap_or(f64::NAN));
                if (want_min && pl < bl) || (!want_min && pl > bl) { Some(p) } else { Some(b) }
            }
        })
}

pub fn country_summaries(points: &[SweepPoint]) -> Vec<CountrySummary> {
    let _timing = logging::start_timing("country_summaries", OperationCategory::Aggregation);

    group_by_country(points)
        .into_iter()
        .filter_map(|(country, members)| {
            let first = members.first()?;
            let min = lcoe_extremum(&members, true);
            let max = lcoe_extremum(&members, false);
            let min_energy = members.iter().map(|p| p.annual_energy_kwh).fold(f64::INFINITY, f64::min);
            let best_energy = members
                .iter()
                .copied()
                .fold(*first, |b, p| if p.annual_energy_kwh > b.annual_energy_kwh { p } else { b });
            let mean_cf = members.iter().map(|p| p.capacity_factor).sum::<f64>() / members.len() as f64;

            Some(CountrySummary {
                country: country.to_string(),
                technology: first.technology,
                parameter: first.parameter,
                points: members.len(),
                min_lcoe: min.and_then(|p| p.lcoe),
                min_lcoe_at: min.map(|p| p.value),
                max_lcoe: max.and_then(|p| p.lcoe),
                max_lcoe_at: max.map(|p| p.value),
                min_energy_kwh: min_energy,
                max_energy_kwh: best_energy.annual_energy_kwh,
                max_energy_at: best_energy.value,
                mean_capacity_factor: mean_cf,
            })
        })
        .collect()
}

/// Lowest defined LCOE per country. Countries without one are left out.
pub fn min_lcoe_by_country(points: &[SweepPoint]) -> Vec<MinLcoeRow> {
    group_by_country(points)
        .into_iter()
        .filter_map(|(country, members)| {
            let best = lcoe_extremum(&members, true)?;
            Some(MinLcoeRow {
                country: country.to_string(),
                technology: best.technology,
                parameter: best.parameter,
                value: best.value,
                lcoe: best.lcoe?,
                annual_energy_kwh: best.annual_energy_kwh,
            })
        })
        .collect()
}

/// Mean LCOE per parameter value across countries, sorted by value.
pub fn mean_lcoe_by_value(points: &[SweepPoint]) -> Vec<(f64, f64)> {
    let mut buckets: BTreeMap<u64, (f64, f64, usize)> = BTreeMap::new();
    for point in points {
        if let Some(lcoe) = point.lcoe {
            // Keyed on the bit pattern; sweep values are produced by the same generator
            let entry = buckets.entry(point.value.to_bits()).or_insert((point.value, 0.0, 0));
            entry.1 += lcoe;
            entry.2 += 1;
        }
    }
    let mut means: Vec<(f64, f64)> = buckets.into_values().map(|(v, sum, n)| (v, sum / n as f64)).collect();
    means.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    means
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn point(country: &str, value: f64, energy: f64, lcoe: Option<f64>) -> SweepPoint {
        SweepPoint {
            country: country.to_string(),
            technology: Technology::Csp,
            parameter: SweepParameter::StorageHours,
            value,
            annual_energy_kwh: energy,
            installed_cost: 1.0e8,
            capital_cost: 1.0e8,
            fixed_charge_rate: 0.08,
            fixed_operating_cost: 1.0e6,
            variable_operating_cost: 0.02,
            capacity_factor: 0.5,
            lcoe,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::test_support::point;
    use crate::config::constants::HOURS_PER_YEAR;
    use approx::assert_relative_eq;

    #[test]
    fn capacity_factor_of_continuous_output_is_one() {
        assert_relative_eq!(capacity_factor(8760.0 * 100.0, 100.0, HOURS_PER_YEAR).unwrap(), 1.0);
        assert_eq!(capacity_factor(1.0, 0.0, HOURS_PER_YEAR), None);
    }

    #[test]
    fn summaries_pick_extrema_per_country() {
        let points = vec![
            point("chile", 4.0, 1.0e8, Some(0.12)),
            point("chile", 8.0, 2.0e8, Some(0.09)),
            point("chile", 12.0, 2.5e8, None),
            point("espana", 4.0, 0.8e8, Some(0.15)),
        ];
        let summaries = country_summaries(&points);
        assert_eq!(summaries.len(), 2);
        let chile = &summaries[0];
        assert_eq!(chile.country, "chile");
        assert_eq!(chile.points, 3);
        assert_eq!(chile.min_lcoe, Some(0.09));
        assert_eq!(chile.min_lcoe_at, Some(8.0));
        assert_eq!(chile.max_lcoe, Some(0.12));
        assert_eq!(chile.max_energy_at, 12.0);
        assert_eq!(chile.min_energy_kwh, 1.0e8);
    }

    #[test]
    fn countries_without_defined_lcoe_have_no_minimum() {
        let points = vec![point("australia", 4.0, 0.0, None)];
        assert!(min_lcoe_by_country(&points).is_empty());
        assert_eq!(country_summaries(&points)[0].min_lcoe, None);
    }

    #[test]
    fn mean_by_value_averages_across_countries() {
        let points = vec![
            point("chile", 4.0, 1.0, Some(0.10)),
            point("espana", 4.0, 1.0, Some(0.20)),
            point("chile", 2.0, 1.0, Some(0.30)),
        ];
        let means = mean_lcoe_by_value(&points);
        assert_eq!(means.len(), 2);
        assert_eq!(means[0].0, 2.0);
        assert_relative_eq!(means[1].1, 0.15);
    }
}
