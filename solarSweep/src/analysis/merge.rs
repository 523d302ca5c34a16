use serde::Serialize;
use crate::analysis::aggregation::MinLcoeRow;
use crate::models::sweep_point::{SweepParameter, SweepPoint};
use crate::models::simulator::Technology;
use crate::utils::logging::{self, OperationCategory};

/// One row of the CSP-vs-PV table. CSP columns are empty for PV-only countries
/// and `pv_min_lcoe` is empty where no PV result exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedRow {
    pub country: String,
    pub storage_hours: Option<f64>,
    pub csp_lcoe: Option<f64>,
    pub csp_annual_energy_kwh: Option<f64>,
    pub pv_min_lcoe: Option<f64>,
    pub pv_best_value: Option<f64>,
}

/// Outer join of CSP storage rows with the PV minimum-LCOE table on country.
/// Every CSP row is kept, then every PV country without CSP rows is appended.
/// Country names match regardless of ASCII case.
pub fn outer_join_on_country(csp_points: &[SweepPoint], pv_min: &[MinLcoeRow]) -> Vec<MergedRow> {
    let _timing = logging::start_timing("outer_join_on_country", OperationCategory::Aggregation);

    let pv_for = |country: &str| pv_min.iter().find(|row| row.country.eq_ignore_ascii_case(country));
    let mut merged: Vec<MergedRow> = csp_points
        .iter()
        .map(|point| {
            let pv = pv_for(&point.country);
            MergedRow {
                country: point.country.clone(),
                storage_hours: Some(point.value),
                csp_lcoe: point.lcoe,
                csp_annual_energy_kwh: Some(point.annual_energy_kwh),
                pv_min_lcoe: pv.map(|row| row.lcoe),
                pv_best_value: pv.map(|row| row.value),
            }
        })
        .collect();

    for row in pv_min {
        if !csp_points.iter().any(|p| p.country.eq_ignore_ascii_case(&row.country)) {
            merged.push(MergedRow {
                country: row.country.clone(),
                storage_hours: None,
                csp_lcoe: None,
                csp_annual_energy_kwh: None,
                pv_min_lcoe: Some(row.lcoe),
                pv_best_value: Some(row.value),
            });
        }
    }
    merged
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRow {
    pub country: String,
    pub storage_hours: f64,
    pub csp_annual_energy_kwh: f64,
    pub pv_capacity_kw: f64,
    pub pv_annual_energy_kwh: f64,
}

/// CSP annual energy against storage hours next to a PV plant of one size.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationComparison {
    pub country: String,
    pub pv_capacity_kw: f64,
    pub pv_annual_energy_kwh: f64,
    pub csp_by_storage: Vec<(f64, f64)>,
}

impl GenerationComparison {
    pub fn rows(&self) -> Vec<GenerationRow> {
        self.csp_by_storage
            .iter()
            .map(|(hours, energy)| GenerationRow {
                country: self.country.clone(),
                storage_hours: *hours,
                csp_annual_energy_kwh: *energy,
                pv_capacity_kw: self.pv_capacity_kw,
                pv_annual_energy_kwh: self.pv_annual_energy_kwh,
            })
            .collect()
    }
}

/// Returns `None` when either side has no result for the country.
pub fn generation_comparison(
    csp_points: &[SweepPoint],
    pv_points: &[SweepPoint],
    country: &str,
    pv_capacity_kw: f64,
) -> Option<GenerationComparison> {
    let matches_country = |p: &&SweepPoint| p.country.eq_ignore_ascii_case(country);

    let pv = pv_points
        .iter()
        .filter(matches_country)
        .find(|p| p.technology == Technology::Pv && p.parameter == SweepParameter::Capacity && (p.value - pv_capacity_kw).abs() < 1e-6)?;

    let mut csp_by_storage: Vec<(f64, f64)> = csp_points
        .iter()
        .filter(matches_country)
        .filter(|p| p.parameter == SweepParameter::StorageHours)
        .map(|p| (p.value, p.annual_energy_kwh))
        .collect();
    if csp_by_storage.is_empty() {
        return None;
    }
    csp_by_storage.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    Some(GenerationComparison {
        country: pv.country.clone(),
        pv_capacity_kw,
        pv_annual_energy_kwh: pv.annual_energy_kwh,
        csp_by_storage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregation::test_support::point;

    fn pv_min(country: &str, lcoe: f64) -> MinLcoeRow {
        MinLcoeRow {
            country: country.to_string(),
            technology: Technology::Pv,
            parameter: SweepParameter::Tilt,
            value: 25.0,
            lcoe,
            annual_energy_kwh: 2.0e6,
        }
    }

    #[test]
    fn unmatched_countries_keep_their_rows() {
        let csp = vec![point("chile", 4.0, 1.0e8, Some(0.12)), point("chile", 8.0, 1.5e8, Some(0.10)), point("espana", 4.0, 0.9e8, Some(0.15))];
        let pv = vec![pv_min("chile", 0.05), pv_min("australia", 0.06)];
        let merged = outer_join_on_country(&csp, &pv);
        assert_eq!(merged.len(), 4);
        assert_eq!(merged[0].pv_min_lcoe, Some(0.05));
        assert_eq!(merged[2].country, "espana");
        assert_eq!(merged[2].pv_min_lcoe, None);
        assert_eq!(merged[3].country, "australia");
        assert_eq!(merged[3].storage_hours, None);
        assert_eq!(merged[3].csp_lcoe, None);
    }

    #[test]
    fn join_ignores_country_case() {
        let csp = vec![point("chile", 4.0, 1.0e8, Some(0.12))];
        let merged = outer_join_on_country(&csp, &[pv_min("Chile", 0.05)]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].country, "chile");
        assert_eq!(merged[0].pv_min_lcoe, Some(0.05));
    }

    #[test]
    fn generation_comparison_needs_both_sides() {
        let csp = vec![point("chile", 8.0, 2.0e8, Some(0.1)), point("chile", 4.0, 1.0e8, Some(0.1))];
        let mut pv_point = point("chile", 10_000.0, 2.2e7, Some(0.04));
        pv_point.technology = Technology::Pv;
        pv_point.parameter = SweepParameter::Capacity;

        let comparison = generation_comparison(&csp, &[pv_point.clone()], "Chile", 10_000.0).unwrap();
        assert_eq!(comparison.csp_by_storage, vec![(4.0, 1.0e8), (8.0, 2.0e8)]);
        assert_eq!(comparison.rows().len(), 2);
        assert!(generation_comparison(&csp, &[pv_point.clone()], "chile", 500.0).is_none());
        assert!(generation_comparison(&[], &[pv_point], "chile", 10_000.0).is_none());
    }
}
