use crate::analysis::aggregation::CountrySummary;
use crate::analysis::merge::GenerationComparison;
use crate::analysis::resource_stats::ResourceReport;
use crate::core::sweep::SweepTable;

fn format_lcoe(lcoe: Option<f64>) -> String {
    lcoe.map(|v| format!("{:.4} $/kWh", v)).unwrap_or_else(|| "undefined".to_string())
}

pub fn print_sweep_summary(name: &str, table: &SweepTable) {
    let failures = table.failures();
    println!("\n{} ({} {})", name, table.technology, table.parameter);
    println!("----------------------------------------");
    println!("Evaluated points: {}", table.outcomes().len());
    println!("  Valid: {}", table.outcomes().len() - failures.len());
    println!("  Failed: {}", failures.len());
    for failure in &failures {
        println!("    {} @ {}={}: {}", failure.country, failure.parameter, failure.value, failure.reason);
    }
    for skipped in table.skipped_countries() {
        println!("  Skipped {}: {}", skipped.country, skipped.reason);
    }
}

pub fn print_country_summaries(summaries: &[CountrySummary]) {
    for summary in summaries {
        println!("{} ({} points):", summary.country, summary.points);
        match (summary.min_lcoe, summary.min_lcoe_at) {
            (Some(_), Some(at)) => println!(
                "  Min LCOE: {} at {}={}",
                format_lcoe(summary.min_lcoe),
                summary.parameter,
                at
            ),
            _ => println!("  Min LCOE: undefined"),
        }
        if let Some(at) = summary.max_lcoe_at {
            println!("  Max LCOE: {} at {}={}", format_lcoe(summary.max_lcoe), summary.parameter, at);
        }
        println!(
            "  Energy: {:.3} - {:.3} GWh/yr (max at {}={})",
            summary.min_energy_kwh / 1e6,
            summary.max_energy_kwh / 1e6,
            summary.parameter,
            summary.max_energy_at
        );
        println!("  Mean capacity factor: {:.1}%", summary.mean_capacity_factor * 100.0);
    }
}

pub fn print_generation_comparison(comparison: &GenerationComparison) {
    println!("\nGeneration comparison: {}", comparison.country);
    println!("----------------------------------------");
    println!(
        "PV reference ({:.0} kW): {:.3} GWh/yr",
        comparison.pv_capacity_kw,
        comparison.pv_annual_energy_kwh / 1e6
    );
    for (hours, energy) in &comparison.csp_by_storage {
        println!("  CSP {:>4.1} h storage: {:.3} GWh/yr", hours, energy / 1e6);
    }
}

pub fn print_resource_report(report: &ResourceReport) {
    println!("\n=== {} ===", report.location);
    println!("Descriptive statistics:");
    for s in &report.descriptive {
        println!(
            "  {:<12} n={} mean={:.2} std={:.2} min={:.2} p25={:.2} p50={:.2} p75={:.2} max={:.2}",
            s.variable.name(), s.count, s.mean, s.std, s.min, s.p25, s.p50, s.p75, s.max
        );
    }
    println!("Outliers (IQR):");
    for o in &report.outliers {
        println!(
            "  {:<12} {} ({:.2}%) outside [{:.2}, {:.2}]",
            o.variable.name(), o.count, o.percentage, o.lower_bound, o.upper_bound
        );
    }
    println!("Annual irradiation:");
    for a in &report.annual {
        println!(
            "  {:<4} mean={:.2} W/m², max={:.2} W/m², total={:.1} kWh/m²",
            a.variable.name(), a.mean, a.max, a.total_kwh_m2
        );
    }
    println!("Daily irradiation:");
    for d in &report.daily {
        println!(
            "  {:<4} mean={:.2} max={:.2} min={:.2} std={:.2} kWh/m²/day over {} days",
            d.variable.name(), d.mean, d.max, d.min, d.std, d.days
        );
    }
}
