use lazy_static::lazy_static;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::Level;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::{EnvFilter, prelude::*};
use tracing_timing::{Builder, Histogram};
use std::collections::HashMap;
use std::sync::Arc;
use parking_lot::RwLock;
use std::time::{Duration, Instant};
use std::cell::RefCell;

// One minute upper bound, nanosecond resolution
const HISTOGRAM_MAX_NS: u64 = 60_000_000_000;
const HISTOGRAM_SIGFIG: u8 = 3;

#[derive(Hash, Eq, PartialEq, Clone, Debug)]
pub enum OperationCategory {
    Simulation {
        subcategory: SimulationType,
    },
    Economics,
    Aggregation,
    FileIO {
        subcategory: FileIOType,
    },
    Other,
}

#[derive(Hash, Eq, PartialEq, Clone, Debug)]
pub enum SimulationType {
    Pv,
    Csp,
}

#[derive(Hash, Eq, PartialEq, Clone, Debug)]
pub enum FileIOType {
    DataLoad,
    ResultsSave,
    ChartRender,
}

impl OperationCategory {
    pub fn as_str(&self) -> String {
        match self {
            OperationCategory::Simulation { subcategory } => {
                format!("Simulation - {}", match subcategory {
                    SimulationType::Pv => "PV",
                    SimulationType::Csp => "CSP",
                })
            },
            OperationCategory::Economics => "Economics".to_string(),
            OperationCategory::Aggregation => "Aggregation".to_string(),
            OperationCategory::FileIO { subcategory } => {
                format!("File I/O - {}", match subcategory {
                    FileIOType::DataLoad => "Data Load",
                    FileIOType::ResultsSave => "Results Save",
                    FileIOType::ChartRender => "Chart Render",
                })
            },
            OperationCategory::Other => "Other Operations".to_string(),
        }
    }
}

thread_local! {
    static TIMING_STACK: RefCell<Vec<String>> = RefCell::new(Vec::new());
}

lazy_static! {
    static ref TIMING_ENABLED: AtomicBool = AtomicBool::new(false);
    static ref FUNCTION_TIMINGS: Arc<RwLock<HashMap<String, Histogram<u64>>>> = Arc::new(RwLock::new(HashMap::new()));
    static ref CATEGORY_TIMINGS: Arc<RwLock<HashMap<OperationCategory, Histogram<u64>>>> = Arc::new(RwLock::new(HashMap::new()));
    static ref HIERARCHICAL_TIMINGS: Arc<RwLock<HashMap<String, (Duration, usize, Vec<String>)>>> = Arc::new(RwLock::new(HashMap::new()));
}

fn new_histogram() -> Option<Histogram<u64>> {
    Histogram::<u64>::new_with_bounds(1, HISTOGRAM_MAX_NS, HISTOGRAM_SIGFIG).ok()
}

pub struct TimingGuard {
    function_name: String,
    category: OperationCategory,
    start: Instant,
    tracked: bool,
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        if self.tracked {
            record_timing_end(&self.function_name, self.start.elapsed(), &self.category);
        }
    }
}

/// Starts timing an operation. The measurement is recorded when the guard drops.
pub fn start_timing(function_name: &str, category: OperationCategory) -> TimingGuard {
    let tracked = is_timing_enabled();
    if tracked {
        TIMING_STACK.with(|stack| stack.borrow_mut().push(function_name.to_string()));
    }
    TimingGuard {
        function_name: function_name.to_string(),
        category,
        start: Instant::now(),
        tracked,
    }
}

fn record_into<K: std::hash::Hash + Eq>(map: &mut HashMap<K, Histogram<u64>>, key: K, duration_ns: u64) {
    if let Some(histogram) = map.get_mut(&key) {
        let _ = histogram.record(duration_ns);
    } else if let Some(mut histogram) = new_histogram() {
        let _ = histogram.record(duration_ns);
        map.insert(key, histogram);
    }
}

fn record_timing_end(function_name: &str, duration: Duration, category: &OperationCategory) {
    let duration_ns = (duration.as_nanos() as u64).clamp(1, HISTOGRAM_MAX_NS);

    TIMING_STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        stack.pop();
        let mut hierarchical = HIERARCHICAL_TIMINGS.write();
        let entry = hierarchical
            .entry(function_name.to_string())
            .or_insert((Duration::from_nanos(0), 0, Vec::new()));
        entry.0 += duration;
        entry.1 += 1;
        if let Some(parent_name) = stack.last() {
            if !entry.2.contains(parent_name) {
                entry.2.push(parent_name.clone());
            }
        }
    });

    record_into(&mut FUNCTION_TIMINGS.write(), function_name.to_string(), duration_ns);
    record_into(&mut CATEGORY_TIMINGS.write(), category.clone(), duration_ns);
}

/// Installs the global tracing subscriber. Can only succeed once per process.
pub fn init_logging(enable_timing: bool, debug: bool) -> Result<(), SetGlobalDefaultError> {
    TIMING_ENABLED.store(enable_timing, Ordering::SeqCst);

    let mut env_filter = EnvFilter::from_default_env().add_directive(Level::INFO.into());
    if debug {
        if let Ok(directive) = "solarsweep=debug".parse() {
            env_filter = env_filter.add_directive(directive);
        }
    }

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

    match enable_timing.then(new_histogram).flatten() {
        Some(template) => {
            let timing_layer = Builder::default().layer(move || template.clone());
            let subscriber = tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .with(timing_layer.boxed());
            tracing::subscriber::set_global_default(subscriber)
        }
        None => {
            let subscriber = tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer);
            tracing::subscriber::set_global_default(subscriber)
        }
    }
}

pub fn is_timing_enabled() -> bool {
    TIMING_ENABLED.load(Ordering::SeqCst)
}

pub fn print_timing_report() {
    if !is_timing_enabled() {
        return;
    }

    println!("\nDetailed Performance Report");
    println!("==========================");

    println!("\nHierarchical Timing Analysis:");
    println!("---------------------------");
    let hierarchical = HIERARCHICAL_TIMINGS.read();
    let mut entries: Vec<_> = hierarchical.iter().collect();
    entries.sort_by(|a, b| b.1.0.cmp(&a.1.0));

    for (function_name, (total_duration, count, parents)) in entries {
        let avg_duration = total_duration.div_f64((*count).max(1) as f64);
        println!(
            "{}: total={:.2}s, count={}, avg={:.2}ms{}",
            function_name,
            total_duration.as_secs_f64(),
            count,
            avg_duration.as_secs_f64() * 1000.0,
            if !parents.is_empty() {
                format!("\n  Called by: {}", parents.join(", "))
            } else {
                String::new()
            }
        );
    }

    println!("\nPerformance by Category:");
    println!("------------------------");
    let category_timings = CATEGORY_TIMINGS.read();
    let mut category_vec: Vec<_> = category_timings.iter().collect();
    category_vec.sort_by(|a, b| {
        let a_total = a.1.mean() * a.1.len() as f64;
        let b_total = b.1.mean() * b.1.len() as f64;
        b_total.partial_cmp(&a_total).unwrap_or(std::cmp::Ordering::Equal)
    });

    let total_time: f64 = category_vec.iter()
        .map(|(_, hist)| hist.mean() * (hist.len() as f64))
        .sum();

    for (category, histogram) in category_vec {
        let category_total = histogram.mean() * (histogram.len() as f64);
        let percentage = if total_time > 0.0 { category_total / total_time * 100.0 } else { 0.0 };
        println!(
            "{}: {:.1}% of total time\n  mean={:.2}ms, p95={:.2}ms, p99={:.2}ms, count={}, total={:.2}s",
            category.as_str(),
            percentage,
            histogram.mean() / 1_000_000.0,
            histogram.value_at_quantile(0.95) as f64 / 1_000_000.0,
            histogram.value_at_quantile(0.99) as f64 / 1_000_000.0,
            histogram.len(),
            category_total / 1_000_000_000.0,
        );
    }

    println!("==========================\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_labels_include_subcategory() {
        let category = OperationCategory::Simulation { subcategory: SimulationType::Csp };
        assert_eq!(category.as_str(), "Simulation - CSP");
        let category = OperationCategory::FileIO { subcategory: FileIOType::ChartRender };
        assert_eq!(category.as_str(), "File I/O - Chart Render");
    }

    #[test]
    fn guard_is_inert_when_timing_disabled() {
        let guard = start_timing("noop", OperationCategory::Other);
        assert!(!guard.tracked || is_timing_enabled());
    }

    #[test]
    fn histogram_bounds_are_valid() {
        assert!(new_histogram().is_some());
    }
}
