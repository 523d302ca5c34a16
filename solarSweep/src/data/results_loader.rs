use std::fs::File;
use std::path::Path;
use csv::{ReaderBuilder, StringRecord};
use serde::de::DeserializeOwned;
use crate::models::sweep_point::SweepPoint;
use crate::utils::logging::{self, FileIOType, OperationCategory};

/// Columns every exported sweep table carries.
pub const SWEEP_COLUMNS: [&str; 6] = ["country", "technology", "parameter", "value", "annual_energy_kwh", "lcoe"];

#[derive(Debug)]
pub enum ResultsLoadError {
    IoError(std::io::Error),
    CsvError(csv::Error),
    MissingColumns { file: String, columns: Vec<String> },
    Empty(String),
}

impl From<std::io::Error> for ResultsLoadError {
    fn from(err: std::io::Error) -> Self {
        ResultsLoadError::IoError(err)
    }
}

impl From<csv::Error> for ResultsLoadError {
    fn from(err: csv::Error) -> Self {
        ResultsLoadError::CsvError(err)
    }
}

impl std::fmt::Display for ResultsLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultsLoadError::IoError(e) => write!(f, "IO error: {}", e),
            ResultsLoadError::CsvError(e) => write!(f, "CSV error: {}", e),
            ResultsLoadError::MissingColumns { file, columns } => {
                write!(f, "{} is missing columns: {}", file, columns.join(", "))
            }
            ResultsLoadError::Empty(s) => write!(f, "No rows in {}", s),
        }
    }
}

impl std::error::Error for ResultsLoadError {}

/// Names from `required` that are absent in `headers`.
pub fn missing_columns(headers: &[&str], required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|col| !headers.iter().any(|h| h.trim().eq_ignore_ascii_case(col)))
        .map(|col| col.to_string())
        .collect()
}

/// Reads a table after checking its header names the `required` columns.
pub fn load_table<T: DeserializeOwned>(path: &Path, required: &[&str]) -> Result<Vec<T>, ResultsLoadError> {
    let _timing = logging::start_timing("load_table",
        OperationCategory::FileIO { subcategory: FileIOType::DataLoad });

    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);
    let headers = reader.headers()?.clone();
    let header_names: Vec<&str> = headers.iter().collect();
    let missing = missing_columns(&header_names, required);
    if !missing.is_empty() {
        return Err(ResultsLoadError::MissingColumns {
            file: path.display().to_string(),
            columns: missing,
        });
    }

    // Field names are matched exactly by serde, so fold headers the way the check above does
    let normalised: StringRecord = headers.iter().map(|h| h.trim().to_ascii_lowercase()).collect();
    reader.set_headers(normalised);

    let rows: Vec<T> = reader.deserialize().collect::<Result<_, _>>()?;
    if rows.is_empty() {
        return Err(ResultsLoadError::Empty(path.display().to_string()));
    }
    Ok(rows)
}

pub fn load_sweep_points(path: &Path) -> Result<Vec<SweepPoint>, ResultsLoadError> {
    load_table(path, &SWEEP_COLUMNS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_are_case_insensitive() {
        let headers = ["Country", "value", "LCOE"];
        assert_eq!(missing_columns(&headers, &["country", "lcoe"]), Vec::<String>::new());
        assert_eq!(missing_columns(&headers, &["country", "storage_hours"]), vec!["storage_hours".to_string()]);
    }

    #[test]
    fn capitalised_headers_load() {
        let path = std::env::temp_dir().join(format!("solarsweep_results_caps_{}.csv", std::process::id()));
        std::fs::write(
            &path,
            "Country,Technology,Parameter,Value,Annual_Energy_kWh,LCOE\nchile,csp,storage_hours,4,100000000,0.12\n",
        )
        .unwrap();
        let points = load_sweep_points(&path).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].country, "chile");
        assert_eq!(points[0].annual_energy_kwh, 1.0e8);
        assert_eq!(points[0].lcoe, Some(0.12));
        let _ = std::fs::remove_file(path);
    }
}
