use std::fs;
use std::path::Path;
use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, info, warn};
use crate::config::countries::Country;
use crate::models::resource::{ResourceMetadata, ResourceRecord, SolarResource};
use crate::utils::logging::{self, FileIOType, OperationCategory};

#[derive(Debug)]
pub enum ResourceLoadError {
    IoError(std::io::Error),
    CsvError(csv::Error),
    MissingColumn { file: String, column: String },
    InvalidValue { row: usize, column: String, value: String },
    MissingMetadata(String),
    Empty(String),
}

impl From<std::io::Error> for ResourceLoadError {
    fn from(err: std::io::Error) -> Self {
        ResourceLoadError::IoError(err)
    }
}

impl From<csv::Error> for ResourceLoadError {
    fn from(err: csv::Error) -> Self {
        ResourceLoadError::CsvError(err)
    }
}

impl std::fmt::Display for ResourceLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceLoadError::IoError(e) => write!(f, "IO error: {}", e),
            ResourceLoadError::CsvError(e) => write!(f, "CSV error: {}", e),
            ResourceLoadError::MissingColumn { file, column } => {
                write!(f, "Required column '{}' not found in {}", column, file)
            }
            ResourceLoadError::InvalidValue { row, column, value } => {
                write!(f, "Invalid value '{}' in column '{}' at row {}", value, column, row)
            }
            ResourceLoadError::MissingMetadata(s) => write!(f, "Missing site metadata: {}", s),
            ResourceLoadError::Empty(s) => write!(f, "No resource data in {}", s),
        }
    }
}

impl std::error::Error for ResourceLoadError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Ghi,
    Dni,
    Dhi,
    Temperature,
    WindSpeed,
    DewPoint,
    Pressure,
}

impl Field {
    const REQUIRED: [Field; 9] = [
        Field::Year,
        Field::Month,
        Field::Day,
        Field::Hour,
        Field::Dni,
        Field::Dhi,
        Field::Ghi,
        Field::Temperature,
        Field::WindSpeed,
    ];

    fn name(&self) -> &'static str {
        match self {
            Field::Year => "Year",
            Field::Month => "Month",
            Field::Day => "Day",
            Field::Hour => "Hour",
            Field::Minute => "Minute",
            Field::Ghi => "GHI",
            Field::Dni => "DNI",
            Field::Dhi => "DHI",
            Field::Temperature => "Temperature",
            Field::WindSpeed => "Wind Speed",
            Field::DewPoint => "Dew Point",
            Field::Pressure => "Pressure",
        }
    }

    // Normalised (lowercase, underscores as spaces) header spellings seen across providers
    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Field::Year => &["year"],
            Field::Month => &["month"],
            Field::Day => &["day"],
            Field::Hour => &["hour"],
            Field::Minute => &["minute"],
            Field::Ghi => &["ghi", "gh"],
            Field::Dni => &["dni", "dn"],
            Field::Dhi => &["dhi", "df"],
            Field::Temperature => &["temperature", "tdry", "temp air", "temp"],
            Field::WindSpeed => &["wind speed", "wspd"],
            Field::DewPoint => &["dew point", "tdew"],
            Field::Pressure => &["pressure", "pres"],
        }
    }
}

fn normalise(header: &str) -> String {
    header.trim().to_lowercase().replace('_', " ")
}

struct ColumnMap {
    indices: Vec<(Field, usize)>,
}

impl ColumnMap {
    fn from_header(header: &StringRecord) -> Self {
        let names: Vec<String> = header.iter().map(normalise).collect();
        let all = Field::REQUIRED
            .iter()
            .chain([Field::Minute, Field::DewPoint, Field::Pressure].iter());
        let indices = all
            .filter_map(|field| {
                names
                    .iter()
                    .position(|name| field.aliases().contains(&name.as_str()))
                    .map(|idx| (*field, idx))
            })
            .collect();
        Self { indices }
    }

    fn get(&self, field: Field) -> Option<usize> {
        self.indices.iter().find(|(f, _)| *f == field).map(|(_, idx)| *idx)
    }

    /// A header row is a data header when it names the time columns and DNI.
    fn looks_like_data_header(&self) -> bool {
        [Field::Year, Field::Month, Field::Day, Field::Hour, Field::Dni]
            .iter()
            .all(|f| self.get(*f).is_some())
    }
}

fn metadata_value(keys: &StringRecord, values: &StringRecord, names: &[&str], fallback: usize) -> Option<f64> {
    let by_key = keys
        .iter()
        .position(|k| names.iter().any(|n| k.trim().eq_ignore_ascii_case(n)))
        .and_then(|idx| values.get(idx));
    by_key
        .or_else(|| values.get(fallback))
        .and_then(|v| v.trim().parse::<f64>().ok())
}

/// Reads the NSRDB metadata rows (keys on line 1, values on line 2).
fn parse_metadata(keys: &StringRecord, values: &StringRecord, location: &str) -> Result<ResourceMetadata, ResourceLoadError> {
    let missing = |what: &str| ResourceLoadError::MissingMetadata(format!("{} for {}", what, location));
    Ok(ResourceMetadata {
        location: location.to_string(),
        latitude: metadata_value(keys, values, &["Latitude"], 5).ok_or_else(|| missing("latitude"))?,
        longitude: metadata_value(keys, values, &["Longitude"], 6).ok_or_else(|| missing("longitude"))?,
        time_zone: metadata_value(keys, values, &["Time Zone", "Local Time Zone"], 7).ok_or_else(|| missing("time zone"))?,
        elevation: metadata_value(keys, values, &["Elevation"], 8).unwrap_or(0.0),
    })
}

fn is_null(value: &str) -> bool {
    matches!(value.trim(), "" | "NA" | "NULL" | "NaN" | "nan")
}

fn parse_number(record: &StringRecord, idx: usize, field: Field, row: usize) -> Result<f64, ResourceLoadError> {
    let raw = record.get(idx).unwrap_or("");
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ResourceLoadError::InvalidValue {
            row,
            column: field.name().to_string(),
            value: raw.to_string(),
        })
}

fn parse_integer(record: &StringRecord, idx: usize, field: Field, row: usize) -> Result<i64, ResourceLoadError> {
    let value = parse_number(record, idx, field, row)?;
    if value.fract() != 0.0 {
        return Err(ResourceLoadError::InvalidValue {
            row,
            column: field.name().to_string(),
            value: value.to_string(),
        });
    }
    Ok(value as i64)
}

fn parse_optional(record: &StringRecord, idx: Option<usize>) -> Option<f64> {
    let raw = record.get(idx?)?;
    if is_null(raw) {
        return None;
    }
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses resource CSV text. `site` supplies metadata for files without a preamble.
pub fn parse_resource(
    text: &str,
    source: &str,
    location: &str,
    site: Option<&ResourceMetadata>,
) -> Result<SolarResource, ResourceLoadError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let rows: Vec<StringRecord> = reader.records().collect::<Result<_, _>>()?;

    let first = rows.first().ok_or_else(|| ResourceLoadError::Empty(source.to_string()))?;
    let plain_columns = ColumnMap::from_header(first);

    // Line number in the file of the first data row, for error messages
    let (metadata, columns, data_start) = if plain_columns.looks_like_data_header() {
        let metadata = site.cloned().ok_or_else(|| {
            ResourceLoadError::MissingMetadata(format!(
                "{} has no metadata preamble and {} has no site coordinates configured",
                source, location
            ))
        })?;
        (metadata, plain_columns, 1)
    } else {
        let values = rows.get(1).ok_or_else(|| ResourceLoadError::Empty(source.to_string()))?;
        let header = rows.get(2).ok_or_else(|| ResourceLoadError::Empty(source.to_string()))?;
        let metadata = match parse_metadata(first, values, location) {
            Ok(metadata) => metadata,
            Err(e) => site.cloned().ok_or(e)?,
        };
        (metadata, ColumnMap::from_header(header), 3)
    };

    for field in Field::REQUIRED {
        if columns.get(field).is_none() {
            return Err(ResourceLoadError::MissingColumn {
                file: source.to_string(),
                column: field.name().to_string(),
            });
        }
    }
    let col = |field: Field| columns.get(field).unwrap_or(usize::MAX);

    if columns.get(Field::Minute).is_none() {
        debug!("{}: no Minute column, assuming records on the hour", source);
    }
    for optional in [Field::DewPoint, Field::Pressure] {
        if columns.get(optional).is_none() {
            warn!("{}: optional column '{}' not present", source, optional.name());
        }
    }

    let mut records = Vec::with_capacity(rows.len().saturating_sub(data_start));
    for (offset, row) in rows.iter().enumerate().skip(data_start) {
        if row.iter().all(|v| v.trim().is_empty()) {
            continue;
        }
        let line = offset + 1;
        let minute = match columns.get(Field::Minute) {
            Some(idx) => parse_integer(row, idx, Field::Minute, line)?,
            None => 0,
        };
        let record = ResourceRecord {
            year: parse_integer(row, col(Field::Year), Field::Year, line)? as i32,
            month: parse_integer(row, col(Field::Month), Field::Month, line)? as u32,
            day: parse_integer(row, col(Field::Day), Field::Day, line)? as u32,
            hour: parse_integer(row, col(Field::Hour), Field::Hour, line)? as u32,
            minute: minute as u32,
            ghi: parse_number(row, col(Field::Ghi), Field::Ghi, line)?,
            dni: parse_number(row, col(Field::Dni), Field::Dni, line)?,
            dhi: parse_number(row, col(Field::Dhi), Field::Dhi, line)?,
            temperature: parse_number(row, col(Field::Temperature), Field::Temperature, line)?,
            wind_speed: parse_number(row, col(Field::WindSpeed), Field::WindSpeed, line)?,
            dew_point: parse_optional(row, columns.get(Field::DewPoint)),
            pressure: parse_optional(row, columns.get(Field::Pressure)),
        };
        if record.timestamp().is_none() {
            return Err(ResourceLoadError::InvalidValue {
                row: line,
                column: "timestamp".to_string(),
                value: format!("{}-{}-{} {}:{}", record.year, record.month, record.day, record.hour, record.minute),
            });
        }
        records.push(record);
    }

    if records.is_empty() {
        return Err(ResourceLoadError::Empty(source.to_string()));
    }
    Ok(SolarResource::new(metadata, records))
}

pub fn load_resource(path: &Path, location: &str) -> Result<SolarResource, ResourceLoadError> {
    load_resource_with_site(path, location, None)
}

pub fn load_resource_with_site(
    path: &Path,
    location: &str,
    site: Option<&ResourceMetadata>,
) -> Result<SolarResource, ResourceLoadError> {
    let _timing = logging::start_timing("load_resource",
        OperationCategory::FileIO { subcategory: FileIOType::DataLoad });

    let text = fs::read_to_string(path)?;
    let resource = parse_resource(&text, &path.display().to_string(), location, site)?;
    info!(
        "Loaded {} records for {} from {} (lat {:.3}, lon {:.3}, tz {})",
        resource.len(),
        location,
        path.display(),
        resource.metadata.latitude,
        resource.metadata.longitude,
        resource.metadata.time_zone
    );
    Ok(resource)
}

/// Merges several files for one location and orders the records by time.
pub fn concat_resources(parts: Vec<SolarResource>) -> Result<SolarResource, ResourceLoadError> {
    let mut parts = parts.into_iter();
    let mut merged = parts
        .next()
        .ok_or_else(|| ResourceLoadError::Empty("no resource files given".to_string()))?;
    for part in parts {
        merged.records.extend(part.records);
    }
    merged.sort_by_timestamp();
    Ok(merged)
}

/// Loads and concatenates every resource file configured for a country.
pub fn load_country(country: &Country) -> Result<SolarResource, ResourceLoadError> {
    let site = country.site_metadata();
    let parts = country
        .resource_files
        .iter()
        .map(|path| load_resource_with_site(path, &country.name, site.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    concat_resources(parts)
}
