use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use chrono::Local;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{info, warn};
use crate::utils::logging::{self, FileIOType, OperationCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Table,
    Chart,
}

/// A file written during a run, listed in the HTML index.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub title: String,
    pub file_name: String,
    pub kind: ArtifactKind,
}

/// Writes every table and chart of one run into a timestamped directory.
pub struct CsvExporter {
    output_dir: PathBuf,
    timestamp: String,
    verbose_logging: bool,
    artifacts: Mutex<Vec<Artifact>>,
}

impl CsvExporter {
    /// Targets `<output_dir>/<YYYYmmdd_HHMMSS>/`. The directory appears with the first file written.
    pub fn new(output_dir: impl AsRef<Path>, verbose_logging: bool) -> Self {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let full_path = output_dir.as_ref().join(&timestamp);
        Self::in_dir(full_path, timestamp, verbose_logging)
    }

    /// Uses `dir` as-is, without a timestamp subdirectory.
    pub fn in_dir(dir: impl Into<PathBuf>, label: String, verbose_logging: bool) -> Self {
        Self {
            output_dir: dir.into(),
            timestamp: label,
            verbose_logging,
            artifacts: Mutex::new(Vec::new()),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn artifacts(&self) -> Vec<Artifact> {
        self.artifacts.lock().clone()
    }

    fn target(&self, file_name: &str) -> std::io::Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        Ok(self.output_dir.join(file_name))
    }

    fn register(&self, title: &str, file_name: &str, kind: ArtifactKind) {
        let mut artifacts = self.artifacts.lock();
        if !artifacts.iter().any(|a| a.file_name == file_name) {
            artifacts.push(Artifact {
                title: title.to_string(),
                file_name: file_name.to_string(),
                kind,
            });
        }
    }

    /// Serialises `rows` to `<name>.csv`. Nothing is written for an empty table.
    pub fn write_rows<T: Serialize>(&self, name: &str, title: &str, rows: &[T]) -> anyhow::Result<Option<PathBuf>> {
        let _timing = logging::start_timing("write_rows",
            OperationCategory::FileIO { subcategory: FileIOType::ResultsSave });

        if rows.is_empty() {
            warn!("No rows for table '{}', skipping export", name);
            return Ok(None);
        }

        let file_name = format!("{}.csv", name);
        let path = self.target(&file_name)?;
        let mut writer = csv::Writer::from_path(&path)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        self.register(title, &file_name, ArtifactKind::Table);

        if self.verbose_logging {
            info!("Exported {} rows to {}", rows.len(), path.display());
        }
        Ok(Some(path))
    }

    /// Writes an already rendered document (an SVG chart) under `file_name`.
    pub fn write_chart(&self, file_name: &str, title: &str, contents: &str) -> anyhow::Result<PathBuf> {
        let _timing = logging::start_timing("write_chart",
            OperationCategory::FileIO { subcategory: FileIOType::ChartRender });

        let path = self.target(file_name)?;
        let mut file = File::create(&path)?;
        file.write_all(contents.as_bytes())?;
        self.register(title, file_name, ArtifactKind::Chart);

        if self.verbose_logging {
            info!("Saved chart {}", path.display());
        }
        Ok(path)
    }

    /// Writes `index.html` linking every chart and table written so far.
    pub fn write_index(&self, heading: &str) -> anyhow::Result<PathBuf> {
        let path = self.target("index.html")?;
        let mut file = File::create(&path)?;
        let artifacts = self.artifacts();

        writeln!(file, "<!DOCTYPE html>")?;
        writeln!(file, "<html><head><meta charset=\"utf-8\"><title>{}</title>", escape_html(heading))?;
        writeln!(file, "<style>body{{font-family:sans-serif;margin:2em}}img{{max-width:900px;display:block;margin-bottom:2em}}</style>")?;
        writeln!(file, "</head><body>")?;
        writeln!(file, "<h1>{}</h1>", escape_html(heading))?;
        writeln!(file, "<p>Run {}</p>", escape_html(&self.timestamp))?;

        writeln!(file, "<h2>Charts</h2>")?;
        for artifact in artifacts.iter().filter(|a| a.kind == ArtifactKind::Chart) {
            writeln!(file, "<h3>{}</h3>", escape_html(&artifact.title))?;
            writeln!(file, "<img src=\"{}\" alt=\"{}\">", artifact.file_name, escape_html(&artifact.title))?;
        }

        writeln!(file, "<h2>Tables</h2><ul>")?;
        for artifact in artifacts.iter().filter(|a| a.kind == ArtifactKind::Table) {
            writeln!(file, "<li><a href=\"{}\">{}</a></li>", artifact.file_name, escape_html(&artifact.title))?;
        }
        writeln!(file, "</ul></body></html>")?;

        Ok(path)
    }
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Row {
        country: String,
        lcoe: Option<f64>,
    }

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("solarsweep_csv_export_{}_{}", name, std::process::id()))
    }

    #[test]
    fn writes_rows_with_empty_cell_for_missing_values() {
        let dir = scratch_dir("rows");
        let _ = fs::remove_dir_all(&dir);
        let exporter = CsvExporter::in_dir(&dir, "test".to_string(), false);
        assert!(!dir.exists());
        assert!(exporter.write_rows::<Row>("none", "None", &[]).unwrap().is_none());
        assert!(!dir.exists());
        let rows = vec![
            Row { country: "chile".to_string(), lcoe: Some(0.1) },
            Row { country: "espana".to_string(), lcoe: None },
        ];
        let path = exporter.write_rows("lcoe", "LCOE", &rows).unwrap().unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert_eq!(text, "country,lcoe\nchile,0.1\nespana,\n");
        assert!(exporter.write_rows::<Row>("empty", "Empty", &[]).unwrap().is_none());
        assert_eq!(exporter.artifacts().len(), 1);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn index_links_charts_and_tables() {
        let dir = scratch_dir("index");
        let exporter = CsvExporter::in_dir(&dir, "test".to_string(), false);
        exporter.write_chart("a.svg", "A <chart>", "<svg/>").unwrap();
        exporter.write_rows("t", "Table", &[Row { country: "x".to_string(), lcoe: None }]).unwrap();
        let html = fs::read_to_string(exporter.write_index("Run").unwrap()).unwrap();
        assert!(html.contains("<img src=\"a.svg\""));
        assert!(html.contains("A &lt;chart&gt;"));
        assert!(html.contains("<a href=\"t.csv\">Table</a>"));
        let _ = fs::remove_dir_all(dir);
    }
}
