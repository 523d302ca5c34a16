use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use crate::config::constants::FALLBACK_COLOR;
use crate::models::resource::ResourceMetadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hemisphere {
    Northern,
    Southern,
}

impl Hemisphere {
    /// Equator-facing array azimuth (degrees clockwise from north).
    pub fn pv_azimuth(&self) -> f64 {
        match self {
            Hemisphere::Northern => 180.0,
            Hemisphere::Southern => 0.0,
        }
    }

    pub fn from_latitude(latitude: f64) -> Self {
        if latitude < 0.0 { Hemisphere::Southern } else { Hemisphere::Northern }
    }
}

/// Site metadata used when a resource file has no preamble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteOverrides {
    pub latitude: f64,
    pub longitude: f64,
    pub time_zone: f64,
    #[serde(default)]
    pub elevation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub name: String,
    /// One or more resource files (e.g. one per year); they are concatenated.
    pub resource_files: Vec<PathBuf>,
    pub hemisphere: Hemisphere,
    #[serde(default)]
    pub pv_color: Option<String>,
    #[serde(default)]
    pub csp_color: Option<String>,
    #[serde(default)]
    pub site: Option<SiteOverrides>,
}

impl Country {
    pub fn new(name: &str, resource_file: impl Into<PathBuf>, hemisphere: Hemisphere) -> Self {
        Self {
            name: name.to_string(),
            resource_files: vec![resource_file.into()],
            hemisphere,
            pv_color: None,
            csp_color: None,
            site: None,
        }
    }

    pub fn pv_color(&self) -> &str {
        self.pv_color.as_deref().unwrap_or(FALLBACK_COLOR)
    }

    pub fn csp_color(&self) -> &str {
        self.csp_color.as_deref().unwrap_or(FALLBACK_COLOR)
    }

    pub fn site_metadata(&self) -> Option<ResourceMetadata> {
        self.site.as_ref().map(|site| ResourceMetadata {
            location: self.name.clone(),
            latitude: site.latitude,
            longitude: site.longitude,
            time_zone: site.time_zone,
            elevation: site.elevation,
        })
    }
}

/// The three study countries, with files expected under `data/`.
pub fn default_countries() -> Vec<Country> {
    let entry = |name: &str, file: &str, hemisphere, pv: &str, csp: &str| Country {
        pv_color: Some(pv.to_string()),
        csp_color: Some(csp.to_string()),
        ..Country::new(name, PathBuf::from("data").join(file), hemisphere)
    };
    vec![
        entry("chile", "chile.csv", Hemisphere::Southern, "deeppink", "red"),
        entry("australia", "australia.csv", Hemisphere::Southern, "mediumpurple", "blue"),
        entry("espana", "espana.csv", Hemisphere::Northern, "turquoise", "green"),
    ]
}
