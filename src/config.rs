use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogError, Expansion, SlotCatalog, SlotDefinition};
use crate::engine::{Engine, StatusSet};
use crate::limits::CATALOG_VERSION;
use crate::model::{BookingStatus, DEFAULT_TZ};

/// The catalog document as written in TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Statuses that consume capacity. Defaults to confirmed + executing.
    #[serde(default)]
    pub occupying_statuses: Option<Vec<BookingStatus>>,
    pub slots: Vec<SlotDefinition>,
    #[serde(default)]
    pub expansions: Vec<Expansion>,
}

fn default_version() -> u32 {
    CATALOG_VERSION
}

fn default_timezone() -> String {
    DEFAULT_TZ.name().to_string()
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    UnsupportedVersion(u32),
    UnknownTimeZone(String),
    Catalog(CatalogError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            ConfigError::Parse(e) => write!(f, "failed to parse catalog: {e}"),
            ConfigError::UnsupportedVersion(v) => {
                write!(f, "catalog version {v} is newer than supported version {CATALOG_VERSION}")
            }
            ConfigError::UnknownTimeZone(tz) => write!(f, "unknown time zone: {tz}"),
            ConfigError::Catalog(e) => write!(f, "invalid catalog: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Catalog(e) => Some(e),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl From<CatalogError> for ConfigError {
    fn from(e: CatalogError) -> Self {
        ConfigError::Catalog(e)
    }
}

/// A validated catalog with the settings every query needs alongside it.
#[derive(Debug, Clone)]
pub struct Config {
    pub version: u32,
    pub timezone: Tz,
    pub occupying: StatusSet,
    pub catalog: SlotCatalog,
}

impl Config {
    pub fn from_document(doc: CatalogDocument) -> Result<Self, ConfigError> {
        if doc.version > CATALOG_VERSION {
            return Err(ConfigError::UnsupportedVersion(doc.version));
        }
        let timezone: Tz = doc
            .timezone
            .trim()
            .parse()
            .map_err(|_| ConfigError::UnknownTimeZone(doc.timezone.clone()))?;
        let occupying = match doc.occupying_statuses {
            Some(statuses) => StatusSet::new(statuses),
            None => StatusSet::confirmed_and_executing(),
        };
        let catalog = SlotCatalog::new(doc.slots, doc.expansions)?;
        Ok(Self {
            version: doc.version,
            timezone,
            occupying,
            catalog,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let doc: CatalogDocument = toml::from_str(content)?;
        Self::from_document(doc)
    }

    pub fn engine(&self) -> Engine<'_, StatusSet> {
        Engine::new(&self.catalog, self.occupying.clone())
    }
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Config::from_toml(&content)
}
