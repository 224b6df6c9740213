use crate::constants::{
    DEFAULT_BIND_ADDRESS, DEFAULT_PORT, DEFAULT_SIMPLIFY_TOLERANCE, DEFAULT_TOP_N,
};
use crate::errors::{AppError, AppResult};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Resolved configuration with all values filled in (no Options).
///
/// Both the `serve` and `toml` subcommands end up with one of these; the TOML
/// loader deserializes into it directly and missing keys fall back to the
/// defaults below.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolvedConfig {
    /// Municipality boundaries as a GeoJSON FeatureCollection
    pub boundaries_path: PathBuf,
    /// Sales CSV, one row per municipality per period
    pub sales_path: PathBuf,
    /// Pre-aggregated department snapshot (Parquet with WKB geometry)
    pub cache_path: PathBuf,

    // Pipeline
    /// Load the snapshot instead of recomputing when it exists.
    pub prefer_cache: bool,
    /// Write the snapshot after a recompute from raw sources.
    pub write_cache: bool,
    /// Simplification tolerance for the rendered geometry, in coordinate units.
    pub simplify_tolerance: f64,
    /// Number of departments shown in the charts and the table.
    pub top_n: usize,

    // Server
    pub bind_address: String,
    pub port: u16,
    /// Reject unknown metric codes with an error instead of falling back to
    /// the default metric. Defaults to on in debug builds.
    pub strict_metrics: bool,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            boundaries_path: PathBuf::from("data/MGN_MPIO_POLITICO.geojson"),
            sales_path: PathBuf::from("data/ventas.csv"),
            cache_path: PathBuf::from("data/mapa_dep.parquet"),
            prefer_cache: true,
            write_cache: false,
            simplify_tolerance: DEFAULT_SIMPLIFY_TOLERANCE,
            top_n: DEFAULT_TOP_N,
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            strict_metrics: cfg!(debug_assertions),
        }
    }
}

impl ResolvedConfig {
    /// Loads and validates configuration from a TOML file.
    ///
    /// Unknown keys are rejected so typos are not silently ignored.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the TOML is malformed, unknown keys are present,
    /// or a numeric setting is out of range.
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let contents = fs::read_to_string(path)?;
        let config: ResolvedConfig = toml::from_str(&contents)
            .map_err(|e| AppError::InvalidInput(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Checks the numeric settings that have no sensible zero/negative meaning.
    pub fn validate(&self) -> AppResult<()> {
        if !self.simplify_tolerance.is_finite() || self.simplify_tolerance <= 0.0 {
            return Err(AppError::InvalidInput(
                "Simplify tolerance must be a positive number".into(),
            ));
        }
        if self.top_n == 0 {
            return Err(AppError::InvalidInput("top_n must be greater than 0".into()));
        }
        if self.port == 0 {
            return Err(AppError::InvalidInput("Port must be greater than 0".into()));
        }
        Ok(())
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
