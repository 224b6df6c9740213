//! Tests for config module

use gnv_dashboard::config::ResolvedConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
fn test_config_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("gnv.toml");

    let config_content = r#"
boundaries_path = "custom/municipios.geojson"
sales_path = "custom/ventas.csv"
cache_path = "custom/cache/mapa_dep.parquet"
prefer_cache = false
write_cache = true
simplify_tolerance = 0.005
top_n = 5
bind_address = "0.0.0.0"
port = 8080
strict_metrics = false
"#;

    fs::write(&config_path, config_content).unwrap();

    let config = ResolvedConfig::from_toml_file(&config_path).unwrap();

    assert_eq!(
        config.boundaries_path,
        PathBuf::from("custom/municipios.geojson")
    );
    assert_eq!(config.sales_path, PathBuf::from("custom/ventas.csv"));
    assert_eq!(
        config.cache_path,
        PathBuf::from("custom/cache/mapa_dep.parquet")
    );
    assert!(!config.prefer_cache);
    assert!(config.write_cache);
    assert_eq!(config.simplify_tolerance, 0.005);
    assert_eq!(config.top_n, 5);
    assert!(!config.strict_metrics);
    assert_eq!(config.listen_address(), "0.0.0.0:8080");
}

#[test]
fn test_config_partial() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("gnv.toml");

    fs::write(&config_path, "top_n = 3\n").unwrap();

    let config = ResolvedConfig::from_toml_file(&config_path).unwrap();

    // Should use config value for top_n
    assert_eq!(config.top_n, 3);
    // Should use defaults for other values
    assert!(config.prefer_cache);
    assert_eq!(config.port, 8050);
    assert_eq!(config.cache_path, PathBuf::from("data/mapa_dep.parquet"));
}

#[test]
fn test_config_invalid_toml() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("gnv.toml");

    fs::write(&config_path, "sales_path = \"ventas.csv\n").unwrap();

    let result = ResolvedConfig::from_toml_file(&config_path);
    assert!(result.is_err());
}

#[test]
fn test_config_wrong_type() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("gnv.toml");

    fs::write(&config_path, "port = \"8050\"\n").unwrap();

    assert!(ResolvedConfig::from_toml_file(&config_path).is_err());
}

#[test]
fn test_config_nonexistent_file() {
    let result = ResolvedConfig::from_toml_file(Path::new("nonexistent.toml"));
    assert!(result.is_err());
}
