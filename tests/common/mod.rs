//! Common test utilities for integration tests

use gnv_dashboard::config::ResolvedConfig;
use std::fs;
use std::path::Path;

/// Four municipalities in three departments. BOGOTÁ has no sales rows.
#[allow(dead_code)]
pub const SAMPLE_BOUNDARIES: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "properties": {"DPTO_CCDGO": "05", "MPIO_CCDGO": "001", "DPTO_CNMBR": "ANTIOQUIA"},
      "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}
    },
    {
      "type": "Feature",
      "properties": {"DPTO_CCDGO": "05", "MPIO_CCDGO": "002", "DPTO_CNMBR": "ANTIOQUIA"},
      "geometry": {"type": "Polygon", "coordinates": [[[1,0],[2,0],[2,1],[1,1],[1,0]]]}
    },
    {
      "type": "Feature",
      "properties": {"DPTO_CCDGO": "25", "MPIO_CCDGO": "001", "DPTO_CNMBR": "CUNDINAMARCA"},
      "geometry": {"type": "Polygon", "coordinates": [[[0,2],[1,2],[1,3],[0,3],[0,2]]]}
    },
    {
      "type": "Feature",
      "properties": {"DPTO_CCDGO": "11", "MPIO_CCDGO": "001", "DPTO_CNMBR": "BOGOTÁ"},
      "geometry": {"type": "Polygon", "coordinates": [[[3,0],[4,0],[4,1],[3,1],[3,0]]]}
    }
  ]
}"#;

/// Sales keyed by DANE code. `5002` lost its leading zero the way spreadsheet
/// exports do; `99999` matches no municipality. Only the 2024 rows are counted.
#[allow(dead_code)]
pub const SAMPLE_SALES: &str = "\
CODIGO_MUNICIPIO_DANE,ANIO_VENTA,CANTIDAD_VOLUMEN_SUMINISTRADO,VEHICULOS_ATENDIDOS,NUMERO_DE_VENTAS,EDS_ACTIVAS
05001,2023,1000000,200000,50000,2
5002,2024,3000000,400000,150000,2
25001,2024,500000,100000,20000,0
99999,2024,10,10,10,1
";

/// Sales whose codes match none of [`SAMPLE_BOUNDARIES`].
#[allow(dead_code)]
pub const UNMATCHED_SALES: &str = "\
CODIGO_MUNICIPIO_DANE,ANIO_VENTA,CANTIDAD_VOLUMEN_SUMINISTRADO,VEHICULOS_ATENDIDOS,NUMERO_DE_VENTAS,EDS_ACTIVAS
99999,2024,10,10,10,1
";

/// Helper function to write a test file, creating parent directories
#[allow(dead_code)]
pub fn write_file(path: &Path, content: &str) {
    let parent = path.parent().unwrap();
    fs::create_dir_all(parent).unwrap();
    fs::write(path, content).unwrap();
}

/// Writes the sample datasets under `dir` and returns a config pointing at them.
///
/// The snapshot is disabled; tests that need it turn it back on.
#[allow(dead_code)]
pub fn sample_config(dir: &Path) -> ResolvedConfig {
    let boundaries_path = dir.join("data").join("municipios.geojson");
    let sales_path = dir.join("data").join("ventas.csv");
    write_file(&boundaries_path, SAMPLE_BOUNDARIES);
    write_file(&sales_path, SAMPLE_SALES);

    ResolvedConfig {
        boundaries_path,
        sales_path,
        cache_path: dir.join("cache").join("mapa_dep.parquet"),
        prefer_cache: false,
        write_cache: false,
        strict_metrics: true,
        ..ResolvedConfig::default()
    }
}

/// Asserts two floats are equal up to a relative tolerance.
#[allow(dead_code)]
pub fn assert_close(actual: f64, expected: f64) {
    let tolerance = 1e-9 * expected.abs().max(1.0);
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected}, got {actual}"
    );
}
