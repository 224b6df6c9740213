use crate::constants::*;
use crate::errors::{AppError, AppResult};
use crate::models::{DepartmentAggregate, DepartmentTotals};
use crate::pipeline::scale::scale_totals;
use geo::{Geometry, MultiPolygon};
use geozero::wkb::Wkb;
use geozero::{CoordDimensions, ToGeo, ToWkb};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::Path;
use tracing::info;

/// Encodes a department polygon as little-endian WKB.
pub fn encode_wkb(geometry: &MultiPolygon<f64>) -> AppResult<Vec<u8>> {
    let bytes = Geometry::MultiPolygon(geometry.clone()).to_wkb(CoordDimensions::xy())?;
    Ok(bytes)
}

/// Decodes WKB into a MultiPolygon, wrapping plain polygons.
pub fn decode_wkb(bytes: &[u8]) -> AppResult<MultiPolygon<f64>> {
    match Wkb(bytes.to_vec()).to_geo()? {
        Geometry::MultiPolygon(multi) => Ok(multi),
        Geometry::Polygon(polygon) => Ok(MultiPolygon::new(vec![polygon])),
        _ => Err(AppError::GeometryError(
            "Snapshot geometry is not a polygon".into(),
        )),
    }
}

/// Builds the snapshot DataFrame: department name, the four sums and WKB geometry.
fn departments_to_dataframe(departments: &[DepartmentAggregate]) -> AppResult<DataFrame> {
    let len = departments.len();
    let mut names = Vec::with_capacity(len);
    let mut volumes = Vec::with_capacity(len);
    let mut vehicles = Vec::with_capacity(len);
    let mut sales = Vec::with_capacity(len);
    let mut stations = Vec::with_capacity(len);
    let mut geometries = Vec::with_capacity(len);

    for department in departments {
        names.push(department.totals.department_name.as_str());
        volumes.push(department.totals.volume_supplied);
        vehicles.push(department.totals.vehicles_served);
        sales.push(department.totals.sales_count);
        stations.push(department.totals.active_stations);
        geometries.push(encode_wkb(&department.geometry)?);
    }
    let geometry_refs: Vec<&[u8]> = geometries.iter().map(Vec::as_slice).collect();

    DataFrame::new(vec![
        Series::new(DEPARTMENT_NAME_FIELD, names),
        Series::new(VOLUME_COLUMN, volumes),
        Series::new(VEHICLES_COLUMN, vehicles),
        Series::new(SALES_COLUMN, sales),
        Series::new(STATIONS_COLUMN, stations),
        BinaryChunked::from_slice(GEOMETRY_COLUMN, &geometry_refs).into_series(),
    ])
    .map_err(|e| AppError::CacheError(format!("Failed to create DataFrame: {e}")))
}

/// Writes the department snapshot as Parquet.
///
/// Parent directories are created as needed.
pub fn write_snapshot(path: &Path, departments: &[DepartmentAggregate]) -> AppResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::IoError(format!("Failed to create cache directory: {e}")))?;
    }

    let mut df = departments_to_dataframe(departments)?;
    let mut file = File::create(path).map_err(|e| {
        AppError::IoError(format!("Failed to create snapshot {}: {e}", path.display()))
    })?;

    ParquetWriter::new(&mut file)
        .finish(&mut df)
        .map_err(|e| AppError::CacheError(format!("Failed to write snapshot: {e}")))?;

    info!(
        path = %path.display(),
        departments = departments.len(),
        "Snapshot written"
    );

    Ok(())
}

/// Reads a department snapshot written by [`write_snapshot`].
///
/// Derived measures (volume per station, millions) are recomputed from the
/// stored sums. The result is sorted by department name.
pub fn read_snapshot(path: &Path) -> AppResult<Vec<DepartmentAggregate>> {
    let file = File::open(path).map_err(|e| {
        AppError::IoError(format!("Failed to open snapshot {}: {e}", path.display()))
    })?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| AppError::CacheError(format!("Failed to read snapshot: {e}")))?;

    let mut departments = departments_from_dataframe(&df)?;
    departments.sort_by(|a, b| a.name().cmp(b.name()));

    info!(
        path = %path.display(),
        departments = departments.len(),
        "Snapshot loaded"
    );

    Ok(departments)
}

fn departments_from_dataframe(df: &DataFrame) -> AppResult<Vec<DepartmentAggregate>> {
    let names = snapshot_column(df, DEPARTMENT_NAME_FIELD)?.str()?;
    let volumes = sum_column(df, VOLUME_COLUMN)?;
    let vehicles = sum_column(df, VEHICLES_COLUMN)?;
    let sales = sum_column(df, SALES_COLUMN)?;
    let stations = sum_column(df, STATIONS_COLUMN)?;
    let geometries = snapshot_column(df, GEOMETRY_COLUMN)?.binary()?;

    let mut departments = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let name = names
            .get(i)
            .ok_or_else(|| AppError::CacheError(format!("Row {i} has no department name")))?;
        let wkb = geometries
            .get(i)
            .ok_or_else(|| AppError::CacheError(format!("Row {i} has no geometry")))?;

        let totals = DepartmentTotals {
            department_name: name.to_string(),
            volume_supplied: volumes[i],
            vehicles_served: vehicles[i],
            sales_count: sales[i],
            active_stations: stations[i],
        };
        departments.push(DepartmentAggregate {
            volume_per_station: totals.volume_per_station(),
            scaled: scale_totals(&totals),
            totals,
            geometry: decode_wkb(wkb)?,
        });
    }

    Ok(departments)
}

/// Sums may be stored as integers by other producers; they are read as floats.
fn sum_column(df: &DataFrame, name: &str) -> AppResult<Vec<f64>> {
    let series = snapshot_column(df, name)?.cast(&DataType::Float64)?;
    let values = series
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(0.0))
        .collect();
    Ok(values)
}

fn snapshot_column<'a>(df: &'a DataFrame, name: &str) -> AppResult<&'a Series> {
    df.column(name)
        .map_err(|_| AppError::CacheError(format!("Snapshot is missing column {name}")))
}
