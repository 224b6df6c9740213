use crate::constants::*;
use crate::errors::{AppError, AppResult};
use crate::models::{MunicipalityRecord, SaleRecord};
use crate::pipeline::keys::normalize_dane_code;
use geo::{Geometry, MultiPolygon};
use geojson::{Feature, FeatureCollection, JsonValue};
use polars::prelude::*;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Fails with `MissingSource` when `path` is not an existing file.
pub fn ensure_source_exists(path: &Path) -> AppResult<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(AppError::MissingSource(path.to_path_buf()))
    }
}

/// Reads the municipality boundary dataset.
///
/// The file must be a GeoJSON `FeatureCollection` whose features carry the
/// department code, municipality code and department name properties and a
/// Polygon or MultiPolygon geometry. Codes may be JSON strings or numbers.
///
/// Features missing any of those are skipped and counted in a warning.
///
/// # Errors
///
/// Returns `MissingSource` if the file does not exist, and a parse or geometry
/// error if the document is not a valid FeatureCollection.
pub fn load_municipalities(path: &Path) -> AppResult<Vec<MunicipalityRecord>> {
    ensure_source_exists(path)?;

    let contents = fs::read_to_string(path)
        .map_err(|e| AppError::IoError(format!("Failed to read {}: {e}", path.display())))?;
    let collection: FeatureCollection = contents.parse()?;

    let total = collection.features.len();
    let mut records = Vec::with_capacity(total);
    let mut skipped = 0usize;

    for feature in collection.features {
        match municipality_from_feature(feature) {
            Ok(record) => records.push(record),
            Err(e) => {
                skipped += 1;
                warn!(error = %e, "Skipping boundary feature");
            }
        }
    }

    info!(
        path = %path.display(),
        features = total,
        municipalities = records.len(),
        skipped = skipped,
        "Boundary dataset loaded"
    );

    Ok(records)
}

fn municipality_from_feature(feature: Feature) -> AppResult<MunicipalityRecord> {
    let department_code = property_text(&feature, DEPARTMENT_CODE_FIELD)?;
    let municipality_code = property_text(&feature, MUNICIPALITY_CODE_FIELD)?;
    let department_name = property_text(&feature, DEPARTMENT_NAME_FIELD)?;

    let geometry = feature.geometry.ok_or_else(|| {
        AppError::GeometryError(format!(
            "Feature {department_code}{municipality_code} has no geometry"
        ))
    })?;

    Ok(MunicipalityRecord {
        department_code,
        municipality_code,
        department_name,
        geometry: to_multi_polygon(geometry.value)?,
    })
}

/// Converts a GeoJSON geometry value into a MultiPolygon.
///
/// Polygons are wrapped; any other geometry type is an error.
pub fn to_multi_polygon(value: geojson::Value) -> AppResult<MultiPolygon<f64>> {
    match Geometry::<f64>::try_from(value)? {
        Geometry::Polygon(polygon) => Ok(MultiPolygon::new(vec![polygon])),
        Geometry::MultiPolygon(multi) => Ok(multi),
        other => Err(AppError::GeometryError(format!(
            "Expected Polygon or MultiPolygon, found {}",
            geometry_kind(&other)
        ))),
    }
}

fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

fn property_text(feature: &Feature, key: &str) -> AppResult<String> {
    match feature.property(key) {
        Some(JsonValue::String(text)) => Ok(text.trim().to_string()),
        Some(JsonValue::Number(number)) => {
            if let Some(int) = number.as_u64() {
                Ok(int.to_string())
            } else {
                match number.as_f64() {
                    Some(float) if float.fract() == 0.0 && float >= 0.0 => {
                        Ok(format!("{float:.0}"))
                    }
                    _ => Err(AppError::InvalidInput(format!(
                        "Property {key} is not a whole number: {number}"
                    ))),
                }
            }
        }
        Some(other) => Err(AppError::InvalidInput(format!(
            "Property {key} has unexpected value {other}"
        ))),
        None => Err(AppError::InvalidInput(format!("Missing property {key}"))),
    }
}

/// Reads the sales CSV.
///
/// The DANE code column is kept as text and padded to five digits. Measures
/// are parsed as floats; null or unparseable values count as zero, matching
/// how the totals are later summed. Rows without a DANE code are dropped.
///
/// # Errors
///
/// Returns `MissingSource` if the file does not exist, and `ParseError` if the
/// CSV cannot be read or a required column is absent.
pub fn load_sales(path: &Path) -> AppResult<Vec<SaleRecord>> {
    ensure_source_exists(path)?;

    // Every column is read as text and cast per column below, so codes keep
    // their leading zeros and a late decimal cannot break an inferred integer.
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
        .map_err(|e| AppError::ParseError(format!("Failed to read {}: {e}", path.display())))?;

    let sales = sales_from_dataframe(&df)?;

    info!(
        path = %path.display(),
        rows = df.height(),
        sales = sales.len(),
        "Sales dataset loaded"
    );

    Ok(sales)
}

/// Converts a sales DataFrame into records.
///
/// Split out from [`load_sales`] so in-memory frames can be converted as well.
pub fn sales_from_dataframe(df: &DataFrame) -> AppResult<Vec<SaleRecord>> {
    let codes = text_column(df, DANE_CODE_COLUMN)?;
    let volumes = float_column(df, VOLUME_COLUMN)?;
    let vehicles = float_column(df, VEHICLES_COLUMN)?;
    let sales = float_column(df, SALES_COLUMN)?;
    let stations = float_column(df, STATIONS_COLUMN)?;
    let years = year_column(df)?;

    let mut records = Vec::with_capacity(df.height());
    let mut missing_codes = 0usize;

    for (i, code) in codes.into_iter().enumerate() {
        let Some(code) = code else {
            missing_codes += 1;
            continue;
        };
        records.push(SaleRecord {
            municipality_dane_code: normalize_dane_code(&code),
            volume_supplied: volumes[i],
            vehicles_served: vehicles[i],
            sales_count: sales[i],
            active_stations: stations[i],
            sale_year: years[i],
        });
    }

    if missing_codes > 0 {
        warn!(rows = missing_codes, "Sales rows without a DANE code dropped");
    }

    Ok(records)
}

fn required_column<'a>(df: &'a DataFrame, name: &str) -> AppResult<&'a Series> {
    df.column(name)
        .map_err(|_| AppError::ParseError(format!("Sales dataset is missing column {name}")))
}

fn text_column(df: &DataFrame, name: &str) -> AppResult<Vec<Option<String>>> {
    let series = required_column(df, name)?.cast(&DataType::String)?;
    let values = series
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
        .collect();
    Ok(values)
}

fn float_column(df: &DataFrame, name: &str) -> AppResult<Vec<f64>> {
    let series = required_column(df, name)?.cast(&DataType::Float64)?;
    let values = series
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(0.0))
        .collect();
    Ok(values)
}

fn year_column(df: &DataFrame) -> AppResult<Vec<Option<i32>>> {
    let series = required_column(df, YEAR_COLUMN)?.cast(&DataType::Int32)?;
    let values = series.i32()?.into_iter().collect();
    Ok(values)
}
