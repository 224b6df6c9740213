pub mod aggregate;
pub mod cache;
pub mod geometry;
pub mod keys;
pub mod loader;
pub mod scale;

use crate::config::ResolvedConfig;
use crate::errors::AppResult;
use crate::models::{Dataset, DatasetSource, DepartmentAggregate};
use crate::utils::format_duration;
use std::time::Instant;
use tracing::{info, warn};

use aggregate::{join_and_aggregate, restrict_to_latest_year};
use geometry::{dissolve_by_department, resolve_geometry, simplify_departments};
use loader::{ensure_source_exists, load_municipalities, load_sales};

/// Department aggregates computed from the raw boundary and sales files.
#[derive(Debug, Clone)]
pub struct ComputedDepartments {
    pub departments: Vec<DepartmentAggregate>,
    pub latest_year: Option<i32>,
}

/// Runs the full ETL pass over the raw files.
///
/// # Workflow
///
/// 1. Loads municipalities (GeoJSON) and sales (CSV); both files must exist
/// 2. Keeps only the sales of the latest year present
/// 3. Inner-joins those sales to municipalities on the padded DANE code and
///    sums the measures per department
/// 4. Dissolves municipality polygons per department and attaches them
///
/// Aggregation never sees simplified geometry; simplification happens later,
/// only for the render payload.
///
/// # Errors
///
/// Returns `MissingSource` when either input file is absent, and a parse error
/// when a file cannot be read.
pub fn compute_from_sources(config: &ResolvedConfig) -> AppResult<ComputedDepartments> {
    ensure_source_exists(&config.boundaries_path)?;
    ensure_source_exists(&config.sales_path)?;

    let municipalities = load_municipalities(&config.boundaries_path)?;
    let (latest_year, sales) = restrict_to_latest_year(load_sales(&config.sales_path)?);

    let totals = join_and_aggregate(&municipalities, &sales);
    let dissolved = dissolve_by_department(&municipalities);
    let departments = resolve_geometry(totals, &dissolved);

    Ok(ComputedDepartments {
        departments,
        latest_year,
    })
}

/// Builds the read-only dataset the dashboard serves.
///
/// When `prefer_cache` is set and the snapshot exists it is loaded instead of
/// recomputing. A snapshot that fails to load is logged and the raw files are
/// used instead. After a recompute the snapshot is rewritten if `write_cache`
/// is set.
pub fn load_dataset(config: &ResolvedConfig) -> AppResult<Dataset> {
    let start = Instant::now();

    let (departments, latest_year, source) = match try_snapshot(config) {
        Some(departments) => (departments, None, DatasetSource::Snapshot),
        None => {
            let computed = compute_from_sources(config)?;
            if config.write_cache {
                if let Err(e) = cache::write_snapshot(&config.cache_path, &computed.departments) {
                    warn!(error = %e, "Failed to write snapshot; continuing without it");
                }
            }
            (
                computed.departments,
                computed.latest_year,
                DatasetSource::RawFiles,
            )
        }
    };

    if departments.is_empty() {
        warn!("Dataset has no departments; the dashboard will render empty panels");
    }

    let display_geometry = simplify_departments(&departments, config.simplify_tolerance);

    info!(
        source = source.display_name(),
        departments = departments.len(),
        latest_year = ?latest_year,
        elapsed = format_duration(start.elapsed()),
        "Dataset ready"
    );

    Ok(Dataset {
        departments,
        display_geometry,
        latest_year,
        source,
    })
}

fn try_snapshot(config: &ResolvedConfig) -> Option<Vec<DepartmentAggregate>> {
    if !config.prefer_cache {
        info!("Snapshot disabled; computing from raw files");
        return None;
    }
    if !config.cache_path.is_file() {
        info!(
            path = %config.cache_path.display(),
            "No snapshot found; computing from raw files"
        );
        return None;
    }

    match cache::read_snapshot(&config.cache_path) {
        Ok(departments) => Some(departments),
        Err(e) => {
            warn!(
                path = %config.cache_path.display(),
                error = %e,
                "Snapshot unreadable; computing from raw files"
            );
            None
        }
    }
}

/// Recomputes from the raw files and writes the snapshot.
///
/// Returns the number of departments written.
pub fn build_snapshot(config: &ResolvedConfig) -> AppResult<usize> {
    let start = Instant::now();
    let computed = compute_from_sources(config)?;
    cache::write_snapshot(&config.cache_path, &computed.departments)?;

    info!(
        departments = computed.departments.len(),
        elapsed = format_duration(start.elapsed()),
        "Snapshot rebuilt"
    );

    Ok(computed.departments.len())
}
