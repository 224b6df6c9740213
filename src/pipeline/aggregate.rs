use crate::models::{DepartmentTotals, MunicipalityRecord, SaleRecord};
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};

/// A sales row matched to the municipality it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRow {
    pub join_key: String,
    pub department_name: String,
    pub volume_supplied: f64,
    pub vehicles_served: f64,
    pub sales_count: f64,
    pub active_stations: f64,
}

/// Neumaier-compensated running sum.
///
/// The result does not depend on the order values are added in, up to
/// rounding well below 1e-6 relative.
#[derive(Debug, Clone, Copy, Default)]
pub struct StableSum {
    sum: f64,
    compensation: f64,
}

impl StableSum {
    pub fn add(&mut self, value: f64) {
        let t = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - t) + value;
        } else {
            self.compensation += (value - t) + self.sum;
        }
        self.sum = t;
    }

    pub fn total(&self) -> f64 {
        self.sum + self.compensation
    }
}

#[derive(Debug, Default)]
struct DepartmentSums {
    volume_supplied: StableSum,
    vehicles_served: StableSum,
    sales_count: StableSum,
    active_stations: StableSum,
}

/// Keeps only the sales of the most recent year present in the data.
///
/// Returns that year with the kept rows. Rows without a year are dropped once
/// any row carries one; if none do, every row is kept and the year is `None`.
pub fn restrict_to_latest_year(sales: Vec<SaleRecord>) -> (Option<i32>, Vec<SaleRecord>) {
    let Some(latest) = sales.iter().filter_map(|s| s.sale_year).max() else {
        warn!(rows = sales.len(), "Sales carry no year; using every row");
        return (None, sales);
    };

    let total = sales.len();
    let kept: Vec<SaleRecord> = sales
        .into_iter()
        .filter(|s| s.sale_year == Some(latest))
        .collect();

    info!(
        year = latest,
        kept = kept.len(),
        dropped = total - kept.len(),
        "Sales restricted to latest year"
    );

    (Some(latest), kept)
}

/// Inner-joins sales rows with municipalities on the five-digit DANE code.
///
/// Sales whose code matches no municipality are dropped, as are municipalities
/// without sales. If the boundary data repeats a code, each sale joins every
/// municipality carrying it.
pub fn inner_join(municipalities: &[MunicipalityRecord], sales: &[SaleRecord]) -> Vec<JoinedRow> {
    let mut by_key: HashMap<String, Vec<&MunicipalityRecord>> =
        HashMap::with_capacity(municipalities.len());
    for municipality in municipalities {
        by_key
            .entry(municipality.join_key())
            .or_default()
            .push(municipality);
    }

    let mut joined = Vec::with_capacity(sales.len());
    let mut unmatched = 0usize;

    for sale in sales {
        let Some(matches) = by_key.get(&sale.municipality_dane_code) else {
            unmatched += 1;
            continue;
        };
        for municipality in matches {
            joined.push(JoinedRow {
                join_key: sale.municipality_dane_code.clone(),
                department_name: municipality.department_name.clone(),
                volume_supplied: sale.volume_supplied,
                vehicles_served: sale.vehicles_served,
                sales_count: sale.sales_count,
                active_stations: sale.active_stations,
            });
        }
    }

    if joined.is_empty() {
        warn!(
            municipalities = municipalities.len(),
            sales = sales.len(),
            "Join produced no rows; check DANE code padding in both datasets"
        );
    } else {
        info!(
            joined = joined.len(),
            unmatched_sales = unmatched,
            "Sales joined to municipalities"
        );
    }

    joined
}

/// Sums the four measures of the joined rows per department name.
///
/// Output is sorted by department name.
pub fn aggregate_by_department(rows: &[JoinedRow]) -> Vec<DepartmentTotals> {
    let mut groups: BTreeMap<&str, DepartmentSums> = BTreeMap::new();

    for row in rows {
        let sums = groups.entry(row.department_name.as_str()).or_default();
        sums.volume_supplied.add(row.volume_supplied);
        sums.vehicles_served.add(row.vehicles_served);
        sums.sales_count.add(row.sales_count);
        sums.active_stations.add(row.active_stations);
    }

    groups
        .into_iter()
        .map(|(name, sums)| DepartmentTotals {
            department_name: name.to_string(),
            volume_supplied: sums.volume_supplied.total(),
            vehicles_served: sums.vehicles_served.total(),
            sales_count: sums.sales_count.total(),
            active_stations: sums.active_stations.total(),
        })
        .collect()
}

/// Join followed by aggregation.
pub fn join_and_aggregate(
    municipalities: &[MunicipalityRecord],
    sales: &[SaleRecord],
) -> Vec<DepartmentTotals> {
    let joined = inner_join(municipalities, sales);
    aggregate_by_department(&joined)
}
