use crate::constants::MILLION;
use crate::models::{DepartmentTotals, ScaledMeasures};

pub fn to_millions(value: f64) -> f64 {
    value / MILLION
}

/// Derives the display copies of volume, vehicles and sales, in millions.
///
/// No rounding happens here; the table rounds when it renders.
pub fn scale_totals(totals: &DepartmentTotals) -> ScaledMeasures {
    ScaledMeasures {
        volume_millions: to_millions(totals.volume_supplied),
        vehicles_millions: to_millions(totals.vehicles_served),
        sales_millions: to_millions(totals.sales_count),
    }
}
