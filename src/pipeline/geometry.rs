use crate::models::{DepartmentAggregate, DepartmentTotals, MunicipalityRecord};
use crate::pipeline::scale::scale_totals;
use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{Area, BooleanOps, LineString, MultiPolygon, Polygon, Simplify};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Unions every municipality polygon into one polygon per department name.
///
/// Departments are dissolved independently, so the work is spread over the
/// rayon pool. Output is keyed and ordered by department name.
pub fn dissolve_by_department(
    municipalities: &[MunicipalityRecord],
) -> BTreeMap<String, MultiPolygon<f64>> {
    let mut groups: BTreeMap<&str, Vec<&MultiPolygon<f64>>> = BTreeMap::new();
    for municipality in municipalities {
        groups
            .entry(municipality.department_name.as_str())
            .or_default()
            .push(&municipality.geometry);
    }

    let dissolved: BTreeMap<String, MultiPolygon<f64>> = groups
        .into_par_iter()
        .map(|(name, parts)| (name.to_string(), union_all(&parts)))
        .collect();

    info!(
        municipalities = municipalities.len(),
        departments = dissolved.len(),
        "Municipality polygons dissolved"
    );

    dissolved
}

fn union_all(parts: &[&MultiPolygon<f64>]) -> MultiPolygon<f64> {
    match parts.split_first() {
        None => MultiPolygon::new(vec![]),
        Some((first, [])) => (*first).clone(),
        Some((first, rest)) => rest
            .iter()
            .fold((*first).clone(), |acc, part| acc.union(*part)),
    }
}

/// Attaches the dissolved polygon and the derived measures to each department.
///
/// Departments without a dissolved polygon are dropped with a warning.
pub fn resolve_geometry(
    totals: Vec<DepartmentTotals>,
    dissolved: &BTreeMap<String, MultiPolygon<f64>>,
) -> Vec<DepartmentAggregate> {
    let mut resolved = Vec::with_capacity(totals.len());

    for department in totals {
        let Some(geometry) = dissolved.get(&department.department_name) else {
            warn!(
                department = %department.department_name,
                "No dissolved geometry for department; row dropped"
            );
            continue;
        };
        resolved.push(DepartmentAggregate {
            volume_per_station: department.volume_per_station(),
            scaled: scale_totals(&department),
            totals: department,
            geometry: geometry.clone(),
        });
    }

    resolved
}

/// Simplifies a polygon for the render payload without introducing
/// self-intersections.
///
/// Each ring is simplified with Ramer-Douglas-Peucker, so no dropped vertex
/// lies farther than `tolerance` from the result. A ring that would collapse
/// or cross itself is kept as it was.
pub fn simplify_for_display(geometry: &MultiPolygon<f64>, tolerance: f64) -> MultiPolygon<f64> {
    geometry
        .iter()
        .map(|polygon| {
            Polygon::new(
                simplify_ring(polygon.exterior(), tolerance),
                polygon
                    .interiors()
                    .iter()
                    .map(|ring| simplify_ring(ring, tolerance))
                    .collect(),
            )
        })
        .collect()
}

fn simplify_ring(ring: &LineString<f64>, tolerance: f64) -> LineString<f64> {
    let simplified = ring.simplify(&tolerance);
    if is_degenerate(&simplified) || self_intersects(&simplified) {
        ring.clone()
    } else {
        simplified
    }
}

fn is_degenerate(ring: &LineString<f64>) -> bool {
    ring.0.len() < 4 || Polygon::new(ring.clone(), vec![]).unsigned_area() == 0.0
}

// Segments i and i + 1 (and the last and first) share a vertex; anything more
// than that shared point is a crossing.
fn self_intersects(ring: &LineString<f64>) -> bool {
    let segments: Vec<_> = ring.lines().collect();
    let n = segments.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            match line_intersection(segments[i], segments[j]) {
                None => {}
                Some(LineIntersection::SinglePoint { .. }) if adjacent => {}
                Some(_) => return true,
            }
        }
    }
    false
}

/// Simplifies every department polygon, keeping the input order.
pub fn simplify_departments(
    departments: &[DepartmentAggregate],
    tolerance: f64,
) -> Vec<MultiPolygon<f64>> {
    departments
        .par_iter()
        .map(|d| simplify_for_display(&d.geometry, tolerance))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, CoordsIter, EuclideanDistance};

    fn square(x: f64, y: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: x, y: y),
            (x: x + size, y: y),
            (x: x + size, y: y + size),
            (x: x, y: y + size),
            (x: x, y: y),
        ]])
    }

    fn municipality(code: &str, name: &str, geometry: MultiPolygon<f64>) -> MunicipalityRecord {
        MunicipalityRecord {
            department_code: "05".to_string(),
            municipality_code: code.to_string(),
            department_name: name.to_string(),
            geometry,
        }
    }

    fn totals(name: &str) -> DepartmentTotals {
        DepartmentTotals {
            department_name: name.to_string(),
            volume_supplied: 2_000_000.0,
            vehicles_served: 1_000_000.0,
            sales_count: 500_000.0,
            active_stations: 4.0,
        }
    }

    #[test]
    fn test_dissolve_unions_adjacent_municipalities() {
        let municipalities = vec![
            municipality("001", "ANTIOQUIA", square(0.0, 0.0, 1.0)),
            municipality("002", "ANTIOQUIA", square(1.0, 0.0, 1.0)),
            municipality("001", "CALDAS", square(5.0, 5.0, 1.0)),
        ];

        let dissolved = dissolve_by_department(&municipalities);
        assert_eq!(dissolved.len(), 2);
        let antioquia = &dissolved["ANTIOQUIA"];
        assert!((antioquia.unsigned_area() - 2.0).abs() < 1e-9);
        assert!((dissolved["CALDAS"].unsigned_area() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_resolve_drops_departments_without_geometry() {
        let mut dissolved = BTreeMap::new();
        dissolved.insert("ANTIOQUIA".to_string(), square(0.0, 0.0, 1.0));

        let resolved = resolve_geometry(vec![totals("ANTIOQUIA"), totals("VAUPÉS")], &dissolved);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].name(), "ANTIOQUIA");
        assert_eq!(resolved[0].volume_per_station, Some(500_000.0));
        assert_eq!(resolved[0].scaled.volume_millions, 2.0);
    }

    fn noisy_square() -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 0.25, y: 0.0001),
            (x: 0.5, y: 0.0),
            (x: 0.75, y: -0.0001),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.5, y: 1.0001),
            (x: 0.0, y: 1.0),
            (x: 0.0, y: 0.0),
        ]])
    }

    #[test]
    fn test_simplify_removes_near_collinear_vertices() {
        let original = noisy_square();
        let simplified = simplify_for_display(&original, 0.01);
        assert!(simplified.coords_count() < original.coords_count());
        assert_eq!(simplified.coords_count(), 5);
    }

    fn spiked_square() -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.55, y: 1.0),
            (x: 0.5, y: 0.95),
            (x: 0.45, y: 1.0),
            (x: 0.0, y: 1.0),
            (x: 0.0, y: 0.0),
        ]])
    }

    #[test]
    fn test_simplify_stays_within_tolerance() {
        let tolerance = 0.01;
        for original in [spiked_square(), noisy_square()] {
            let simplified = simplify_for_display(&original, tolerance);
            let boundary = simplified.0[0].exterior();
            for point in original.0[0].exterior().points() {
                let deviation = point.euclidean_distance(boundary);
                assert!(
                    deviation <= tolerance + 1e-12,
                    "vertex {point:?} is {deviation} away"
                );
            }
        }
        // the spike tip is farther than the tolerance, so it survives
        assert_eq!(simplify_for_display(&spiked_square(), tolerance).coords_count(), 8);
    }

    #[test]
    fn test_simplify_keeps_ring_that_would_collapse() {
        let sliver = MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 0.5, y: 0.001),
            (x: 0.0, y: 0.0),
        ]]);
        assert_eq!(simplify_for_display(&sliver, 0.01), sliver);
    }

    #[test]
    fn test_self_intersection_is_detected() {
        let bowtie = LineString::from(vec![(0.0, 0.0), (1.0, 1.0), (1.0, 0.0), (0.0, 1.0), (0.0, 0.0)]);
        let square = LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)]);
        assert!(self_intersects(&bowtie));
        assert!(!self_intersects(&square));
    }

    #[test]
    fn test_simplify_is_idempotent_in_vertex_count() {
        let once = simplify_for_display(&noisy_square(), 0.01);
        let twice = simplify_for_display(&once, 0.01);
        assert_eq!(once.coords_count(), twice.coords_count());
    }

    #[test]
    fn test_simplify_keeps_input_order() {
        let mut dissolved = BTreeMap::new();
        dissolved.insert("A".to_string(), noisy_square());
        dissolved.insert("B".to_string(), square(3.0, 3.0, 1.0));
        let resolved = resolve_geometry(vec![totals("A"), totals("B")], &dissolved);

        let display = simplify_departments(&resolved, 0.01);
        assert_eq!(display.len(), 2);
        assert_eq!(display[1].coords_count(), 5);
        // analytical geometry is untouched
        assert_eq!(resolved[0].geometry.coords_count(), 9);
    }
}
