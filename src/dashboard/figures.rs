use crate::constants::{DEPARTMENT_NAME_FIELD, NO_DATA_LABEL};
use crate::models::{Dataset, DepartmentAggregate, Metric};
use crate::utils::round_two_decimals;
use geojson::{Feature, FeatureCollection, Geometry};
use serde::Serialize;
use std::cmp::Ordering;

/// Choropleth payload handed to the browser-side plotting library.
///
/// `locations[i]` matches the `DPTO_CNMBR` property of one feature in
/// `geojson`, and `values[i]` is its metric value (`null` for "no data").
#[derive(Debug, Clone, Serialize)]
pub struct MapFigure {
    pub metric: Metric,
    pub label: &'static str,
    pub feature_id_key: String,
    pub geojson: FeatureCollection,
    pub locations: Vec<String>,
    pub values: Vec<Option<f64>>,
    pub color_scale: &'static str,
    pub projection: &'static str,
}

impl MapFigure {
    /// Builds the map for `metric` from the simplified department polygons.
    pub fn build(dataset: &Dataset, metric: Metric) -> Self {
        let features = dataset
            .departments
            .iter()
            .zip(&dataset.display_geometry)
            .map(|(department, geometry)| {
                let mut feature = Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(geojson::Value::from(geometry))),
                    id: None,
                    properties: None,
                    foreign_members: None,
                };
                feature.set_property(DEPARTMENT_NAME_FIELD, department.name());
                feature
            })
            .collect::<FeatureCollection>();

        Self {
            metric,
            label: metric.label(),
            feature_id_key: format!("properties.{DEPARTMENT_NAME_FIELD}"),
            geojson: features,
            locations: dataset
                .departments
                .iter()
                .map(|d| d.name().to_string())
                .collect(),
            values: dataset
                .departments
                .iter()
                .map(|d| metric.value(d))
                .collect(),
            color_scale: "Viridis",
            projection: "mercator",
        }
    }
}

/// One bar chart: departments on x, a scaled measure on y.
#[derive(Debug, Clone, Serialize)]
pub struct BarChart {
    pub title: String,
    pub y_label: &'static str,
    pub color: &'static str,
    pub x: Vec<String>,
    pub y: Vec<f64>,
}

impl BarChart {
    fn top_by(dataset: &Dataset, metric: Metric, top_n: usize, title: String, color: &'static str) -> Self {
        let ranked = ranked_by(&dataset.departments, metric, top_n);
        Self {
            title,
            y_label: metric.code(),
            color,
            x: ranked.iter().map(|(d, _)| d.name().to_string()).collect(),
            y: ranked.iter().map(|(_, v)| *v).collect(),
        }
    }
}

/// The charts tab: top departments by scaled volume and by scaled vehicles.
#[derive(Debug, Clone, Serialize)]
pub struct ChartsPanel {
    pub volume: BarChart,
    pub vehicles: BarChart,
}

impl ChartsPanel {
    pub fn build(dataset: &Dataset, top_n: usize) -> Self {
        Self {
            volume: BarChart::top_by(
                dataset,
                Metric::VolumeMillions,
                top_n,
                format!("Top {top_n} departamentos por volumen"),
                "orange",
            ),
            vehicles: BarChart::top_by(
                dataset,
                Metric::VehiclesMillions,
                top_n,
                format!("Top {top_n} departamentos por vehículos"),
                "purple",
            ),
        }
    }
}

/// One table row; numbers are already rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub department: String,
    pub volume_millions: f64,
    pub sales_millions: f64,
    pub vehicles_millions: f64,
    pub volume_per_station: Option<f64>,
}

impl TableRow {
    /// Display text for each column, "sin datos" where the value is missing.
    pub fn cells(&self) -> [String; 5] {
        [
            self.department.clone(),
            format!("{:.2}", self.volume_millions),
            format!("{:.2}", self.sales_millions),
            format!("{:.2}", self.vehicles_millions),
            self.volume_per_station
                .map(|v| format!("{v:.2}"))
                .unwrap_or_else(|| NO_DATA_LABEL.to_string()),
        ]
    }
}

/// The table tab: top departments by scaled volume.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryTable {
    pub title: String,
    pub columns: [&'static str; 5],
    pub rows: Vec<TableRow>,
}

impl SummaryTable {
    pub fn build(dataset: &Dataset, top_n: usize) -> Self {
        let rows = ranked_by(&dataset.departments, Metric::VolumeMillions, top_n)
            .into_iter()
            .map(|(department, _)| TableRow {
                department: department.name().to_string(),
                volume_millions: round_two_decimals(department.scaled.volume_millions),
                sales_millions: round_two_decimals(department.scaled.sales_millions),
                vehicles_millions: round_two_decimals(department.scaled.vehicles_millions),
                volume_per_station: department
                    .volume_per_station
                    .filter(|v| v.is_finite())
                    .map(round_two_decimals),
            })
            .collect();

        Self {
            title: format!("Top {top_n} departamentos por volumen suministrado"),
            columns: [
                DEPARTMENT_NAME_FIELD,
                Metric::VolumeMillions.code(),
                Metric::SalesMillions.code(),
                Metric::VehiclesMillions.code(),
                Metric::VolumePerStation.code(),
            ],
            rows,
        }
    }
}

/// The context tab: explanatory text about the data.
#[derive(Debug, Clone, Serialize)]
pub struct ContextPanel {
    pub title: &'static str,
    pub paragraphs: [&'static str; 2],
    pub latest_year: Option<i32>,
    pub departments: usize,
}

impl ContextPanel {
    pub fn build(dataset: &Dataset) -> Self {
        Self {
            title: "Contexto del problema",
            paragraphs: [
                "En Colombia, el gas natural vehicular (GNV) se ha convertido en una alternativa \
                 económica y ambientalmente sostenible frente a otros combustibles. Sin embargo, su \
                 consumo varía significativamente entre los departamentos. Este dashboard permite \
                 visualizar el comportamiento del GNV en todo el país durante el último año \
                 disponible, analizando variables como el volumen suministrado, ventas, número de \
                 vehículos atendidos y eficiencia por estación.",
                "El objetivo de este análisis es identificar patrones de consumo, posibles \
                 desigualdades en la cobertura del servicio y oportunidades de mejora en la \
                 distribución del gas vehicular. Esta herramienta busca facilitar la toma de \
                 decisiones para entidades públicas, empresas del sector energético y ciudadanos \
                 interesados.",
            ],
            latest_year: dataset.latest_year,
            departments: dataset.len(),
        }
    }
}

/// Departments with a value for `metric`, largest first, at most `top_n`.
fn ranked_by(
    departments: &[DepartmentAggregate],
    metric: Metric,
    top_n: usize,
) -> Vec<(&DepartmentAggregate, f64)> {
    let mut ranked: Vec<_> = departments
        .iter()
        .filter_map(|d| metric.value(d).map(|v| (d, v)))
        .collect();
    ranked.sort_by(|(a, va), (b, vb)| {
        vb.partial_cmp(va)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.name().cmp(b.name()))
    });
    ranked.truncate(top_n);
    ranked
}
