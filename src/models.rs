use crate::errors::{AppError, AppResult};
use crate::pipeline::keys::join_key;
use geo::MultiPolygon;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One municipality polygon from the boundary dataset.
#[derive(Debug, Clone)]
pub struct MunicipalityRecord {
    pub department_code: String,
    pub municipality_code: String,
    pub department_name: String,
    pub geometry: MultiPolygon<f64>,
}

impl MunicipalityRecord {
    /// Five-digit DANE code built from the padded department and municipality codes.
    pub fn join_key(&self) -> String {
        join_key(&self.department_code, &self.municipality_code)
    }
}

/// One row of the sales dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleRecord {
    /// Already padded to five digits by the loader.
    pub municipality_dane_code: String,
    pub volume_supplied: f64,
    pub vehicles_served: f64,
    pub sales_count: f64,
    pub active_stations: f64,
    pub sale_year: Option<i32>,
}

/// Summed measures for one department, before geometry is attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentTotals {
    pub department_name: String,
    pub volume_supplied: f64,
    pub vehicles_served: f64,
    pub sales_count: f64,
    pub active_stations: f64,
}

impl DepartmentTotals {
    /// Average supplied volume per active station.
    ///
    /// `None` stands for "no data": zero stations, or any non-finite quotient.
    pub fn volume_per_station(&self) -> Option<f64> {
        if self.active_stations == 0.0 {
            return None;
        }
        let ratio = self.volume_supplied / self.active_stations;
        ratio.is_finite().then_some(ratio)
    }
}

/// Display copies of the summed measures, in millions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScaledMeasures {
    pub volume_millions: f64,
    pub vehicles_millions: f64,
    pub sales_millions: f64,
}

/// Final per-department row: totals, derived measures and the dissolved polygon.
#[derive(Debug, Clone)]
pub struct DepartmentAggregate {
    pub totals: DepartmentTotals,
    pub volume_per_station: Option<f64>,
    pub scaled: ScaledMeasures,
    pub geometry: MultiPolygon<f64>,
}

impl DepartmentAggregate {
    pub fn name(&self) -> &str {
        &self.totals.department_name
    }
}

/// Where the in-memory dataset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetSource {
    RawFiles,
    Snapshot,
}

impl DatasetSource {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::RawFiles => "raw files",
            Self::Snapshot => "snapshot",
        }
    }
}

/// Read-only dataset shared by every request handler.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Sorted by department name.
    pub departments: Vec<DepartmentAggregate>,
    /// Simplified department polygons for the map payload, same order as `departments`.
    pub display_geometry: Vec<MultiPolygon<f64>>,
    /// Latest sale year seen in the sales file; unknown when loaded from a snapshot.
    pub latest_year: Option<i32>,
    pub source: DatasetSource,
}

impl Dataset {
    pub fn is_empty(&self) -> bool {
        self.departments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.departments.len()
    }
}

/// Map metric the user can colour the choropleth by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Metric {
    #[default]
    #[serde(rename = "VOLUMEN_MILLONES")]
    VolumeMillions,
    #[serde(rename = "VENTAS_MILLONES")]
    SalesMillions,
    #[serde(rename = "VEHICULOS_MILLONES")]
    VehiclesMillions,
    #[serde(rename = "VOLUMEN_POR_EDS")]
    VolumePerStation,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::VolumeMillions,
        Metric::SalesMillions,
        Metric::VehiclesMillions,
        Metric::VolumePerStation,
    ];

    /// Stable code used in the page and in `POST /metric`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::VolumeMillions => "VOLUMEN_MILLONES",
            Self::SalesMillions => "VENTAS_MILLONES",
            Self::VehiclesMillions => "VEHICULOS_MILLONES",
            Self::VolumePerStation => "VOLUMEN_POR_EDS",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::VolumeMillions => "Volumen suministrado (millones m³)",
            Self::SalesMillions => "Número de ventas (millones)",
            Self::VehiclesMillions => "Vehículos atendidos (millones)",
            Self::VolumePerStation => "Volumen promedio por EDS (m³)",
        }
    }

    /// Value of this metric for one department; `None` means "no data".
    pub fn value(&self, department: &DepartmentAggregate) -> Option<f64> {
        let value = match self {
            Self::VolumeMillions => Some(department.scaled.volume_millions),
            Self::SalesMillions => Some(department.scaled.sales_millions),
            Self::VehiclesMillions => Some(department.scaled.vehicles_millions),
            Self::VolumePerStation => department.volume_per_station,
        };
        value.filter(|v| v.is_finite())
    }

    fn available_codes() -> String {
        Self::ALL
            .iter()
            .map(|m| m.code())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for Metric {
    type Err = AppError;

    fn from_str(value: &str) -> AppResult<Self> {
        let code = value.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| AppError::UnknownMetric {
                metric: code.to_string(),
                available: Self::available_codes(),
            })
    }
}

/// Dashboard tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tab {
    Context,
    #[default]
    Map,
    Charts,
    Table,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Context, Tab::Map, Tab::Charts, Tab::Table];

    /// URL slug used by `GET /tab/{tab}`.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Context => "contexto",
            Self::Map => "mapa",
            Self::Charts => "graficos",
            Self::Table => "tabla",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Context => "Contexto del problema",
            Self::Map => "Mapa Interactivo",
            Self::Charts => "Análisis Gráfico",
            Self::Table => "Tabla Comparativa",
        }
    }
}

impl FromStr for Tab {
    type Err = AppError;

    fn from_str(value: &str) -> AppResult<Self> {
        let lower = value.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.slug() == lower)
            .ok_or(AppError::UnknownTab(lower))
    }
}
