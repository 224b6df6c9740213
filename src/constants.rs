// Boundary (GeoJSON) property names
pub const DEPARTMENT_CODE_FIELD: &str = "DPTO_CCDGO";
pub const MUNICIPALITY_CODE_FIELD: &str = "MPIO_CCDGO";
pub const DEPARTMENT_NAME_FIELD: &str = "DPTO_CNMBR";

// Sales CSV column names (also used as snapshot columns)
pub const DANE_CODE_COLUMN: &str = "CODIGO_MUNICIPIO_DANE";
pub const VOLUME_COLUMN: &str = "CANTIDAD_VOLUMEN_SUMINISTRADO";
pub const VEHICLES_COLUMN: &str = "VEHICULOS_ATENDIDOS";
pub const SALES_COLUMN: &str = "NUMERO_DE_VENTAS";
pub const STATIONS_COLUMN: &str = "EDS_ACTIVAS";
pub const YEAR_COLUMN: &str = "ANIO_VENTA";
pub const GEOMETRY_COLUMN: &str = "geometry";

// DANE code widths
pub const DEPARTMENT_CODE_WIDTH: usize = 2;
pub const MUNICIPALITY_CODE_WIDTH: usize = 3;
pub const DANE_CODE_WIDTH: usize = DEPARTMENT_CODE_WIDTH + MUNICIPALITY_CODE_WIDTH;

pub const MILLION: f64 = 1_000_000.0;

// Defaults
pub const DEFAULT_SIMPLIFY_TOLERANCE: f64 = 0.01;
pub const DEFAULT_TOP_N: usize = 10;
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8050;

// Page text
pub const PAGE_TITLE: &str = "Dashboard de Consumo de Gas Vehicular";
pub const NO_DATA_LABEL: &str = "sin datos";
