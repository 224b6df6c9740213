mod figures;
mod page;
mod session;

// Re-export public API
pub use figures::{BarChart, ChartsPanel, ContextPanel, MapFigure, SummaryTable, TableRow};
pub use page::{render_page, render_panel};
pub use session::{DashboardSession, Panel};
