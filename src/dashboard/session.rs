use crate::dashboard::figures::{ChartsPanel, ContextPanel, MapFigure, SummaryTable};
use crate::models::{Dataset, Metric, Tab};
use std::sync::Arc;
use tracing::debug;

/// Rendered content of one tab.
#[derive(Debug, Clone)]
pub enum Panel {
    Context(ContextPanel),
    Map(Arc<MapFigure>),
    Charts(Arc<ChartsPanel>),
    Table(Arc<SummaryTable>),
}

/// Interactive state of the dashboard: active tab, selected metric and the
/// panels built so far.
///
/// Charts and table depend only on the dataset, so they are built once on
/// first visit and reused. The map depends on the selected metric and is
/// rebuilt when, and only when, the metric changes.
#[derive(Debug)]
pub struct DashboardSession {
    dataset: Arc<Dataset>,
    top_n: usize,
    active_tab: Tab,
    selected_metric: Metric,
    map: Option<Arc<MapFigure>>,
    charts: Option<Arc<ChartsPanel>>,
    table: Option<Arc<SummaryTable>>,
    map_builds: usize,
}

impl DashboardSession {
    pub fn new(dataset: Arc<Dataset>, top_n: usize) -> Self {
        Self {
            dataset,
            top_n,
            active_tab: Tab::default(),
            selected_metric: Metric::default(),
            map: None,
            charts: None,
            table: None,
            map_builds: 0,
        }
    }

    pub fn active_tab(&self) -> Tab {
        self.active_tab
    }

    pub fn selected_metric(&self) -> Metric {
        self.selected_metric
    }

    /// How many times the map figure has been built.
    pub fn map_builds(&self) -> usize {
        self.map_builds
    }

    pub fn cached_charts(&self) -> Option<&Arc<ChartsPanel>> {
        self.charts.as_ref()
    }

    pub fn cached_table(&self) -> Option<&Arc<SummaryTable>> {
        self.table.as_ref()
    }

    /// Makes `tab` active and returns its content.
    pub fn select_tab(&mut self, tab: Tab) -> Panel {
        debug!(tab = tab.slug(), "Tab selected");
        self.active_tab = tab;
        self.panel(tab)
    }

    /// Content of `tab` without changing the active tab.
    pub fn panel(&mut self, tab: Tab) -> Panel {
        match tab {
            Tab::Context => Panel::Context(ContextPanel::build(&self.dataset)),
            Tab::Map => Panel::Map(self.map_figure()),
            Tab::Charts => {
                let dataset = &self.dataset;
                let top_n = self.top_n;
                let charts = self
                    .charts
                    .get_or_insert_with(|| Arc::new(ChartsPanel::build(dataset, top_n)));
                Panel::Charts(Arc::clone(charts))
            }
            Tab::Table => {
                let dataset = &self.dataset;
                let top_n = self.top_n;
                let table = self
                    .table
                    .get_or_insert_with(|| Arc::new(SummaryTable::build(dataset, top_n)));
                Panel::Table(Arc::clone(table))
            }
        }
    }

    /// Stores the selected metric and returns the map for it.
    pub fn select_metric(&mut self, metric: Metric) -> Arc<MapFigure> {
        if metric != self.selected_metric {
            debug!(
                from = self.selected_metric.code(),
                to = metric.code(),
                "Metric selected"
            );
            self.selected_metric = metric;
            self.map = None;
        }
        self.map_figure()
    }

    /// Map for the selected metric, built on first use.
    pub fn map_figure(&mut self) -> Arc<MapFigure> {
        if let Some(map) = &self.map {
            return Arc::clone(map);
        }
        let map = Arc::new(MapFigure::build(&self.dataset, self.selected_metric));
        self.map_builds += 1;
        self.map = Some(Arc::clone(&map));
        map
    }
}
