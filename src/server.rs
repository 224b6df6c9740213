use crate::config::ResolvedConfig;
use crate::dashboard::{render_page, render_panel, DashboardSession};
use crate::errors::{AppError, AppResult};
use crate::models::{Dataset, Metric, Tab};
use actix_web::http::header::ContentType;
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use serde::Deserialize;
use serde_json::json;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{error, info, warn};

/// Shared state injected into every handler.
///
/// The dataset is immutable after startup. The session is the only mutable
/// piece and is updated by one handler at a time.
#[derive(Debug)]
pub struct AppState {
    pub dataset: Arc<Dataset>,
    pub session: Mutex<DashboardSession>,
    pub strict_metrics: bool,
}

impl AppState {
    pub fn new(dataset: Dataset, config: &ResolvedConfig) -> Self {
        let dataset = Arc::new(dataset);
        Self {
            session: Mutex::new(DashboardSession::new(Arc::clone(&dataset), config.top_n)),
            dataset,
            strict_metrics: config.strict_metrics,
        }
    }

    fn session(&self) -> MutexGuard<'_, DashboardSession> {
        self.session.lock().unwrap_or_else(|poisoned| {
            warn!("Session lock poisoned by an earlier panic; reusing state");
            poisoned.into_inner()
        })
    }

    /// Parses a metric code from a request.
    ///
    /// Unknown codes are a programming error on the page side: in strict mode
    /// they are rejected, otherwise the default metric is used.
    pub fn resolve_metric(&self, code: &str) -> AppResult<Metric> {
        match code.parse::<Metric>() {
            Ok(metric) => Ok(metric),
            Err(e) if self.strict_metrics => {
                error!(metric = code, "Unknown metric requested");
                Err(e)
            }
            Err(_) => {
                warn!(
                    metric = code,
                    fallback = Metric::default().code(),
                    "Unknown metric requested; using default"
                );
                Ok(Metric::default())
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    tab: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MetricRequest {
    metric: String,
}

fn error_response(err: &AppError) -> HttpResponse {
    let body = json!({ "error": err.to_string() });
    match err {
        AppError::UnknownTab(_) => HttpResponse::NotFound().json(body),
        AppError::UnknownMetric { .. } | AppError::InvalidInput(_) => {
            HttpResponse::BadRequest().json(body)
        }
        _ => HttpResponse::InternalServerError().json(body),
    }
}

fn html_response(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(body)
}

async fn index(state: web::Data<AppState>, query: web::Query<PageQuery>) -> impl Responder {
    let tab = match query.tab.as_deref().map(str::parse::<Tab>).transpose() {
        Ok(tab) => tab,
        Err(e) => return error_response(&e),
    };

    let mut session = state.session();
    let tab = tab.unwrap_or_else(|| session.active_tab());
    let panel = session.select_tab(tab);
    let metric = session.selected_metric();
    drop(session);

    match render_page(tab, metric, &panel) {
        Ok(body) => html_response(body),
        Err(e) => error_response(&e),
    }
}

async fn tab_fragment(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let tab = match path.parse::<Tab>() {
        Ok(tab) => tab,
        Err(e) => return error_response(&e),
    };

    let mut session = state.session();
    let panel = session.select_tab(tab);
    let metric = session.selected_metric();
    drop(session);

    match render_panel(&panel, metric) {
        Ok(body) => html_response(body),
        Err(e) => error_response(&e),
    }
}

async fn map_figure(state: web::Data<AppState>) -> impl Responder {
    let figure = state.session().map_figure();
    HttpResponse::Ok().json(&*figure)
}

async fn select_metric(
    state: web::Data<AppState>,
    body: web::Json<MetricRequest>,
) -> impl Responder {
    let metric = match state.resolve_metric(&body.metric) {
        Ok(metric) => metric,
        Err(e) => return error_response(&e),
    };

    let figure = state.session().select_metric(metric);
    HttpResponse::Ok().json(&*figure)
}

/// Registers the dashboard routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/tab/{tab}", web::get().to(tab_fragment))
        .route("/map", web::get().to(map_figure))
        .route("/metric", web::post().to(select_metric));
}

/// Serves the dashboard until the process is stopped.
///
/// A single worker handles requests so interaction events are processed one
/// at a time.
pub async fn run(state: AppState, address: &str) -> AppResult<()> {
    let data = web::Data::new(state);

    info!(
        address = address,
        departments = data.dataset.len(),
        "Serving dashboard"
    );

    HttpServer::new(move || App::new().app_data(data.clone()).configure(configure))
        .workers(1)
        .bind(address)
        .map_err(|e| AppError::IoError(format!("Failed to bind {address}: {e}")))?
        .run()
        .await
        .map_err(|e| AppError::IoError(format!("Server error: {e}")))
}
