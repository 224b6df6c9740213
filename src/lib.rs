//! gnv-dashboard library
//!
//! This crate provides the core functionality for the `gnv-dashboard` binary.
//!
//! ## Overview
//!
//! The library turns municipality boundaries and vehicular natural gas sales
//! into department-level aggregates and serves them as an interactive page:
//!
//! - [`pipeline`] - Loads the raw files, joins them on the DANE code, aggregates per
//!   department, dissolves geometry and reads/writes the Parquet snapshot
//! - [`dashboard`] - Builds the map, charts, table and context panels and renders them to HTML
//! - [`server`] - HTTP routes for tab switching and metric selection
//! - [`cli`] - Command-line interface (`serve`, `toml`, `build-cache`)
//! - [`config`] - Resolved runtime configuration, optionally loaded from TOML
//! - [`models`] - Records, aggregates, metrics and tabs
//! - [`errors`] - Error types used throughout the application
//!
//! ## Example Usage
//!
//! ```no_run
//! use gnv_dashboard::{config::ResolvedConfig, errors::AppResult, pipeline, server};
//!
//! # fn example() -> AppResult<()> {
//! let config = ResolvedConfig::default();
//! let dataset = pipeline::load_dataset(&config)?;
//! let state = server::AppState::new(dataset, &config);
//! actix_web::rt::System::new().block_on(server::run(state, &config.listen_address()))?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod dashboard;
pub mod errors;
pub mod models;
pub mod pipeline;
pub mod server;
pub mod utils;
