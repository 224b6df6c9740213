use crate::config::ResolvedConfig;
use crate::errors::{AppError, AppResult};
use crate::pipeline::{build_snapshot, load_dataset};
use crate::server::{self, AppState};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use tracing::info;

// CLI metadata constants
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const APP_AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
const APP_ABOUT: &str = env!("CARGO_PKG_DESCRIPTION");

fn source_args(cmd: Command<'static>) -> Command<'static> {
    cmd.arg(
        Arg::new("boundaries")
            .short('b')
            .long("boundaries")
            .help("Municipality boundaries (GeoJSON FeatureCollection)")
            .value_parser(clap::value_parser!(PathBuf))
            .action(ArgAction::Set),
    )
    .arg(
        Arg::new("sales")
            .short('s')
            .long("sales")
            .help("Sales CSV with one row per municipality and period")
            .value_parser(clap::value_parser!(PathBuf))
            .action(ArgAction::Set),
    )
    .arg(
        Arg::new("cache")
            .short('c')
            .long("cache")
            .help("Department snapshot (Parquet)")
            .value_parser(clap::value_parser!(PathBuf))
            .action(ArgAction::Set),
    )
}

/// Builds the command-line definition.
pub fn command() -> Command<'static> {
    Command::new("gnv-dashboard")
        .version(APP_VERSION)
        .author(APP_AUTHOR)
        .about(APP_ABOUT)
        .subcommand(
            source_args(
                Command::new("serve")
                    .about("Aggregate the datasets (or load the snapshot) and serve the dashboard")
                    .after_help("Example:\n  gnv-dashboard serve -b data/municipios.geojson -s data/ventas.csv --port 8050"),
            )
            .arg(
                Arg::new("no_cache")
                    .long("no-cache")
                    .help("Ignore the snapshot and recompute from the raw files")
                    .action(ArgAction::SetTrue),
            )
            .arg(
                Arg::new("bind")
                    .long("bind")
                    .help("Address to listen on")
                    .action(ArgAction::Set),
            )
            .arg(
                Arg::new("port")
                    .short('p')
                    .long("port")
                    .help("Port to listen on")
                    .value_parser(clap::value_parser!(u16))
                    .action(ArgAction::Set),
            ),
        )
        .subcommand(
            Command::new("toml")
                .about("Serve using a TOML configuration file")
                .arg(
                    Arg::new("config")
                        .help("Path to the TOML config file")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .subcommand(source_args(
            Command::new("build-cache")
                .about("Recompute the department aggregates and write the snapshot"),
        ))
}

/// Parses command-line arguments and runs the selected subcommand.
///
/// - `serve`: default configuration, overridden by flags
/// - `toml`: configuration read from a TOML file
/// - `build-cache`: rewrite the snapshot from the raw files and exit
///
/// Without a subcommand the help text is printed.
pub fn cli() -> AppResult<()> {
    let cmd = command();
    let mut cmd_for_help = cmd.clone();
    let matches = cmd.get_matches();

    match matches.subcommand() {
        Some(("serve", sub)) => {
            let config = config_from_matches(sub)?;
            serve(config)?;
        }
        Some(("toml", sub)) => {
            let config_path = sub
                .get_one::<PathBuf>("config")
                .ok_or_else(|| AppError::InvalidInput("config path is required".into()))?;
            let config = ResolvedConfig::from_toml_file(config_path)?;
            serve(config)?;
        }
        Some(("build-cache", sub)) => {
            let config = config_from_matches(sub)?;
            let departments = build_snapshot(&config)?;
            info!(
                path = %config.cache_path.display(),
                departments = departments,
                "Snapshot ready"
            );
        }
        _ => {
            cmd_for_help
                .print_help()
                .map_err(|e| AppError::IoError(format!("Failed to print help: {e}")))?;
        }
    }

    Ok(())
}

/// Applies flag overrides on top of the default configuration.
pub fn config_from_matches(sub: &ArgMatches) -> AppResult<ResolvedConfig> {
    let mut config = ResolvedConfig::default();

    if let Some(path) = sub.get_one::<PathBuf>("boundaries") {
        config.boundaries_path = path.clone();
    }
    if let Some(path) = sub.get_one::<PathBuf>("sales") {
        config.sales_path = path.clone();
    }
    if let Some(path) = sub.get_one::<PathBuf>("cache") {
        config.cache_path = path.clone();
    }
    if has_arg(sub, "no_cache") && sub.get_flag("no_cache") {
        config.prefer_cache = false;
    }
    if has_arg(sub, "bind") {
        if let Some(bind) = sub.get_one::<String>("bind") {
            config.bind_address = bind.clone();
        }
    }
    if has_arg(sub, "port") {
        if let Some(&port) = sub.get_one::<u16>("port") {
            config.port = port;
        }
    }

    config.validate()?;
    Ok(config)
}

// `build-cache` shares the source flags but not the server ones
fn has_arg(sub: &ArgMatches, id: &str) -> bool {
    sub.try_contains_id(id).is_ok()
}

/// Builds the dataset once, then serves it until the process stops.
fn serve(config: ResolvedConfig) -> AppResult<()> {
    let dataset = load_dataset(&config)?;
    let address = config.listen_address();
    let state = AppState::new(dataset, &config);

    actix_web::rt::System::new().block_on(server::run(state, &address))
}
