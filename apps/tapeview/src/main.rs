use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tapeview::headless::{HeadlessArgs, HeadlessMode};
use tapeview::{logging, TuiOpts};
use tapeview_application::config::{load_config, Config};

#[derive(Parser, Debug)]
#[command(name = "tapeview")]
#[command(about = "Live candlestick dashboard over an append-only tick log.", version)]
struct Cli {
    /// Run without TUI and exit after the selected mode completes.
    #[arg(long)]
    headless: bool,

    /// Headless mode: validate | frame
    #[arg(long)]
    mode: Option<Mode>,

    /// Config file path (TOML). If omitted, uses env TAPEVIEW_CONFIG, then built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of refresh cycles to run (frame mode only).
    #[arg(long, default_value_t = 1)]
    cycles: usize,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Mode {
    Validate,
    Frame,
}

fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.or_else(|| {
        std::env::var("TAPEVIEW_CONFIG")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
    });

    let log_store = Arc::new(parking_lot::Mutex::new(logging::LogStore::new(5000)));
    let tracing_result = if cli.headless {
        init_tracing_stderr()
    } else {
        init_tracing(log_store.clone())
    };
    if let Err(err) = tracing_result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
    if let Err(err) = init_metrics() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }

    if cli.headless {
        let mode = match cli.mode {
            Some(Mode::Validate) => HeadlessMode::Validate,
            Some(Mode::Frame) => HeadlessMode::Frame,
            None => {
                eprintln!("error: --mode is required with --headless");
                std::process::exit(1);
            }
        };

        let result = tapeview::headless::run_headless(HeadlessArgs {
            mode,
            config_path,
            cycles: cli.cycles,
        });

        match result {
            Ok(json) => {
                println!(
                    "{}",
                    serde_json::to_string(&json)
                        .unwrap_or_else(|_| "{\"status\":\"error\",\"error\":\"json\"}".to_string())
                );
                std::process::exit(0);
            }
            Err(err) => {
                eprintln!("error: {err}");
                std::process::exit(1);
            }
        }
    }

    let config = match resolve_config(config_path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = tapeview::run(TuiOpts { config, log_store }) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn resolve_config(path: Option<PathBuf>) -> Result<Config, String> {
    match path {
        Some(path) => load_config(&path),
        None => {
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }
}

fn env_filter() -> Result<tracing_subscriber::EnvFilter, String> {
    let filter = std::env::var("TAPEVIEW_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::EnvFilter::try_new(filter).map_err(|err| format!("invalid log filter: {err}"))
}

fn init_tracing(log_store: Arc<parking_lot::Mutex<logging::LogStore>>) -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter()?)
        .with_ansi(false)
        .with_writer(logging::LogMakeWriter::new(log_store))
        .init();
    Ok(())
}

/// Headless runs print JSON on stdout, so logs go to stderr.
fn init_tracing_stderr() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter()?)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[cfg(feature = "prometheus")]
fn init_metrics() -> Result<Option<SocketAddr>, String> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let Some(raw) = std::env::var("TAPEVIEW_METRICS_ADDR").ok() else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }

    let addr: SocketAddr = raw
        .parse()
        .map_err(|err| format!("invalid TAPEVIEW_METRICS_ADDR (expected host:port): {err}"))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|err| format!("failed to install prometheus exporter: {err}"))?;

    tracing::info!(metrics_addr = %addr, "prometheus metrics exporter enabled");
    Ok(Some(addr))
}

#[cfg(not(feature = "prometheus"))]
fn init_metrics() -> Result<Option<SocketAddr>, String> {
    Ok(None)
}
