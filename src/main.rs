//! Watchgate - authentication boundary for a personal anime watchlist app.

use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use tokio::signal;
use tokio::sync::Notify;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use watchgate::config::{Secrets, Settings};
use watchgate::http::GateServer;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const NAME: &str = env!("CARGO_PKG_NAME");

const DEFAULT_CONFIG_PATH: &str = "watchgate.toml";

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return ExitCode::SUCCESS;
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("{} {}", NAME, VERSION);
        return ExitCode::SUCCESS;
    }

    // Load configuration. An explicitly passed config file must exist; the
    // default path is optional and falls back to built-in defaults.
    let settings = match get_config_path(&args) {
        Some(path) => match Settings::load(&path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error loading configuration: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None if std::path::Path::new(DEFAULT_CONFIG_PATH).exists() => {
            match Settings::load(DEFAULT_CONFIG_PATH) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Error loading configuration: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        }
        None => Settings::default(),
    };

    if let Err(e) = init_logging(&settings) {
        eprintln!("Error initializing logging: {}", e);
        return ExitCode::FAILURE;
    }

    // Secrets come from the environment. No signing secret means the
    // boundary cannot operate at all.
    let secrets = match Secrets::from_env() {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "Refusing to start");
            return ExitCode::FAILURE;
        }
    };

    if secrets.password_source.is_none() {
        warn!("No password source configured; logins will fail until one is set");
    }

    info!("Starting {} v{}", NAME, VERSION);
    info!("Bind address: {}", settings.server.bind_addr);
    info!("Production mode: {}", settings.server.production);

    let runtime = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");
    match runtime.block_on(async_main(settings, secrets)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Gate failed");
            ExitCode::FAILURE
        }
    }
}

/// Async main function.
async fn async_main(
    settings: Settings,
    secrets: Secrets,
) -> Result<(), Box<dyn std::error::Error>> {
    let server = GateServer::bind(&settings, &secrets).await?;

    let shutdown = Arc::new(Notify::new());
    let shutdown_for_signal = Arc::clone(&shutdown);

    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received, stopping listener");
        shutdown_for_signal.notify_waiters();
    });

    server.run(shutdown).await?;

    info!("Gate stopped");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    let sigterm = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        _ = signal::ctrl_c() => {},
        _ = sigterm => {},
    }
}

/// Print help message.
fn print_help() {
    println!(
        r#"{} {}
Authentication boundary for a personal anime watchlist app.

USAGE:
    {} [OPTIONS]

OPTIONS:
    -c, --config <PATH>    Path to configuration file
                           [default: {}, optional]
    -h, --help             Print help information
    -V, --version          Print version information

ENVIRONMENT:
    WATCHGATE_TOKEN_SECRET       Token signing secret (falls back to the
                                 password digest, then the password)
    WATCHGATE_PASSWORD_SHA256    SHA-256 hex digest of the site password
    WATCHGATE_PASSWORD           Plaintext site password (legacy)
"#,
        NAME, VERSION, NAME, DEFAULT_CONFIG_PATH
    );
}

/// Configuration file path from `--config <PATH>`, `-c <PATH>`, or
/// `--config=PATH`.
fn get_config_path(args: &[String]) -> Option<String> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" || arg == "-c" {
            return iter.next().cloned();
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Some(path.to_string());
        }
    }
    None
}

/// Initialize the tracing subscriber from the logging settings. RUST_LOG,
/// when set, overrides the configured level.
fn init_logging(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));
    let registry = tracing_subscriber::registry().with(filter);

    if settings.logging.format.eq_ignore_ascii_case("json") {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().pretty()).init();
    }

    Ok(())
}
