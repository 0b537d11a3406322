//! search-context: budgeted search corpus service
//!
//! This is the main entry point for the application.

use anyhow::Result;
use search_context::{
    config::Settings,
    network::HttpClient,
    web::{create_router, AppState},
};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "-h" | "--help" => {
                print_usage();
                return Ok(());
            }
            "-V" | "--version" => {
                println!("search-context {}", search_context::VERSION);
                return Ok(());
            }
            _ => {}
        }
    }

    // Load configuration before logging so the configured level applies
    let settings = load_settings()?;
    settings.validate()?;

    let filter = if settings.general.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&settings.general.log_level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("Starting search-context v{}", search_context::VERSION);

    // Initialize HTTP client
    let client = HttpClient::with_settings(&settings.outgoing)?;
    info!(user_agent = client.user_agent(), "HTTP client initialized");

    // Create application state
    let state = AppState::new(settings.clone(), client)?;
    info!(
        max_total_chars = settings.aggregation.default_max_total_chars,
        global_timeout_secs = settings.aggregation.global_timeout,
        "Aggregator initialized"
    );

    let app = create_router(state);

    let addr = SocketAddr::new(
        settings.server.bind_address.parse()?,
        settings.server.port,
    );

    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Load settings from file or use defaults
fn load_settings() -> Result<Settings> {
    // Explicit path wins
    if let Ok(path) = std::env::var("SEARCH_CONTEXT_SETTINGS_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            let mut settings = Settings::from_file(&path)?;
            settings.merge_env();
            return Ok(settings);
        }
    }

    let paths = [
        PathBuf::from("settings.yml"),
        PathBuf::from("config/settings.yml"),
        PathBuf::from("/etc/search-context/settings.yml"),
        dirs::config_dir()
            .map(|p| p.join("search-context/settings.yml"))
            .unwrap_or_default(),
    ];

    for path in paths.iter() {
        if path.exists() {
            let mut settings = Settings::from_file(path)?;
            settings.merge_env();
            return Ok(settings);
        }
    }

    let mut settings = Settings::default();
    settings.merge_env();
    Ok(settings)
}

/// Print usage information
fn print_usage() {
    println!(
        r#"
search-context v{}
Turns a set of search queries into a single character-bounded text corpus

USAGE:
    search-context [OPTIONS]

OPTIONS:
    -h, --help             Print help information
    -V, --version          Print version information

ENVIRONMENT VARIABLES:
    SEARCH_CONTEXT_SETTINGS_PATH   Path to settings.yml
    SEARCH_CONTEXT_DEBUG           Enable debug logging (true/false)
    SEARCH_CONTEXT_LOG             Log filter when RUST_LOG is unset
    SEARCH_CONTEXT_PORT            Server port
    SEARCH_CONTEXT_BIND_ADDRESS    Bind address
    SEARCH_CONTEXT_MAX_TOTAL_CHARS Default character budget
    SEARCH_CONTEXT_GLOBAL_TIMEOUT  Aggregation deadline in seconds
"#,
        search_context::VERSION
    );
}
