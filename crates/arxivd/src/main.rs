// # arxivd - arXiv Polling Daemon
//
// Thin integration layer around arxiv-core:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Opening a polling session over the HTTP fetcher
// 4. Writing each change record to stdout as one JSON line
//
// Polling, buffering and position logic all live in arxiv-core. Logs go to
// stderr so stdout stays a clean record stream.
//
// ## Configuration
//
// ### Query
// - `ARXIV_SEARCH_QUERY`: arXiv search expression (required)
// - `ARXIV_API_URL`: query endpoint (default: https://export.arxiv.org/api/query)
// - `ARXIV_MAX_RESULTS`: page size, 1..=2000 (default: 100)
// - `ARXIV_SORT_BY`: submittedDate, lastUpdatedDate, relevance (default: submittedDate)
// - `ARXIV_SORT_ORDER`: ascending, descending (default: descending)
//
// ### Polling
// - `ARXIV_POLLING_PERIOD_SECS`: minimum gap between fetches (default: 3600)
// - `ARXIV_BACKOFF_SECS`: pause after an empty or failed cycle (default: 30)
// - `ARXIV_POSITION`: position to resume from (default: start of stream)
//
// ### Records
// - `ARXIV_INCLUDE_PDF`: attach `pdf_url` (default: true)
// - `ARXIV_FILTER_RECENT`: drop entries older than the recency window (default: false)
// - `ARXIV_RECENCY_WINDOW_SECS`: recency window (default: 86400)
//
// ### Logging
// - `ARXIV_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// ## Example
//
// ```bash
// export ARXIV_SEARCH_QUERY='cat:cs.AI'
// export ARXIV_POLLING_PERIOD_SECS=60
// export ARXIV_POSITION=200
//
// arxivd > records.jsonl
// ```

use anyhow::{Context, Result};
use arxiv_core::{EngineEvent, PollingEngine, Position, SourceConfig};
use arxiv_http::HttpFeedFetcher;
use std::env;
use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Default pause after an empty or failed cycle
const DEFAULT_BACKOFF_SECS: u64 = 30;

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum ArxivExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<ArxivExitCode> for ExitCode {
    fn from(code: ArxivExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Debug)]
struct Config {
    source: SourceConfig,
    position: Position,
    backoff: Duration,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let search_query = lookup("ARXIV_SEARCH_QUERY").unwrap_or_default();
        let mut source = SourceConfig::new(search_query);

        if let Some(url) = lookup("ARXIV_API_URL") {
            source.api_url = url;
        }
        if let Some(raw) = lookup("ARXIV_MAX_RESULTS") {
            source.max_results = parse_number("ARXIV_MAX_RESULTS", &raw)?;
        }
        if let Some(raw) = lookup("ARXIV_SORT_BY") {
            source.sort_by = raw.parse().context("ARXIV_SORT_BY")?;
        }
        if let Some(raw) = lookup("ARXIV_SORT_ORDER") {
            source.sort_order = raw.parse().context("ARXIV_SORT_ORDER")?;
        }
        if let Some(raw) = lookup("ARXIV_POLLING_PERIOD_SECS") {
            source.polling_period_secs = parse_number("ARXIV_POLLING_PERIOD_SECS", &raw)?;
        }
        if let Some(raw) = lookup("ARXIV_INCLUDE_PDF") {
            source.include_pdf = parse_bool("ARXIV_INCLUDE_PDF", &raw)?;
        }
        if let Some(raw) = lookup("ARXIV_FILTER_RECENT") {
            source.filter_recent = parse_bool("ARXIV_FILTER_RECENT", &raw)?;
        }
        if let Some(raw) = lookup("ARXIV_RECENCY_WINDOW_SECS") {
            source.recency_window_secs = parse_number("ARXIV_RECENCY_WINDOW_SECS", &raw)?;
        }

        let backoff_secs = match lookup("ARXIV_BACKOFF_SECS") {
            Some(raw) => parse_number("ARXIV_BACKOFF_SECS", &raw)?,
            None => DEFAULT_BACKOFF_SECS,
        };

        Ok(Self {
            source,
            position: Position::new(lookup("ARXIV_POSITION").unwrap_or_default()),
            backoff: Duration::from_secs(backoff_secs),
            log_level: lookup("ARXIV_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.source.search_query.trim().is_empty() {
            anyhow::bail!(
                "ARXIV_SEARCH_QUERY is required. \
                Set it via: export ARXIV_SEARCH_QUERY='cat:cs.AI'"
            );
        }

        self.source.validate()?;

        if !self.source.api_url.starts_with("https://")
            && !self.source.api_url.starts_with("http://")
        {
            anyhow::bail!(
                "ARXIV_API_URL must use HTTP or HTTPS scheme. Got: {}",
                self.source.api_url
            );
        }

        if self.source.filter_recent && self.source.recency_window_secs == 0 {
            anyhow::bail!("ARXIV_RECENCY_WINDOW_SECS must be > 0 when ARXIV_FILTER_RECENT is set");
        }

        self.level()?;
        Ok(())
    }

    fn level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "ARXIV_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }
}

fn parse_number<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("{key} must be a non-negative integer. Got: {raw:?}"))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => anyhow::bail!("{key} must be true or false. Got: {raw:?}"),
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e:#}");
            return ArxivExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {e:#}");
        return ArxivExitCode::ConfigError.into();
    }

    // Initialize tracing; stdout is reserved for records
    let log_level = config.level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {e}");
        return ArxivExitCode::ConfigError.into();
    }

    info!("Starting arxivd daemon");
    info!(
        search_query = %config.source.search_query,
        api_url = %config.source.api_url,
        position = %config.position,
        "Configuration loaded"
    );

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ArxivExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {:#}", e);
            ArxivExitCode::RuntimeError
        } else {
            ArxivExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon until a shutdown signal arrives
async fn run_daemon(config: Config) -> Result<()> {
    let fetcher = HttpFeedFetcher::new().context("failed to create HTTP fetcher")?;
    let (engine, events) = PollingEngine::open(config.source, Box::new(fetcher), &config.position)
        .context("failed to open arXiv source")?;

    tokio::spawn(log_events(events));

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(signal) => info!("Received shutdown signal: {}", signal),
            Err(e) => error!("Shutdown handler error: {:#}", e),
        }
        signal_cancel.cancel();
    });

    let mut records = engine.into_stream(cancel.clone(), config.backoff);
    let mut last_position = config.position;
    let mut stdout = std::io::stdout();

    info!("Polling started");
    while let Some(item) = records.next().await {
        let record = match item {
            Ok(record) => record,
            Err(e) => {
                warn!(retryable = e.is_retryable(), "fetch cycle failed: {}", e);
                continue;
            }
        };

        let line = serde_json::to_string(&record).context("failed to encode record")?;
        if let Err(e) = writeln!(stdout, "{line}").and_then(|()| stdout.flush()) {
            cancel.cancel();
            return Err(e).context("failed to write record to stdout");
        }
        last_position = record.position;
    }

    info!(%last_position, "Shutting down daemon; resume with ARXIV_POSITION={}", last_position);
    Ok(())
}

/// Forward engine events to the log
async fn log_events(mut events: mpsc::Receiver<EngineEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            EngineEvent::Opened { offset } => info!(offset, "source opened"),
            EngineEvent::PageFetched {
                offset,
                received,
                retained,
            } => info!(offset, received, retained, "page fetched"),
            EngineEvent::FetchFailed { offset, error } => {
                debug!(offset, %error, "fetch failed")
            }
            EngineEvent::Acked { position } => debug!(%position, "record acknowledged"),
            EngineEvent::Stopped { last_position } => {
                info!(%last_position, "source stopped")
            }
        }
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(signal)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
