//! Logging setup for the geocat server.
//!
//! Output is configured once at startup from two environment variables:
//! - `RUST_LOG`: the `tracing-subscriber` filter directives
//! - `GEOCAT_FORMAT`: one of `full`, `compact`, `pretty` or `json`

use std::str::FromStr;

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::{EnvFilter, Layer as _, Registry};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "geocat=info,geocat_core=info";

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Single-line human readable output
    Full,
    /// Shorter single-line output, the release default
    Compact,
    /// Multi-line output for local development, the debug build default
    Pretty,
    /// Newline-delimited JSON records
    Json,
}

impl Default for LogFormat {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Compact
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "compact" => Ok(Self::Compact),
            "pretty" | "verbose" => Ok(Self::Pretty),
            "json" | "jsonl" => Ok(Self::Json),
            _ => Err(format!(
                "Invalid log format '{s}'. Valid options: full, compact, pretty, json"
            )),
        }
    }
}

/// Installs the global subscriber and bridges `log` records into `tracing`.
///
/// Must be called at most once per process, before any request is served.
pub fn init_tracing(filter: &str, format: Option<String>) {
    if let Err(e) = tracing_log::LogTracer::builder()
        .with_interest_cache(tracing_log::InterestCacheConfig::default())
        .init()
    {
        eprintln!("Warning: unable to forward log records to tracing: {e}");
    }

    let env_filter = EnvFilter::from_str(filter).unwrap_or_else(|_| {
        eprintln!("Warning: Invalid filter string '{filter}', logging everything at debug level");
        EnvFilter::new("debug")
    });

    let format = format
        .and_then(|s| {
            s.parse::<LogFormat>()
                .map_err(|e| eprintln!("Warning: {e}. Falling back to the default format"))
                .ok()
        })
        .unwrap_or_default();

    let result = match format {
        LogFormat::Full => Registry::default()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_span_events(FmtSpan::NONE)
                    .with_filter(env_filter),
            )
            .try_init(),
        LogFormat::Compact => Registry::default()
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_span_events(FmtSpan::NONE)
                    .with_filter(env_filter),
            )
            .try_init(),
        LogFormat::Pretty => Registry::default()
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_filter(env_filter),
            )
            .try_init(),
        LogFormat::Json => Registry::default()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_span_events(FmtSpan::NONE)
                    .with_filter(env_filter),
            )
            .try_init(),
    };
    if let Err(e) = result {
        eprintln!("Warning: logging was already initialized: {e}");
    }
}

/// Builds the filter directives from `RUST_LOG`.
///
/// When only a `geocat=` level is given, the same level is applied to
/// `geocat_core` so that catalog messages are not silently dropped.
#[must_use]
pub fn log_filter(rust_log: Option<String>) -> String {
    let Some(rust_log) = rust_log else {
        return DEFAULT_FILTER.to_string();
    };
    if rust_log.contains("geocat_core=") {
        return rust_log;
    }
    match rust_log
        .split(',')
        .find_map(|directive| directive.trim().strip_prefix("geocat="))
    {
        Some(level) => format!("{rust_log},geocat_core={level}"),
        None => rust_log,
    }
}
