use std::io::{self, IsTerminal};

use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt};

/// RFC3339 UTC timer implemented via `chrono` (no extra features).
/// Example output: `2025-09-12T10:20:30Z`
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Utc::now();
        w.write_str(&now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
    }
}

/// Installs the global subscriber.
///
/// - `RUST_LOG` wins; otherwise `default_filter` (e.g. `info`)
/// - compact single-line events with RFC3339 UTC timestamps
/// - span close events, so instrumented handlers log their duration
/// - ANSI colors only when stdout is a terminal
pub fn init(default_filter: &str) -> Result<(), TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let layer = fmt::layer()
        .with_timer(ChronoRfc3339Utc)
        .with_target(true)
        .with_ansi(io::stdout().is_terminal())
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
}
