use std::{io, sync::OnceLock};

use tracing_subscriber::fmt::format::{DefaultFields, Format};
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_LOG_FILTER: &str = "info,factfeed=debug,reqwest=warn,hyper_util=warn,rustls=warn";

static LOGGING_INITIALIZED: OnceLock<()> = OnceLock::new();

type Builder = fmt::SubscriberBuilder<DefaultFields, Format, EnvFilter, fn() -> io::Stderr>;

/// Logs always go to stderr; stdout is left to the program's own output.
fn builder(env_filter: EnvFilter) -> Builder {
    let stderr: fn() -> io::Stderr = io::stderr;
    fmt().with_env_filter(env_filter).with_writer(stderr)
}

/// Initialize a process-wide tracing subscriber.
///
/// If `RUST_LOG` is set, it takes precedence. Otherwise a default filter that keeps the
/// HTTP stack quiet is applied.
///
/// This function is idempotent and safe to call multiple times.
pub fn init_logging() {
    LOGGING_INITIALIZED.get_or_init(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

        let _ = builder(env_filter).try_init();
    });
}

/// Like [`init_logging`], but with an explicit filter that overrides `RUST_LOG`.
///
/// Falls back to the default filter when `filter` does not parse.
pub fn init_logging_with(filter: &str) {
    LOGGING_INITIALIZED.get_or_init(|| {
        let env_filter =
            EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

        let _ = builder(env_filter).try_init();
    });
}
