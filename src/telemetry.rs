use crate::config::AppConfig;
use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceLock<()> = OnceLock::new();

pub fn tracing_log_path() -> PathBuf {
    env::var("WAKELINE_TRACE_LOG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| env::temp_dir().join("wakeline_trace.jsonl"))
}

fn env_filter(config: &AppConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
}

/// Install the global subscriber once. `--logs` writes JSON lines to the trace
/// file; otherwise human-readable output goes to stderr so stdout stays free
/// for the status relay.
pub fn init_tracing(config: &AppConfig) {
    if config.no_logs {
        return;
    }

    let _ = TRACING_INIT.get_or_init(|| {
        if config.logs {
            let path = tracing_log_path();
            let file = match OpenOptions::new().create(true).append(true).open(&path) {
                Ok(file) => file,
                Err(_) => return,
            };
            let subscriber = tracing_subscriber::fmt()
                .json()
                .with_env_filter(env_filter(config))
                .with_timer(UtcTime::rfc_3339())
                .with_writer(file)
                .with_current_span(false)
                .with_span_list(false)
                .finish();
            let _ = tracing::subscriber::set_global_default(subscriber);
        } else {
            let subscriber = tracing_subscriber::fmt()
                .with_env_filter(env_filter(config))
                .with_timer(UtcTime::rfc_3339())
                .with_writer(std::io::stderr)
                .with_target(false)
                .finish();
            let _ = tracing::subscriber::set_global_default(subscriber);
        }
    });
}
