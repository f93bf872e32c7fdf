//! # Structured Logging
//!
//! Span helpers and subscriber setup built on the tracing ecosystem. Library
//! code only emits events; installing a subscriber is left to the binary.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::FactoryConfig;

/// Create a tracing span for a certificate factory operation.
///
/// ```rust,ignore
/// let _span = cert_span!("add_cn", requested = 3).entered();
/// ```
#[macro_export]
macro_rules! cert_span {
    ($operation:expr) => {
        tracing::info_span!("cert_operation", operation = %$operation)
    };
    ($operation:expr, $($field:tt)*) => {
        tracing::info_span!(
            "cert_operation",
            operation = %$operation,
            $($field)*
        )
    };
}

/// Install a formatting subscriber filtered by `RUST_LOG`.
///
/// When `RUST_LOG` is unset it defaults to `debug` for verbose runs and
/// `info` otherwise. `DYNCERT_JSON_LOGS=true` switches to JSON lines. An
/// already-installed global subscriber is left alone.
pub fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = FmtSubscriber::builder().with_env_filter(filter).with_writer(std::io::stderr);
    let installed = if json_logging() {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };

    if let Err(err) = installed {
        tracing::debug!(error = %err, "global subscriber already installed");
    }
    Ok(())
}

fn json_logging() -> bool {
    std::env::var("DYNCERT_JSON_LOGS")
        .map(|value| value.eq_ignore_ascii_case("true") || value == "1")
        .unwrap_or(false)
}

/// Log the factory configuration at startup
pub fn log_factory_config(config: &FactoryConfig) {
    tracing::info!(
        cn = %config.cn,
        organization = ?config.organization,
        expiration_days_check = config.expiration_days_check,
        validity_days = config.validity_days,
        max_key_len = config.annotation_key_limits.max_key_len,
        "dyncert factory configuration"
    );
}
