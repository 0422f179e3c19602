use once_cell::sync::OnceCell;
use tracing_subscriber::{
    fmt, fmt::time::UtcTime, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use crate::error::{AppError, AppResult};
use crate::models::settings::LogSettings;

static LOGGER_INIT: OnceCell<()> = OnceCell::new();
static LOGGER_GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();

/// Installs the global subscriber once; later calls are no-ops.
///
/// `RUST_LOG` wins over the configured directives. When a log directory is
/// configured, a daily-rolling file layer is added next to the console.
pub fn init_logging(settings: &LogSettings) -> AppResult<()> {
    LOGGER_INIT
        .get_or_try_init(|| {
            let env_filter = build_filter(&settings.directives)?;

            let file_layer = match &settings.directory {
                Some(log_dir) => {
                    std::fs::create_dir_all(log_dir)?;
                    let file_appender =
                        tracing_appender::rolling::daily(log_dir, &settings.file_prefix);
                    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
                    LOGGER_GUARD
                        .set(guard)
                        .map_err(|_| AppError::other("log writer already initialized"))?;

                    Some(
                        fmt::layer()
                            .with_writer(non_blocking)
                            .with_ansi(false)
                            .with_target(true)
                            .with_timer(UtcTime::rfc_3339()),
                    )
                }
                None => None,
            };

            tracing_subscriber::registry()
                .with(env_filter)
                .with(file_layer)
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_timer(UtcTime::rfc_3339()),
                )
                .try_init()
                .map_err(|err| AppError::other(format!("failed to install log subscriber: {err}")))?;

            Ok(())
        })
        .map(|_| ())
}

fn build_filter(directives: &str) -> AppResult<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directives))
        .map_err(|err| AppError::settings(format!("invalid log directives: {err}")))
}
