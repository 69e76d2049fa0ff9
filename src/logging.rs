use std::{
    env::{self, VarError},
    path::Path,
};

use miette::{miette, Context, IntoDiagnostic, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
    Layer,
};


fn level_filter(console_level_filter: Option<&str>) -> Result<EnvFilter> {
    let environment_filter = match env::var(EnvFilter::DEFAULT_ENV) {
        Ok(environment_filter) => Some(environment_filter),
        Err(VarError::NotPresent) => None,
        Err(error) => {
            return Err(error)
                .into_diagnostic()
                .wrap_err_with(|| miette!("Failed to read {}.", EnvFilter::DEFAULT_ENV))
        }
    };

    parse_level_filter(console_level_filter, environment_filter.as_deref())
}

/// `--log-level` wins over `RUST_LOG`, which wins over the `info` default.
/// An unset or blank `RUST_LOG` means the default; an invalid one is an error.
fn parse_level_filter(
    console_level_filter: Option<&str>,
    environment_filter: Option<&str>,
) -> Result<EnvFilter> {
    match (console_level_filter, environment_filter) {
        (Some(level_filter), _) => EnvFilter::try_new(level_filter)
            .into_diagnostic()
            .wrap_err_with(|| miette!("Failed to parse log level filter \"{}\".", level_filter)),
        (None, Some(environment_filter)) if !environment_filter.trim().is_empty() => {
            EnvFilter::try_new(environment_filter)
                .into_diagnostic()
                .wrap_err_with(|| {
                    miette!(
                        "Failed to parse {} filter \"{}\".",
                        EnvFilter::DEFAULT_ENV,
                        environment_filter
                    )
                })
        }
        _ => Ok(EnvFilter::new("info")),
    }
}


/// Sets up console logging (to stderr) and, if a directory is given,
/// a daily rolling log file.
///
/// The returned guard flushes the log file when dropped, so keep it alive
/// until the program exits.
pub fn initialize_tracing(
    console_level_filter: Option<&str>,
    log_file_output_directory: Option<&Path>,
    log_file_name: &str,
) -> Result<Option<WorkerGuard>> {
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(level_filter(console_level_filter)?);


    let (file_layer, file_guard) = match log_file_output_directory {
        Some(log_file_output_directory) => {
            std::fs::create_dir_all(log_file_output_directory)
                .into_diagnostic()
                .wrap_err_with(|| {
                    miette!(
                        "Failed to create missing log directory at {}.",
                        log_file_output_directory.display()
                    )
                })?;

            let file_appender =
                tracing_appender::rolling::daily(log_file_output_directory, log_file_name);
            let (non_blocking_appender, guard) = tracing_appender::non_blocking(file_appender);

            let file_layer = fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking_appender)
                .with_filter(level_filter(console_level_filter)?);

            (Some(file_layer), Some(guard))
        }
        None => (None, None),
    };


    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .into_diagnostic()
        .wrap_err("Failed to install tracing subscriber.")?;

    Ok(file_guard)
}
