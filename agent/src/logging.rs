use std::{fs::File, io, path::Path};

use tracing::{warn, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, registry::LookupSpan, EnvFilter, Layer};

/// Logs to stderr and, when `log_file` can be created, to that file as well.
/// The file is truncated on every start. `RUST_LOG` overrides the default
/// `info` level.
///
/// File output goes through a background writer; the returned guard flushes
/// it on drop and must be held for as long as the process logs.
#[must_use]
pub fn init(log_file: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard, file_error) = match log_file.map(file_layer) {
        Some(Ok((layer, guard))) => (Some(layer), Some(guard), None),
        Some(Err(err)) => (None, None, Some(err)),
        None => (None, None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .init();

    if let (Some(path), Some(err)) = (log_file, file_error) {
        warn!("could not open log file {}: {err}", path.display());
    }
    guard
}

fn file_layer<S>(path: &Path) -> io::Result<(impl Layer<S>, WorkerGuard)>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    let (writer, guard) = tracing_appender::non_blocking(File::create(path)?);
    let layer = fmt::layer().with_ansi(false).with_writer(writer);
    Ok((layer, guard))
}
