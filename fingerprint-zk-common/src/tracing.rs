use crate::config::MetricsConfig;
use eyre::Result;
use metrics_exporter_statsd::StatsdBuilder;
use std::{backtrace::Backtrace, panic};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the fmt subscriber (filtered by `RUST_LOG`, `info` by default)
/// and, when configured, a StatsD metrics recorder.
pub fn initialize_tracing(metrics_config: Option<&MetricsConfig>) -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().compact())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .try_init()?;

    if let Some(metrics_config) = metrics_config {
        let recorder = StatsdBuilder::from(&metrics_config.host, metrics_config.port)
            .with_queue_size(metrics_config.queue_size)
            .with_buffer_size(metrics_config.buffer_size)
            .histogram_is_distribution()
            .build(Some(&metrics_config.prefix))?;
        metrics::set_global_recorder(recorder)?;

        // Keep panics on a single log line so the log shipper does not split them
        panic::set_hook(Box::new(|panic_info| {
            let message = match panic_info.payload().downcast_ref::<&str>() {
                Some(s) => *s,
                None => match panic_info.payload().downcast_ref::<String>() {
                    Some(s) => s.as_str(),
                    None => "Unknown panic message",
                },
            };
            let location = panic_info
                .location()
                .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
                .unwrap_or_else(|| "Unknown location".to_string());
            let backtrace = format!("{:?}", Backtrace::capture()).replace('\n', " | ");

            tracing::error!(
                { backtrace = %backtrace, location = %location },
                "Panic occurred with message: {}",
                message
            );
        }));
    }
    Ok(())
}
