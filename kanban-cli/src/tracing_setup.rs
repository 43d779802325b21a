//! Logging for the `kanban` binary
//!
//! Logs go to stderr so `session issue` and `user add` output on stdout stays
//! pipeable. `RUST_LOG` wins when set; otherwise `--debug` picks the verbose
//! directives below.
//!
//! Built with the `telemetry` feature, `--otel` also exports spans over OTLP:
//!   OTEL_EXPORTER_OTLP_ENDPOINT  # default: http://localhost:4317
//!   OTEL_SERVICE_NAME            # default: kanban

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// sqlx logs every statement at info; keep that out of normal output
fn default_directives(debug: bool) -> &'static str {
    if debug {
        "debug,sqlx=info,hyper=info,h2=info"
    } else {
        "info,sqlx=warn"
    }
}

fn env_filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(debug)))
}

/// Flushes pending spans on drop when OTLP export is on.
#[must_use = "dropping the guard stops span export"]
pub struct TracingGuard {
    #[cfg(feature = "telemetry")]
    exporting: bool,
}

impl Drop for TracingGuard {
    fn drop(&mut self) {
        #[cfg(feature = "telemetry")]
        if self.exporting {
            opentelemetry::global::shutdown_tracer_provider();
        }
    }
}

#[cfg(feature = "telemetry")]
fn otlp_tracer() -> Result<(opentelemetry_sdk::trace::Tracer, String)> {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;

    let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
        .unwrap_or_else(|_| "http://localhost:4317".to_string());
    let service = std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "kanban".to_string());

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&endpoint)
        .build()
        .context("Failed to create OTLP exporter")?;

    let provider = opentelemetry_sdk::trace::TracerProvider::builder()
        .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
        .with_resource(opentelemetry_sdk::Resource::new(vec![KeyValue::new(
            "service.name",
            service,
        )]))
        .build();

    let tracer = provider.tracer("kanban");
    // the global provider keeps the exporter alive until TracingGuard drops
    let _ = opentelemetry::global::set_tracer_provider(provider);
    Ok((tracer, endpoint))
}

/// Install the global subscriber. `otel` is ignored unless built with `telemetry`.
pub fn init(debug: bool, otel: bool) -> Result<TracingGuard> {
    let registry = tracing_subscriber::registry().with(env_filter(debug)).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(debug)
            .compact(),
    );

    #[cfg(feature = "telemetry")]
    if otel {
        let (tracer, endpoint) = otlp_tracer()?;
        registry
            .with(tracing_opentelemetry::layer().with_tracer(tracer))
            .try_init()
            .context("tracing already initialized")?;
        tracing::info!(%endpoint, "exporting spans over OTLP");
        return Ok(TracingGuard { exporting: true });
    }

    #[cfg(not(feature = "telemetry"))]
    if otel {
        eprintln!("--otel requires a build with the `telemetry` feature; logging to console only");
    }

    registry.try_init().context("tracing already initialized")?;
    Ok(TracingGuard {
        #[cfg(feature = "telemetry")]
        exporting: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directives_parse() {
        for debug in [false, true] {
            assert!(EnvFilter::try_new(default_directives(debug)).is_ok());
        }
    }

    #[test]
    fn sqlx_statements_are_quiet_by_default() {
        assert!(default_directives(true).contains("sqlx=info"));
        assert!(default_directives(false).contains("sqlx=warn"));
    }
}
