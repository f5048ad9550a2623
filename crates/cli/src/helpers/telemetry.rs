// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::{Protocol, WithExportConfig};
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use veil_config::ProtocolConfig;

/// Install the global subscriber. Spans are also exported over OTLP when `otel` is configured.
pub fn setup_tracing(config: &ProtocolConfig, log_level: Level) -> Result<()> {
    let level_filter = tracing_subscriber::filter::LevelFilter::from_level(log_level);

    let Some(endpoint) = config.otel.as_deref() else {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(level_filter)
            .init();
        return Ok(());
    };

    let otlp_exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .with_protocol(Protocol::Grpc)
        .build()?;

    let service_name =
        std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| config.name.clone());
    let resource = Resource::builder().with_service_name(service_name).build();

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(otlp_exporter)
        .with_resource(resource)
        .build();

    let tracer = provider.tracer("veil");
    let telemetry = tracing_opentelemetry::layer().with_tracer(tracer);

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(telemetry)
        .with(level_filter)
        .init();

    Ok(())
}
