use tracing_subscriber::{
    fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

const DEFAULT_FILTER: &str = "photodrop=debug,tower_http=debug";

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the default filter. Production logs are JSON lines,
/// everything else uses the compact console format. Calling this again once a
/// subscriber is installed is a no-op.
pub fn init_telemetry(is_production: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    let json_fmt = is_production.then(|| tracing_subscriber::fmt::layer().json());
    let console_fmt = (!is_production).then(|| {
        tracing_subscriber::fmt::layer().event_format(
            Format::default()
                .compact()
                .with_target(false)
                .without_time(),
        )
    });

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(json_fmt)
        .with(console_fmt)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(json = is_production, "Tracing initialized");
    }
}
