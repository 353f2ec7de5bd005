use crate::Environment;
use tracing::{debug, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Crates whose spans carry request and booking context
const APP_TARGETS: [&str; 5] = [
    "danna_api",
    "domain_catalog",
    "domain_incubations",
    "api_features",
    "axum_helpers",
];

/// Install color-eyre for the binary's startup errors.
///
/// Hides the environment section so secrets read at startup never end up in
/// a printed report. Later calls are no-ops.
pub fn install_color_eyre() {
    let _ = color_eyre::config::HookBuilder::default()
        .display_location_section(true)
        .display_env_section(false)
        .install();
}

/// Filter used when `RUST_LOG` is unset.
///
/// Production logs our crates at `info` and keeps the driver quiet;
/// development turns our crates up to `debug`.
pub fn default_directives(environment: &Environment) -> String {
    let (app_level, base) = if environment.is_production() {
        ("info", "warn,tower_http=info,mongodb=warn")
    } else {
        ("debug", "info,tower_http=debug,hyper=info,mongodb=info")
    };

    APP_TARGETS
        .iter()
        .fold(base.to_string(), |mut directives, target| {
            directives.push_str(&format!(",{target}={app_level}"));
            directives
        })
}

/// Initialize the global subscriber.
///
/// - Production: flattened JSON lines for the log shipper.
/// - Development: pretty, multi-line events.
///
/// Both install `ErrorLayer` so eyre reports carry the active span trace
/// (for example `incubation_id` from the claim span when a booking fails).
/// `RUST_LOG` overrides [`default_directives`]. Safe to call more than once;
/// later calls leave the first subscriber in place.
pub fn init_tracing(environment: &Environment) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(environment)));

    let result = if environment.is_production() {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .flatten_event(true),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_target(false).pretty())
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    };

    match result {
        Ok(()) => info!(?environment, "Tracing initialized"),
        Err(_) => debug!("Tracing already initialized"),
    }
}
