//! Error reporting, log output and shutdown handling shared by the
//! storefront and admin binaries.
//!
//! Warnings and errors become Sentry events, info and debug lines become
//! breadcrumbs on the next event. Without `SENTRY_DSN` only the log output is
//! installed.

use std::borrow::Cow;

use sentry::integrations::tracing::{self as sentry_tracing, EventFilter};
use tracing::{Level, Metadata};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::SentryConfig;

/// Start Sentry (when configured) and the tracing subscriber.
///
/// `default_filter` applies when `RUST_LOG` is unset. Keep the returned guard
/// alive for the life of the process; dropping it flushes pending events.
pub fn init(
    service: &'static str,
    sentry: &SentryConfig,
    default_filter: &str,
) -> Option<sentry::ClientInitGuard> {
    // The Sentry client has to exist before its tracing layer is registered.
    let guard = sentry.dsn.as_deref().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                server_name: Some(Cow::Borrowed(service)),
                environment: sentry.environment.clone().map(Cow::Owned),
                sample_rate: sentry.sample_rate,
                traces_sample_rate: sentry.traces_sample_rate,
                attach_stacktrace: true,
                ..Default::default()
            },
        ))
    });

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(classify_event))
        .init();

    if guard.is_some() {
        tracing::info!(service, "Error reporting enabled");
    }
    guard
}

fn classify_event(metadata: &Metadata<'_>) -> EventFilter {
    match *metadata.level() {
        Level::ERROR | Level::WARN => EventFilter::Event,
        Level::INFO | Level::DEBUG => EventFilter::Breadcrumb,
        Level::TRACE => EventFilter::Ignore,
    }
}

/// Resolves on Ctrl+C, or SIGTERM on unix, so in-flight orders can finish.
pub async fn shutdown_signal(service: &'static str) {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => {},
        () = terminate => {},
    }

    tracing::info!(service, "Draining connections before exit");
}

