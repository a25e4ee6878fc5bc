//! `cryptosphere-gateway` binary entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise the telemetry pipeline (JSON logs, optional OTLP spans).
//! 3. Build the codec from the configured key derivation parameters.
//! 4. Load field policies (policy file or the built-in CRM policy).
//! 5. Spawn the policy reload task when a policy file is configured.
//! 6. Build the Axum router and serve until Ctrl-C.

mod config;
mod policy;
mod records;
mod server;
mod telemetry;

use std::sync::Arc;

use anyhow::{Context, Result};
use cryptosphere::Codec;
use tracing::{info, warn};

use crate::config::Config;
use crate::policy::PolicyCache;
use crate::server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(cfg.otel_exporter_otlp_endpoint.as_deref(), &cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        listen_port = cfg.listen_port,
        "cryptosphere-gateway starting"
    );

    // -----------------------------------------------------------------------
    // 3. Codec
    // -----------------------------------------------------------------------
    if cfg.uses_builtin_kdf_secrets() {
        warn!("using the compiled-in KDF salt or secret suffix; supply CRYPTOSPHERE_KDF_SALT and CRYPTOSPHERE_KDF_SECRET_SUFFIX from a secret store");
    }
    let codec = Codec::new(cfg.codec_config()).context("invalid codec configuration")?;
    info!(
        key_id = codec.default_key_id(),
        algorithm = %codec.default_algorithm(),
        kdf_iterations = cfg.kdf_iterations,
        "codec ready"
    );

    // -----------------------------------------------------------------------
    // 4. Field policies
    // -----------------------------------------------------------------------
    let policies = PolicyCache::new();
    match &cfg.policy_path {
        Some(path) => policy::load_file(std::path::Path::new(path), &policies)
            .await
            .context("failed to load field policy")?,
        None => policy::load_builtin(&policies).context("built-in field policy is invalid")?,
    }
    if policies.is_empty() {
        warn!("field policy declares no entities; record endpoints will answer 404");
    }

    // -----------------------------------------------------------------------
    // 5. Background tasks
    // -----------------------------------------------------------------------
    let _policy_refresh = cfg.policy_path.as_ref().map(|path| {
        policy::refresh_task(
            path.into(),
            std::time::Duration::from_secs(cfg.policy_refresh_interval_secs),
            policies.clone(),
        )
    });

    // -----------------------------------------------------------------------
    // 6. HTTP server
    // -----------------------------------------------------------------------
    let state = AppState::new(Arc::new(codec), policies);
    let router = server::router::build(state);

    let addr: std::net::SocketAddr = ([0, 0, 0, 0], cfg.listen_port).into();
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("cryptosphere-gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
