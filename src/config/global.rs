// src/config/global.rs

use once_cell::sync::OnceCell;
use parking_lot::RwLock;

// -------------------------------------------------------
// Global Config Struct
// -------------------------------------------------------
#[derive(Clone)]
pub struct RelayGlobalConfig {
    /// Log each outbound payload body at INFO before sending
    pub log_payload_body: bool,

    /// Log each webhook response body at INFO
    pub log_response_body: bool,
}

impl Default for RelayGlobalConfig {
    fn default() -> Self {
        Self {
            log_payload_body: true,
            log_response_body: true,
        }
    }
}

static GLOBAL: OnceCell<RwLock<RelayGlobalConfig>> = OnceCell::new();


// -------------------------------------------------------
// INITIATE (GLOBAL INIT + TRACING SETUP)
// -------------------------------------------------------
pub fn initiate(cfg: RelayGlobalConfig) {
    use tracing_subscriber::{fmt, EnvFilter, prelude::*};

    // Build RUST_LOG + increlay fallback filter
    let base = EnvFilter::from_default_env();

    let filter = base
        .add_directive("increlay=debug".parse().unwrap_or_else(|_| "debug".parse().unwrap()))
        .add_directive("increlay::notifier=debug".parse().unwrap_or_else(|_| "debug".parse().unwrap()))
        .add_directive("increlay::receiver=debug".parse().unwrap_or_else(|_| "debug".parse().unwrap()))
        .add_directive("increlay::runner=debug".parse().unwrap_or_else(|_| "debug".parse().unwrap()));

    let fmt_layer = fmt::layer().with_target(true);

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer);

    let _ = subscriber.try_init();

    let cell = GLOBAL.get_or_init(|| RwLock::new(RelayGlobalConfig::default()));
    *cell.write() = cfg;

    tracing::info!(target: "increlay", "increlay global initiated");
}

// -------------------------------------------------------
// GETTER
// -------------------------------------------------------
pub fn global() -> RelayGlobalConfig {
    GLOBAL
        .get()
        .map(|g| g.read().clone())
        .unwrap_or_default()
}
