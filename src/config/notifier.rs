use std::env;

#[derive(Clone, Debug)]
pub struct NotifierConfig {
    /// Webhook base URL; the record number is appended as one path segment.
    pub base_url: String,

    /// Whole-request timeout for the outbound POST (seconds).
    pub timeout_secs: u64,

    /// Upper bound on the reporter email lookup (seconds); on expiry the
    /// dispatch proceeds with a null reported_by_email.
    pub lookup_timeout_secs: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8443/servicenow".to_string(),
            timeout_secs: 30,
            lookup_timeout_secs: 5,
        }
    }
}

impl NotifierConfig {
    /// Defaults overridden by INCRELAY_BASE_URL, INCRELAY_HTTP_TIMEOUT_SECS
    /// and INCRELAY_LOOKUP_TIMEOUT_SECS. Unset, empty or unparseable values
    /// keep the default.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(url) = env::var("INCRELAY_BASE_URL") {
            if !url.trim().is_empty() {
                cfg.base_url = url;
            }
        }
        if let Some(secs) = env_secs("INCRELAY_HTTP_TIMEOUT_SECS") {
            cfg.timeout_secs = secs;
        }
        if let Some(secs) = env_secs("INCRELAY_LOOKUP_TIMEOUT_SECS") {
            cfg.lookup_timeout_secs = secs;
        }
        cfg
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

fn env_secs(var: &str) -> Option<u64> {
    env::var(var).ok()?.trim().parse().ok()
}
