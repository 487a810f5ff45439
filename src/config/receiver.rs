use std::env;

#[derive(Clone, Debug)]
pub struct ReceiverConfig {
    /// Listen address for the webhook endpoints, e.g. "0.0.0.0:8443".
    pub bind_addr: String,

    /// Automation command line (program plus arguments). None means accepted
    /// jobs are logged instead of executed.
    pub automation_cmd: Option<Vec<String>>,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8443".to_string(),
            automation_cmd: None,
        }
    }
}

impl ReceiverConfig {
    /// Defaults overridden by INCRELAY_BIND_ADDR and INCRELAY_AUTOMATION_CMD
    /// (a whitespace-split command line).
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(addr) = env::var("INCRELAY_BIND_ADDR") {
            if !addr.trim().is_empty() {
                cfg.bind_addr = addr;
            }
        }
        if let Ok(cmd) = env::var("INCRELAY_AUTOMATION_CMD") {
            let parts: Vec<String> = cmd.split_whitespace().map(str::to_string).collect();
            if !parts.is_empty() {
                cfg.automation_cmd = Some(parts);
            }
        }
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // Single test so the env mutations cannot race each other.
    #[test]
    fn from_env_layers_over_defaults() {
        env::remove_var("INCRELAY_BIND_ADDR");
        env::remove_var("INCRELAY_AUTOMATION_CMD");
        let cfg = ReceiverConfig::from_env();
        assert_eq!(cfg.bind_addr, "0.0.0.0:8443");
        assert_eq!(cfg.automation_cmd, None);

        env::set_var("INCRELAY_BIND_ADDR", "127.0.0.1:9090");
        env::set_var("INCRELAY_AUTOMATION_CMD", "ansible-playbook -i hosts fix.yml");
        let cfg = ReceiverConfig::from_env();
        assert_eq!(cfg.bind_addr, "127.0.0.1:9090");
        assert_eq!(
            cfg.automation_cmd.as_deref(),
            Some(&["ansible-playbook".to_string(), "-i".to_string(), "hosts".to_string(), "fix.yml".to_string()][..])
        );

        env::set_var("INCRELAY_AUTOMATION_CMD", "   ");
        let cfg = ReceiverConfig::from_env();
        assert_eq!(cfg.automation_cmd, None);

        env::remove_var("INCRELAY_BIND_ADDR");
        env::remove_var("INCRELAY_AUTOMATION_CMD");
    }
}
