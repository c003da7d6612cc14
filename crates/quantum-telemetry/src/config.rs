//! Telemetry configuration from environment variables.

/// Logging settings for an ordering service process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to the startup log line
    pub service_name: String,

    /// `EnvFilter` directive, e.g. `info` or `oc_02_solo=debug,info`
    pub log_level: String,

    /// Log to stdout at all
    pub console_output: bool,

    /// One JSON object per log line instead of human readable output
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "quantum-orderer".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Read `OTEL_SERVICE_NAME`, `QC_LOG_LEVEL` (falling back to `RUST_LOG`),
    /// `QC_CONSOLE_OUTPUT` and `QC_JSON_LOGS`.
    ///
    /// JSON logs default to on inside Docker or Kubernetes.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let in_container =
            lookup("KUBERNETES_SERVICE_HOST").is_some() || lookup("DOCKER_CONTAINER").is_some();

        Self {
            service_name: lookup("OTEL_SERVICE_NAME").unwrap_or(defaults.service_name),
            log_level: lookup("QC_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),
            console_output: lookup("QC_CONSOLE_OUTPUT")
                .map(|v| flag(&v))
                .unwrap_or(defaults.console_output),
            json_logs: lookup("QC_JSON_LOGS")
                .map(|v| flag(&v))
                .unwrap_or(in_container),
        }
    }
}

fn flag(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_empty_environment_uses_defaults() {
        assert_eq!(TelemetryConfig::from_lookup(lookup(&[])), TelemetryConfig::default());
    }

    #[test]
    fn test_qc_log_level_wins_over_rust_log() {
        let config = TelemetryConfig::from_lookup(lookup(&[
            ("QC_LOG_LEVEL", "debug"),
            ("RUST_LOG", "warn"),
        ]));
        assert_eq!(config.log_level, "debug");

        let config = TelemetryConfig::from_lookup(lookup(&[("RUST_LOG", "warn")]));
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_json_logs_in_containers() {
        let config = TelemetryConfig::from_lookup(lookup(&[("DOCKER_CONTAINER", "1")]));
        assert!(config.json_logs);

        let config = TelemetryConfig::from_lookup(lookup(&[
            ("DOCKER_CONTAINER", "1"),
            ("QC_JSON_LOGS", "false"),
        ]));
        assert!(!config.json_logs);
    }

    #[test]
    fn test_console_output_flag() {
        let config = TelemetryConfig::from_lookup(lookup(&[("QC_CONSOLE_OUTPUT", "0")]));
        assert!(!config.console_output);
    }
}
