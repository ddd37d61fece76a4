//! Default configuration values
//!
//! Printed by `bimbridge-server --print-default-config`.

/// Default configuration as TOML
pub const DEFAULT_CONFIG_TOML: &str = r##"
# bimbridge configuration

[server]
listen_addr = "127.0.0.1:48884"
# routes live under /<api_name>/
api_name = "bimbridge"

[bridge]
# bounded wait for a job's result
job_timeout_ms = 20000

[document]
title = "Untitled"
# seed_path = "/path/to/document.json"

[metrics]
enabled = true
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn test_default_toml_matches_defaults() {
        let parsed: AppConfig = toml::from_str(DEFAULT_CONFIG_TOML).unwrap();
        assert_eq!(parsed, AppConfig::default());
    }
}
