use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Service configuration, passed explicitly to the collaborators it
/// concerns. Validated at startup so a missing geocoder identity fails fast
/// instead of surfacing mid-request.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub geocoder: GeocoderConfig,
    #[serde(default)]
    pub notify: Option<NotifyConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeocoderConfig {
    pub endpoint: String,
    /// Sent with every request; the public Nominatim instance rejects
    /// anonymous clients.
    pub user_agent: String,
    /// ISO country codes used as a forward-geocoding filter.
    #[serde(default)]
    pub country_codes: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotifyConfig {
    pub webhook_url: String,
}

fn default_timeout_secs() -> u64 {
    5
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.geocoder.endpoint.is_empty() {
            bail!("geocoder.endpoint is not configured; set it to the Nominatim base URL");
        }
        if self.geocoder.user_agent.is_empty() {
            bail!("geocoder.user_agent is not configured; the geocoding provider requires one");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(
            r#"
            [geocoder]
            endpoint = "https://nominatim.openstreetmap.org"
            user_agent = "quadra/0.1"
            country_codes = ["br"]

            [notify]
            webhook_url = "https://example.com/hook"
            "#,
        )
        .unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.geocoder.timeout_secs, 5);
        assert_eq!(config.geocoder.country_codes, vec!["br"]);
        assert!(config.notify.is_some());
    }

    #[test]
    fn test_missing_user_agent_fails_validation() {
        let config: Config = toml::from_str(
            r#"
            [geocoder]
            endpoint = "https://nominatim.openstreetmap.org"
            user_agent = ""
            "#,
        )
        .unwrap();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("user_agent"));
    }
}
