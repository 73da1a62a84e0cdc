//! Nominatim forward-geocoding client.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::Geocoder;
use crate::config::GeocoderConfig;
use crate::models::GeoPoint;

/// Client for the Nominatim `/search` endpoint.
pub struct NominatimClient {
    client: Client,
    search_url: Url,
    /// Comma-joined country filter, empty when unrestricted.
    country_codes: String,
}

/// Nominatim returns coordinates as strings.
#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
}

impl NominatimClient {
    pub fn new(config: &GeocoderConfig) -> Result<Self> {
        let base = Url::parse(&config.endpoint)?;
        let search_url = base.join("search")?;
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            search_url,
            country_codes: config.country_codes.join(","),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn forward(&self, query: &str) -> Result<Option<GeoPoint>> {
        let mut attempts = 0;
        let max_attempts = 2;

        while attempts < max_attempts {
            attempts += 1;

            let mut request = self.client.get(self.search_url.clone()).query(&[
                ("q", query),
                ("format", "jsonv2"),
                ("limit", "1"),
            ]);
            if !self.country_codes.is_empty() {
                request = request.query(&[("countrycodes", self.country_codes.as_str())]);
            }

            let response = match request.send().await {
                Ok(r) => r,
                Err(e) => {
                    warn!(
                        "Geocoding request failed (attempt {}/{}): {}",
                        attempts, max_attempts, e
                    );
                    if attempts < max_attempts {
                        tokio::time::sleep(Duration::from_millis(500)).await;
                        continue;
                    }
                    return Ok(None);
                }
            };

            if !response.status().is_success() {
                warn!(
                    "Geocoder returned status {} (attempt {}/{})",
                    response.status(),
                    attempts,
                    max_attempts
                );
                if attempts < max_attempts {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    continue;
                }
                return Ok(None);
            }

            let hits: Vec<SearchHit> = match response.json().await {
                Ok(h) => h,
                Err(e) => {
                    warn!("Failed to parse geocoder response: {}", e);
                    return Ok(None);
                }
            };

            let Some(hit) = hits.into_iter().next() else {
                debug!("No geocoder result for {:?}", query);
                return Ok(None);
            };

            match (hit.lat.parse::<f64>(), hit.lon.parse::<f64>()) {
                (Ok(lat), Ok(lon)) => return Ok(Some(GeoPoint { lat, lon })),
                _ => {
                    warn!(
                        "Geocoder returned unparseable coordinates: {} {}",
                        hit.lat, hit.lon
                    );
                    return Ok(None);
                }
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(endpoint: &str) -> GeocoderConfig {
        GeocoderConfig {
            endpoint: endpoint.to_string(),
            user_agent: "quadra-test/0.1".to_string(),
            country_codes: vec!["br".to_string()],
            timeout_secs: 1,
        }
    }

    #[test]
    fn test_new_joins_search_path() {
        let client = NominatimClient::new(&config("https://nominatim.openstreetmap.org/")).unwrap();
        assert_eq!(
            client.search_url.as_str(),
            "https://nominatim.openstreetmap.org/search"
        );
        assert_eq!(client.country_codes, "br");
    }

    #[test]
    fn test_new_rejects_invalid_endpoint() {
        assert!(NominatimClient::new(&config("not a url")).is_err());
    }

    #[test]
    fn test_search_hit_parses_string_coordinates() {
        let hits: Vec<SearchHit> =
            serde_json::from_str(r#"[{"lat": "-23.5", "lon": "-46.6", "name": "x"}]"#).unwrap();
        assert_eq!(hits[0].lat.parse::<f64>().unwrap(), -23.5);
        assert_eq!(hits[0].lon.parse::<f64>().unwrap(), -46.6);
    }
}
