// ============================================================================
// Geo Locator Module
// ============================================================================
// City/country lookup against ip-api.com

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

const API_BASE_URL: &str = "http://ip-api.com/json";
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub city: String,
    pub country: String,
}

#[derive(Debug, Deserialize)]
struct ApiGeoResponse {
    status: String,
    message: Option<String>,
    city: Option<String>,
    country: Option<String>,
}

pub struct GeoLocator {
    client: reqwest::Client,
    base_url: String,
}

impl GeoLocator {
    pub fn new() -> Result<Self> {
        Self::with_base_url(API_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Look up `ip`; any failure is logged and yields `None`.
    pub async fn locate(&self, ip: &str) -> Option<GeoLocation> {
        match self.fetch(ip).await {
            Ok(Some(location)) => {
                info!("Location for {}: {}, {}", ip, location.city, location.country);
                Some(location)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Error fetching location for {}: {:#}", ip, e);
                None
            }
        }
    }

    async fn fetch(&self, ip: &str) -> Result<Option<GeoLocation>> {
        let url = format!("{}/{}", self.base_url, ip);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch location for {}", ip))?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Geolocation request failed with status: {} for {}",
                response.status(),
                ip
            ));
        }

        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read location response for {}", ip))?;

        let location = parse_geo_response(&body)?;
        if location.is_none() {
            warn!("Could not get location for {}", ip);
        }
        Ok(location)
    }
}

/// `None` when ip-api reports anything but `"status": "success"`
pub fn parse_geo_response(body: &str) -> Result<Option<GeoLocation>> {
    let response: ApiGeoResponse =
        serde_json::from_str(body).context("Failed to parse geolocation response")?;

    if response.status != "success" {
        if let Some(message) = response.message {
            warn!("ip-api lookup failed: {}", message);
        }
        return Ok(None);
    }

    Ok(Some(GeoLocation {
        city: response.city.unwrap_or_default(),
        country: response.country.unwrap_or_default(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_success() {
        let body = r#"{"status":"success","country":"Netherlands","countryCode":"NL","city":"Amsterdam","lat":52.37,"lon":4.89,"query":"10.0.0.5"}"#;
        assert_eq!(
            parse_geo_response(body).unwrap(),
            Some(GeoLocation {
                city: "Amsterdam".to_string(),
                country: "Netherlands".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_fail_status() {
        let body = r#"{"status":"fail","message":"private range","query":"10.0.0.5"}"#;
        assert_eq!(parse_geo_response(body).unwrap(), None);
    }

    #[test]
    fn test_parse_missing_fields() {
        let body = r#"{"status":"success","country":"Japan"}"#;
        let location = parse_geo_response(body).unwrap().unwrap();
        assert_eq!(location.city, "");
        assert_eq!(location.country, "Japan");
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_geo_response("<html>rate limited</html>").is_err());
    }

    #[tokio::test]
    async fn test_unreachable_service_yields_none() {
        let locator = GeoLocator::with_base_url("http://127.0.0.1:9/json/").unwrap();
        assert_eq!(locator.base_url, "http://127.0.0.1:9/json");
        assert_eq!(locator.locate("10.0.0.5").await, None);
    }
}
