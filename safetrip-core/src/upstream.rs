//! Shared plumbing for the upstream HTTP data providers.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ProviderError;

const USER_AGENT: &str = concat!("SafeTrip/", env!("CARGO_PKG_VERSION"));

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Parse query-string coordinates. Both must be present and numeric.
    pub fn parse(lat: Option<&str>, lon: Option<&str>) -> Option<Self> {
        let lat = lat?.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
        let lon = lon?.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
        Some(Self { lat, lon })
    }

    /// Parse coordinates, substituting 0 for anything missing or non-numeric.
    pub fn parse_or_origin(lat: Option<&str>, lon: Option<&str>) -> Self {
        let parse = |v: Option<&str>| {
            v.and_then(|s| s.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite())
                .unwrap_or(0.0)
        };
        Self {
            lat: parse(lat),
            lon: parse(lon),
        }
    }

    /// Parse a `"lng,lat"` pair as used by the directions API.
    pub fn parse_lng_lat(value: &str) -> Option<Self> {
        let (lng, lat) = value.split_once(',')?;
        Self::parse(Some(lat), Some(lng))
    }

    /// Format as a `"lng,lat"` pair.
    pub fn to_lng_lat(&self) -> String {
        format!("{},{}", self.lon, self.lat)
    }

    /// Shift both axes by the same number of degrees.
    pub fn offset(&self, degrees: f64) -> Self {
        Self {
            lat: self.lat + degrees,
            lon: self.lon + degrees,
        }
    }
}

/// Build an HTTP client with the given request timeout.
pub fn build_client(provider: &str, timeout_secs: u64) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| ProviderError::Request {
            provider: provider.to_string(),
            message: format!("Failed to create HTTP client: {e}"),
        })
}

/// GET a URL and decode the JSON body.
pub async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    provider: &str,
    url: reqwest::Url,
    timeout_secs: u64,
) -> Result<T, ProviderError> {
    let response = client
        .get(url)
        .timeout(Duration::from_secs(timeout_secs))
        .send()
        .await
        .map_err(|e| ProviderError::request(provider, e))?;

    if !response.status().is_success() {
        return Err(ProviderError::Status {
            provider: provider.to_string(),
            status: response.status().as_u16(),
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ProviderError::ResponseParse {
            provider: provider.to_string(),
            message: e.to_string(),
        })
}

/// Build a URL with query parameters, mapping parse failures to a provider error.
pub fn url_with_params<I, K, V>(
    provider: &str,
    base: &str,
    params: I,
) -> Result<reqwest::Url, ProviderError>
where
    I: IntoIterator,
    I::Item: std::borrow::Borrow<(K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    reqwest::Url::parse_with_params(base, params).map_err(|e| ProviderError::Request {
        provider: provider.to_string(),
        message: format!("Invalid URL: {e}"),
    })
}
