//! Device position for the automatic lookup.
//!
//! A terminal has no permission prompt, so the behaviour of a browser's
//! position capability is chosen in config: an IP-based estimate, fixed
//! coordinates, or an explicit denial/unsupported answer.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::{fmt::Debug, sync::Arc, time::Duration};

use crate::{
    config::{GeolocationConfig, GeolocationMode},
    error::LocationError,
    model::Coordinates,
};

const IP_API_URL: &str = "http://ip-api.com/json/";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("weather-panel/", env!("CARGO_PKG_VERSION"));

#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    async fn current_position(&self) -> Result<Coordinates, LocationError>;
}

/// Always answers with the configured coordinates.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocator(pub Coordinates);

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        Ok(self.0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DeniedGeolocator;

#[async_trait]
impl Geolocator for DeniedGeolocator {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        Err(LocationError::PermissionDenied)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedGeolocator;

#[async_trait]
impl Geolocator for UnsupportedGeolocator {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        Err(LocationError::Unsupported)
    }
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

/// Approximate position from the caller's public IP (ip-api.com).
#[derive(Debug, Clone)]
pub struct IpGeolocator {
    url: String,
    http: Client,
}

impl IpGeolocator {
    pub fn new() -> Result<Self, LocationError> {
        Self::with_url(IP_API_URL)
    }

    pub fn with_url(url: impl Into<String>) -> Result<Self, LocationError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| LocationError::Unavailable(e.to_string()))?;

        Ok(Self { url: url.into(), http })
    }
}

#[async_trait]
impl Geolocator for IpGeolocator {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        let response = self
            .http
            .get(&self.url)
            .query(&[("fields", "status,message,lat,lon")])
            .send()
            .await
            .map_err(|e| LocationError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LocationError::Unavailable(format!(
                "IP lookup returned status {}",
                response.status()
            )));
        }

        let body: IpApiResponse = response
            .json()
            .await
            .map_err(|e| LocationError::Unavailable(e.to_string()))?;

        match (body.status.as_str(), body.lat, body.lon) {
            ("success", Some(latitude), Some(longitude)) => {
                tracing::debug!(latitude, longitude, "IP geolocation resolved");
                Ok(Coordinates { latitude, longitude })
            }
            _ => Err(LocationError::Unavailable(
                body.message.unwrap_or_else(|| "IP lookup failed".to_string()),
            )),
        }
    }
}

/// Build the geolocator selected by `[geolocation]` in config.
pub fn geolocator_from_config(config: &GeolocationConfig) -> anyhow::Result<Arc<dyn Geolocator>> {
    let geolocator: Arc<dyn Geolocator> = match config.mode {
        GeolocationMode::Ip => Arc::new(IpGeolocator::new()?),
        GeolocationMode::Fixed => Arc::new(FixedGeolocator(config.fixed_coordinates()?)),
        GeolocationMode::Denied => Arc::new(DeniedGeolocator),
        GeolocationMode::Unsupported => Arc::new(UnsupportedGeolocator),
    };
    Ok(geolocator)
}
