use crate::{
    Config, FetchError, LocationQuery, Units, WeatherSnapshot,
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn get_weather(
        &self,
        query: &LocationQuery,
        units: Units,
    ) -> Result<WeatherSnapshot, FetchError>;
}

/// Construct the OpenWeather provider from config and the resolved API key.
pub fn provider_from_config(
    config: &Config,
    api_key: String,
) -> Arc<dyn WeatherProvider> {
    let provider = match config.base_url.as_deref() {
        Some(base_url) => OpenWeatherProvider::with_base_url(api_key, base_url),
        None => OpenWeatherProvider::new(api_key),
    };
    Arc::new(provider)
}

/// Construct the provider, reading the API key from the environment or config.
pub fn default_provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let api_key = config.api_key()?;
    Ok(provider_from_config(config, api_key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_from_config_honours_base_url() {
        let cfg = Config {
            base_url: Some("http://localhost:9999/".into()),
            ..Config::default()
        };

        let provider = provider_from_config(&cfg, "KEY".into());
        let debug = format!("{provider:?}");
        assert!(debug.contains("http://localhost:9999"));
        assert!(!debug.contains("9999/\""));
    }

    #[test]
    fn provider_from_config_defaults_to_openweather() {
        let provider = provider_from_config(&Config::default(), "KEY".into());
        assert!(format!("{provider:?}").contains(openweather::DEFAULT_BASE_URL));
    }
}
