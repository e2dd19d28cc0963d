//! Core library for the `weather-panel` CLI.
//!
//! This crate defines:
//! - The panel state machine (actions, reducer, effects) and its async runtime
//! - The OpenWeather provider and geolocation sources
//! - Configuration and the last-location store
//! - Text rendering of the panel and the input bar
//!
//! It is used by `weather-panel`, but can also drive other front ends.

pub mod action;
pub mod config;
pub mod effect;
pub mod error;
pub mod geolocation;
pub mod input;
pub mod model;
pub mod panel;
pub mod provider;
pub mod reducer;
pub mod state;
pub mod storage;
pub mod view;

pub use action::{Action, Lookup};
pub use config::{Config, GeolocationConfig, GeolocationMode};
pub use error::{FetchError, LocationError, UnitsParseError};
pub use geolocation::{Geolocator, geolocator_from_config};
pub use model::{Coordinates, LocationQuery, Units, WeatherSnapshot};
pub use panel::WeatherPanel;
pub use provider::{WeatherProvider, default_provider_from_config, provider_from_config};
pub use state::PanelState;
pub use storage::{FileLocationStore, LocationStore, MemoryLocationStore};
