use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use inquire::{CustomType, Password, PasswordDisplayMode, Select};
use weather_panel_core::{
    Config, FileLocationStore, GeolocationConfig, GeolocationMode, LocationStore,
    MemoryLocationStore, PanelState, Units, WeatherPanel, default_provider_from_config,
    geolocator_from_config, input, view,
};

use crate::interactive;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-panel", version, about = "Current weather in the terminal")]
pub struct Cli {
    /// Keep the last searched location in memory only.
    #[arg(long, global = true)]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the API key, units and geolocation source.
    Configure,

    /// Show the weather once and exit.
    Show {
        /// City name; when absent, the device position is used.
        city: Option<String>,

        /// Unit system, "metric" or "imperial"; defaults to the configured one.
        #[arg(long)]
        units: Option<Units>,
    },

    /// Open the interactive panel (default).
    Interactive {
        /// Unit system, "metric" or "imperial"; defaults to the configured one.
        #[arg(long)]
        units: Option<Units>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command.unwrap_or(Command::Interactive { units: None }) {
            Command::Configure => configure(),
            Command::Show { city, units } => {
                let config = Config::load()?;
                let mut panel = build_panel(&config, units, self.ephemeral)?;
                show(&mut panel, city).await
            }
            Command::Interactive { units } => {
                let config = Config::load()?;
                let panel = build_panel(&config, units, self.ephemeral)?;
                interactive::run(panel).await
            }
        }
    }
}

fn build_panel(config: &Config, units: Option<Units>, ephemeral: bool) -> Result<WeatherPanel> {
    let provider = default_provider_from_config(config)?;
    let geolocator = geolocator_from_config(&config.geolocation)?;
    tracing::debug!(?provider, ?geolocator, ephemeral, "building panel");
    let store: Box<dyn LocationStore> = if ephemeral {
        Box::new(MemoryLocationStore::default())
    } else {
        Box::new(FileLocationStore::open_default()?)
    };

    Ok(WeatherPanel::new(provider, geolocator, store, units.unwrap_or(config.units)))
}

async fn show(panel: &mut WeatherPanel, city: Option<String>) -> Result<()> {
    match city {
        Some(city) => {
            tracing::debug!(%city, "manual lookup");
            for action in input::submit_line(&city) {
                panel.dispatch(action);
            }
        }
        None => {
            tracing::debug!("automatic lookup");
            panel.mount();
        }
    }
    panel.settle().await;

    let state = panel.state();
    if state.snapshot.is_none() {
        let reason = state.error.clone().unwrap_or_else(|| "No weather data".to_string());
        return Err(anyhow!(reason));
    }
    print_panel(state);
    Ok(())
}

/// Print the panel body for the current wall-clock date.
pub fn print_panel(state: &PanelState) {
    let today = chrono::Local::now();
    for line in view::render(state, &today) {
        println!("{line}");
    }
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Leave empty to keep the current key")
        .prompt()?;
    if !api_key.trim().is_empty() {
        config.set_api_key(api_key.trim().to_string());
    } else if config.api_key.is_none() {
        println!("No API key stored; set OPENWEATHER_API_KEY before running lookups.");
    }

    let current_units = Units::all().iter().position(|u| *u == config.units).unwrap_or(0);
    config.units = Select::new("Units:", Units::all().to_vec())
        .with_starting_cursor(current_units)
        .prompt()?;

    let current_mode = GeolocationMode::all()
        .iter()
        .position(|m| *m == config.geolocation.mode)
        .unwrap_or(0);
    let mode = Select::new("Geolocation source:", GeolocationMode::all().to_vec())
        .with_starting_cursor(current_mode)
        .prompt()?;

    config.geolocation = match mode {
        GeolocationMode::Fixed => {
            let latitude = CustomType::<f64>::new("Latitude:")
                .with_error_message("Please type a number, e.g. 51.5")
                .prompt()?;
            let longitude = CustomType::<f64>::new("Longitude:")
                .with_error_message("Please type a number, e.g. -0.12")
                .prompt()?;
            GeolocationConfig {
                mode,
                latitude: Some(latitude),
                longitude: Some(longitude),
            }
        }
        _ => GeolocationConfig { mode, ..GeolocationConfig::default() },
    };

    config.save()?;
    println!("Configuration saved to {}", Config::config_file_path()?.display());
    Ok(())
}
