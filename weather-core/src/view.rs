//! Text rendering of the panel.

use chrono::Datelike;

use crate::{
    model::{Units, WeatherSnapshot},
    state::PanelState,
};

/// Miles per hour in one metre per second, as shown by the panel.
pub const MPS_TO_MPH: f64 = 2.237;

const WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// `<weekday> <day> <month> <year>` with English names, e.g. `Monday 19 October 2026`.
pub fn date_line<D: Datelike>(date: &D) -> String {
    let weekday = WEEKDAYS[date.weekday().num_days_from_sunday() as usize];
    let month = MONTHS[date.month0() as usize];
    format!("{weekday} {} {month} {}", date.day(), date.year())
}

/// Whole degrees with the unit letter, e.g. `12°C`.
pub fn format_temperature(value: f64, units: Units) -> String {
    // `+ 0.0` turns -0 into 0
    let whole = value.round() + 0.0;
    format!("{whole:.0}°{}", units.temperature_suffix())
}

pub fn format_wind_speed(speed: f64, units: Units) -> String {
    match units {
        Units::Metric => format!("{speed} m/s"),
        Units::Imperial => format!("{:.2} mph", speed * MPS_TO_MPH),
    }
}

pub fn format_location(snapshot: &WeatherSnapshot) -> String {
    if snapshot.country.is_empty() {
        snapshot.city.clone()
    } else {
        format!("{}, {}", snapshot.city, snapshot.country)
    }
}

/// Lines of the result block for one snapshot.
pub fn render_snapshot<D: Datelike>(
    snapshot: &WeatherSnapshot,
    units: Units,
    now: &D,
) -> Vec<String> {
    vec![
        date_line(now),
        format_location(snapshot),
        format!("{} ({})", format_temperature(snapshot.temperature, units), snapshot.icon),
        snapshot.description.clone(),
        format!("Humidity: {}%", snapshot.humidity),
        format!("Wind speed: {}", format_wind_speed(snapshot.wind_speed, units)),
    ]
}

/// Full panel body: the loading line, or the error and/or result block.
pub fn render<D: Datelike>(state: &PanelState, now: &D) -> Vec<String> {
    if state.loading {
        return vec!["Loading...".to_string()];
    }

    let mut lines = Vec::new();
    if let Some(error) = &state.error {
        lines.push(format!("Error: {error}"));
    }
    if let Some(snapshot) = &state.snapshot {
        lines.extend(render_snapshot(snapshot, state.units, now));
    }
    lines
}
