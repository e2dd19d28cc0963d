//! Actions - every input into the panel

use serde::{Deserialize, Serialize};

use crate::{
    error::{FetchError, LocationError},
    model::{Coordinates, Units, WeatherSnapshot},
    state::RequestId,
};

/// Which path started a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lookup {
    /// Typed city name confirmed with Enter.
    Manual,
    /// Device position, on mount and on unit change.
    Automatic,
}

/// Panel actions with category inference (`Locate*`, `Weather*`, ...)
#[derive(tui_dispatch::Action, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[action(infer_categories)]
pub enum Action {
    // ===== Lifecycle =====
    /// Panel became visible: run the automatic lookup.
    Mount,

    // ===== Input bar =====
    /// Query text changed
    QueryChange(String),

    /// Enter pressed in the input bar
    Submit,

    // ===== Units =====
    SetUnits(Units),
    ToggleUnits,

    // ===== Geolocation results =====
    LocateDidSucceed {
        request: RequestId,
        coordinates: Coordinates,
    },
    LocateDidFail {
        request: RequestId,
        error: LocationError,
    },

    // ===== Weather results =====
    WeatherDidLoad {
        request: RequestId,
        lookup: Lookup,
        /// Query text the manual request was sent with.
        query: Option<String>,
        snapshot: WeatherSnapshot,
    },
    WeatherDidFail {
        request: RequestId,
        lookup: Lookup,
        error: FetchError,
    },

    // ===== Storage =====
    /// Value read from the last-location store after a geolocation failure
    LastLocationRestored(Option<String>),
}
