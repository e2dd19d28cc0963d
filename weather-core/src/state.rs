//! Panel state - single source of truth

use serde::{Deserialize, Serialize};

use crate::model::{Units, WeatherSnapshot};

pub const CITY_NOT_FOUND: &str = "City not found";
pub const FETCH_FAILED: &str = "Unable to fetch weather data.";
pub const GEOLOCATION_DENIED: &str = "Geolocation permission denied.";
pub const GEOLOCATION_UNSUPPORTED: &str = "Geolocation is not supported on this device.";

/// Identity of one fetch or geolocation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub struct PanelState {
    /// Text in the input bar; empty means no query yet.
    pub query: String,
    pub units: Units,
    pub snapshot: Option<WeatherSnapshot>,
    pub error: Option<String>,
    pub loading: bool,

    next_request: u64,
    in_flight: Option<RequestId>,
    locating: Option<RequestId>,
}

impl PanelState {
    pub fn new(units: Units) -> Self {
        Self {
            query: String::new(),
            units,
            snapshot: None,
            error: None,
            loading: false,
            next_request: 0,
            in_flight: None,
            locating: None,
        }
    }

    fn allocate(&mut self) -> RequestId {
        self.next_request += 1;
        RequestId(self.next_request)
    }

    /// Begin a fetch. Any fetch started earlier becomes stale.
    pub fn start_loading(&mut self) -> RequestId {
        let id = self.allocate();
        self.in_flight = Some(id);
        self.loading = true;
        id
    }

    /// Settle the current fetch with a result. Returns false for stale ids.
    pub fn settle_success(&mut self, id: RequestId, snapshot: WeatherSnapshot) -> bool {
        if !self.is_current(id) {
            return false;
        }
        self.snapshot = Some(snapshot);
        self.error = None;
        self.finish();
        true
    }

    /// Settle the current fetch with an error. Returns false for stale ids.
    pub fn settle_failure(&mut self, id: RequestId, message: impl Into<String>) -> bool {
        if !self.is_current(id) {
            return false;
        }
        self.snapshot = None;
        self.error = Some(message.into());
        self.finish();
        true
    }

    /// Drop the current fetch without settling it.
    pub fn abandon_request(&mut self) {
        self.finish();
    }

    pub fn start_locating(&mut self) -> RequestId {
        let id = self.allocate();
        self.locating = Some(id);
        id
    }

    /// Close a geolocation request. Returns false for stale ids.
    pub fn finish_locating(&mut self, id: RequestId) -> bool {
        if self.locating != Some(id) {
            return false;
        }
        self.locating = None;
        true
    }

    pub fn is_current(&self, id: RequestId) -> bool {
        self.in_flight == Some(id)
    }

    pub fn in_flight(&self) -> Option<RequestId> {
        self.in_flight
    }

    /// True while a fetch or a geolocation request is outstanding.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some() || self.locating.is_some()
    }

    fn finish(&mut self) {
        self.in_flight = None;
        self.loading = false;
    }
}

impl Default for PanelState {
    fn default() -> Self {
        Self::new(Units::default())
    }
}
