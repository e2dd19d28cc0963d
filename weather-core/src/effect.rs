//! Effects - side effects declared by the reducer

use crate::{
    action::Lookup,
    model::{LocationQuery, Units},
    state::RequestId,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Ask the geolocator for the device position
    Locate { request: RequestId },
    /// Fetch current weather from the provider
    FetchWeather {
        request: RequestId,
        lookup: Lookup,
        query: LocationQuery,
        units: Units,
    },
    /// Cancel whatever fetch is in flight
    CancelFetch,
    /// Overwrite the last-location slot
    PersistLocation(String),
    /// Read the last-location slot back into the query
    RestoreLastLocation,
}
