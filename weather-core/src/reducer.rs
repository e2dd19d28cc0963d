//! Reducer - pure function: (state, action) -> DispatchResult

use tui_dispatch::DispatchResult;

use crate::{
    action::{Action, Lookup},
    effect::Effect,
    error::LocationError,
    model::{LocationQuery, Units},
    state::{
        CITY_NOT_FOUND, FETCH_FAILED, GEOLOCATION_DENIED, GEOLOCATION_UNSUPPORTED, PanelState,
    },
};

/// The reducer handles all state transitions
pub fn reducer(state: &mut PanelState, action: Action) -> DispatchResult<Effect> {
    match action {
        Action::Mount => {
            let request = state.start_locating();
            DispatchResult::changed_with(Effect::Locate { request })
        }

        // ===== Input bar =====
        Action::QueryChange(query) => {
            if state.query == query {
                return DispatchResult::unchanged();
            }
            state.query = query;
            DispatchResult::changed()
        }

        Action::Submit => {
            if state.query.is_empty() {
                return DispatchResult::unchanged();
            }
            let request = state.start_loading();
            DispatchResult::changed_with(Effect::FetchWeather {
                request,
                lookup: Lookup::Manual,
                query: LocationQuery::City(state.query.clone()),
                units: state.units,
            })
        }

        // ===== Units =====
        Action::SetUnits(units) => change_units(state, units),

        Action::ToggleUnits => {
            let units = state.units.toggle();
            change_units(state, units)
        }

        // ===== Geolocation =====
        Action::LocateDidSucceed { request, coordinates } => {
            if !state.finish_locating(request) {
                return DispatchResult::unchanged();
            }
            let request = state.start_loading();
            DispatchResult::changed_with(Effect::FetchWeather {
                request,
                lookup: Lookup::Automatic,
                query: LocationQuery::Coordinates(coordinates),
                units: state.units,
            })
        }

        Action::LocateDidFail { request, error } => {
            if !state.finish_locating(request) {
                return DispatchResult::unchanged();
            }
            let message = match error {
                LocationError::Unsupported => GEOLOCATION_UNSUPPORTED,
                LocationError::PermissionDenied | LocationError::Unavailable(_) => {
                    GEOLOCATION_DENIED
                }
            };
            state.error = Some(message.to_string());
            DispatchResult::changed_with(Effect::RestoreLastLocation)
        }

        // ===== Weather =====
        Action::WeatherDidLoad { request, lookup, query, snapshot } => {
            let city = snapshot.city.clone();
            if !state.settle_success(request, snapshot) {
                return DispatchResult::unchanged();
            }
            match (lookup, query) {
                (Lookup::Manual, Some(query)) => {
                    DispatchResult::changed_with(Effect::PersistLocation(query))
                }
                (Lookup::Manual, None) => DispatchResult::changed(),
                (Lookup::Automatic, _) => {
                    state.query = city;
                    DispatchResult::changed()
                }
            }
        }

        Action::WeatherDidFail { request, lookup, error } => {
            let message = match lookup {
                Lookup::Manual if error.is_rejection() => CITY_NOT_FOUND,
                _ => FETCH_FAILED,
            };
            if state.settle_failure(request, message) {
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }

        // ===== Storage =====
        Action::LastLocationRestored(Some(location)) if !location.is_empty() => {
            state.query = location;
            DispatchResult::changed()
        }

        Action::LastLocationRestored(_) => DispatchResult::unchanged(),
    }
}

/// Switch units, dropping the snapshot and any fetch made with the old ones,
/// and re-run the automatic lookup.
fn change_units(state: &mut PanelState, units: Units) -> DispatchResult<Effect> {
    if state.units == units {
        return DispatchResult::unchanged();
    }
    state.units = units;
    // Provider values are unit-specific; never show them under the new suffix.
    state.snapshot = None;

    let mut effects = Vec::with_capacity(2);
    if state.in_flight().is_some() {
        state.abandon_request();
        effects.push(Effect::CancelFetch);
    }
    let request = state.start_locating();
    effects.push(Effect::Locate { request });
    DispatchResult::changed_with_many(effects)
}
