//! The weather panel runtime.
//!
//! Owns an [`EffectStore`] over [`PanelState`], applies actions through the
//! reducer, and runs the returned effects. Geolocation and weather requests
//! run as keyed tasks; a newer request under the same key aborts the older
//! one. Task results come back as actions on a channel.

use std::{collections::VecDeque, panic::AssertUnwindSafe, sync::Arc};

use futures_util::FutureExt;
use tokio::sync::mpsc;
use tui_dispatch::{EffectStore, TaskKey, TaskManager};

use crate::{
    action::{Action, Lookup},
    effect::Effect,
    error::{FetchError, LocationError},
    geolocation::Geolocator,
    model::{LocationQuery, Units},
    provider::WeatherProvider,
    reducer::reducer,
    state::PanelState,
    storage::LocationStore,
};

const LOCATE_TASK: &str = "locate";
const WEATHER_TASK: &str = "weather";

pub struct WeatherPanel {
    store: EffectStore<PanelState, Action, Effect>,
    provider: Arc<dyn WeatherProvider>,
    geolocator: Arc<dyn Geolocator>,
    locations: Box<dyn LocationStore>,
    tasks: TaskManager<Action>,
    results: mpsc::UnboundedReceiver<Action>,
}

impl WeatherPanel {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        geolocator: Arc<dyn Geolocator>,
        locations: Box<dyn LocationStore>,
        units: Units,
    ) -> Self {
        let (action_tx, results) = mpsc::unbounded_channel();
        Self {
            store: EffectStore::new(PanelState::new(units), reducer),
            provider,
            geolocator,
            locations,
            tasks: TaskManager::new(action_tx),
            results,
        }
    }

    pub fn state(&self) -> &PanelState {
        self.store.state()
    }

    /// Run the automatic lookup, as on first display.
    pub fn mount(&mut self) -> bool {
        self.dispatch(Action::Mount)
    }

    /// Apply an action, and any action its effects produce synchronously.
    /// Returns true if state changed.
    ///
    /// Spawns tasks, so it must be called from within a tokio runtime.
    pub fn dispatch(&mut self, action: Action) -> bool {
        let mut queue = VecDeque::from([action]);
        let mut changed = false;

        while let Some(next_action) = queue.pop_front() {
            tracing::trace!(action = ?next_action, "dispatch");
            let result = self.store.dispatch(next_action);
            changed |= result.changed;
            for effect in result.effects {
                self.handle_effect(effect, &mut queue);
            }
        }
        changed
    }

    fn handle_effect(&mut self, effect: Effect, queue: &mut VecDeque<Action>) {
        match effect {
            Effect::Locate { request } => {
                let geolocator = Arc::clone(&self.geolocator);
                self.tasks.spawn(LOCATE_TASK, async move {
                    let located = AssertUnwindSafe(geolocator.current_position())
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|_| {
                            tracing::error!("geolocation task panicked");
                            Err(LocationError::Unavailable("geolocation task panicked".into()))
                        });
                    match located {
                        Ok(coordinates) => Action::LocateDidSucceed { request, coordinates },
                        Err(error) => {
                            tracing::info!(%error, "geolocation unavailable");
                            Action::LocateDidFail { request, error }
                        }
                    }
                });
            }

            Effect::FetchWeather { request, lookup, query, units } => {
                let provider = Arc::clone(&self.provider);
                self.tasks.spawn(WEATHER_TASK, async move {
                    let fetched = AssertUnwindSafe(provider.get_weather(&query, units))
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|_| {
                            tracing::error!(?lookup, "weather task panicked");
                            Err(FetchError::Network("weather task panicked".into()))
                        });
                    match fetched {
                        Ok(snapshot) => {
                            tracing::info!(city = %snapshot.city, ?lookup, "weather loaded");
                            let query = match (lookup, query) {
                                (Lookup::Manual, LocationQuery::City(name)) => Some(name),
                                _ => None,
                            };
                            Action::WeatherDidLoad { request, lookup, query, snapshot }
                        }
                        Err(error) => {
                            tracing::warn!(%error, ?lookup, "weather lookup failed");
                            Action::WeatherDidFail { request, lookup, error }
                        }
                    }
                });
            }

            Effect::CancelFetch => {
                tracing::debug!("cancelling weather fetch");
                self.tasks.cancel(&TaskKey::new(WEATHER_TASK));
            }

            Effect::PersistLocation(location) => {
                if let Err(err) = self.locations.remember(&location) {
                    tracing::warn!("Failed to store last location: {err:#}");
                }
            }

            Effect::RestoreLastLocation => {
                let restored = self.locations.last_location().unwrap_or_else(|err| {
                    tracing::warn!("Failed to read last location: {err:#}");
                    None
                });
                queue.push_back(Action::LastLocationRestored(restored));
            }
        }
    }

    /// True when no geolocation or weather request is outstanding.
    pub fn is_idle(&self) -> bool {
        !self.state().is_busy()
    }

    /// Wait for one background result and apply it.
    ///
    /// Returns false when nothing was outstanding.
    pub async fn step(&mut self) -> bool {
        if self.is_idle() {
            return false;
        }
        match self.results.recv().await {
            Some(action) => {
                self.dispatch(action);
                true
            }
            None => false,
        }
    }

    /// Drive background work until no request is outstanding.
    pub async fn settle(&mut self) {
        while self.step().await {}
    }
}

impl std::fmt::Debug for WeatherPanel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherPanel")
            .field("state", self.state())
            .field("provider", &self.provider)
            .field("geolocator", &self.geolocator)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        geolocation::{DeniedGeolocator, FixedGeolocator, UnsupportedGeolocator},
        model::{Coordinates, WeatherSnapshot},
        state::{CITY_NOT_FOUND, FETCH_FAILED, GEOLOCATION_DENIED},
        storage::MemoryLocationStore,
    };
    use async_trait::async_trait;
    use std::{sync::Mutex, time::Duration};

    /// Answers from a canned result and records every request.
    #[derive(Debug)]
    struct StubProvider {
        result: Result<WeatherSnapshot, FetchError>,
        calls: Mutex<Vec<(LocationQuery, Units)>>,
    }

    impl StubProvider {
        fn ok(snapshot: WeatherSnapshot) -> Arc<Self> {
            Arc::new(Self { result: Ok(snapshot), calls: Mutex::new(Vec::new()) })
        }

        fn err(error: FetchError) -> Arc<Self> {
            Arc::new(Self { result: Err(error), calls: Mutex::new(Vec::new()) })
        }

        fn calls(&self) -> Vec<(LocationQuery, Units)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WeatherProvider for StubProvider {
        async fn get_weather(
            &self,
            query: &LocationQuery,
            units: Units,
        ) -> Result<WeatherSnapshot, FetchError> {
            self.calls.lock().unwrap().push((query.clone(), units));
            self.result.clone()
        }
    }

    /// Sleeps per query kind before answering; the city name is echoed back.
    #[derive(Debug)]
    struct TimedProvider {
        city_delay: Duration,
        position_delay: Duration,
        calls: Mutex<Vec<LocationQuery>>,
    }

    impl TimedProvider {
        fn new(city_delay_ms: u64, position_delay_ms: u64) -> Arc<Self> {
            Arc::new(Self {
                city_delay: Duration::from_millis(city_delay_ms),
                position_delay: Duration::from_millis(position_delay_ms),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<LocationQuery> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WeatherProvider for TimedProvider {
        async fn get_weather(
            &self,
            query: &LocationQuery,
            _units: Units,
        ) -> Result<WeatherSnapshot, FetchError> {
            self.calls.lock().unwrap().push(query.clone());
            let (delay, snapshot) = match query {
                LocationQuery::City(name) => {
                    (self.city_delay, WeatherSnapshot { city: name.clone(), ..london() })
                }
                LocationQuery::Coordinates(_) => (self.position_delay, london()),
            };
            tokio::time::sleep(delay).await;
            Ok(snapshot)
        }
    }

    #[derive(Debug)]
    struct PanickingProvider;

    #[async_trait]
    impl WeatherProvider for PanickingProvider {
        async fn get_weather(
            &self,
            _query: &LocationQuery,
            _units: Units,
        ) -> Result<WeatherSnapshot, FetchError> {
            panic!("provider blew up")
        }
    }

    /// Answers with a fixed position after a delay.
    #[derive(Debug)]
    struct SlowGeolocator {
        delay: Duration,
        position: Coordinates,
    }

    #[async_trait]
    impl Geolocator for SlowGeolocator {
        async fn current_position(&self) -> Result<Coordinates, LocationError> {
            tokio::time::sleep(self.delay).await;
            Ok(self.position)
        }
    }

    #[derive(Debug, Clone, Default)]
    struct SharedStore(Arc<Mutex<MemoryLocationStore>>);

    impl LocationStore for SharedStore {
        fn last_location(&self) -> anyhow::Result<Option<String>> {
            self.0.lock().unwrap().last_location()
        }

        fn remember(&mut self, location: &str) -> anyhow::Result<()> {
            self.0.lock().unwrap().remember(location)
        }
    }

    fn london() -> WeatherSnapshot {
        WeatherSnapshot {
            city: "London".into(),
            country: "GB".into(),
            temperature: 11.6,
            humidity: 81,
            wind_speed: 4.1,
            description: "overcast clouds".into(),
            icon: "04d".into(),
        }
    }

    fn here() -> Coordinates {
        Coordinates { latitude: 51.51, longitude: -0.13 }
    }

    #[tokio::test]
    async fn manual_lookup_settles_with_snapshot_and_persists() {
        let provider = StubProvider::ok(london());
        let store = SharedStore::default();
        let mut panel = WeatherPanel::new(
            provider.clone(),
            Arc::new(DeniedGeolocator),
            Box::new(store.clone()),
            Units::Metric,
        );

        panel.dispatch(Action::QueryChange("London".into()));
        panel.dispatch(Action::Submit);
        assert!(panel.state().loading);

        panel.settle().await;

        let state = panel.state();
        assert!(!state.loading);
        assert_eq!(state.error, None);
        assert_eq!(state.snapshot, Some(london()));
        assert_eq!(store.last_location().unwrap().as_deref(), Some("London"));
        assert_eq!(
            provider.calls(),
            vec![(LocationQuery::City("London".into()), Units::Metric)]
        );
    }

    #[tokio::test]
    async fn empty_query_makes_no_request() {
        let provider = StubProvider::ok(london());
        let mut panel = WeatherPanel::new(
            provider.clone(),
            Arc::new(DeniedGeolocator),
            Box::new(MemoryLocationStore::default()),
            Units::Metric,
        );
        let before = panel.state().clone();

        assert!(!panel.dispatch(Action::Submit));
        assert!(panel.is_idle());
        panel.settle().await;

        assert_eq!(panel.state(), &before);
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn manual_rejection_sets_city_not_found() {
        let provider = StubProvider::err(FetchError::Status { status: 404, body: "{}".into() });
        let store = SharedStore::default();
        let mut panel = WeatherPanel::new(
            provider,
            Arc::new(DeniedGeolocator),
            Box::new(store.clone()),
            Units::Metric,
        );

        panel.dispatch(Action::QueryChange("Atlantis".into()));
        panel.dispatch(Action::Submit);
        panel.settle().await;

        assert_eq!(panel.state().error.as_deref(), Some(CITY_NOT_FOUND));
        assert_eq!(panel.state().snapshot, None);
        assert_eq!(store.last_location().unwrap(), None);
    }

    #[tokio::test]
    async fn mount_uses_position_and_fills_query() {
        let provider = StubProvider::ok(london());
        let mut panel = WeatherPanel::new(
            provider.clone(),
            Arc::new(FixedGeolocator(here())),
            Box::new(MemoryLocationStore::default()),
            Units::Metric,
        );

        panel.mount();
        panel.settle().await;

        assert_eq!(panel.state().query, "London");
        assert_eq!(panel.state().snapshot, Some(london()));
        assert_eq!(
            provider.calls(),
            vec![(LocationQuery::Coordinates(here()), Units::Metric)]
        );
    }

    #[tokio::test]
    async fn denied_geolocation_restores_stored_location_without_fetching() {
        let provider = StubProvider::ok(london());
        let mut panel = WeatherPanel::new(
            provider.clone(),
            Arc::new(DeniedGeolocator),
            Box::new(MemoryLocationStore::with_last_location("Paris")),
            Units::Metric,
        );

        panel.mount();
        panel.settle().await;

        assert_eq!(panel.state().query, "Paris");
        assert_eq!(panel.state().error.as_deref(), Some(GEOLOCATION_DENIED));
        assert!(!panel.state().loading);
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn unsupported_geolocation_without_stored_location() {
        let provider = StubProvider::ok(london());
        let mut panel = WeatherPanel::new(
            provider.clone(),
            Arc::new(UnsupportedGeolocator),
            Box::new(MemoryLocationStore::default()),
            Units::Metric,
        );

        panel.mount();
        panel.settle().await;

        assert_eq!(panel.state().query, "");
        assert!(panel.state().error.is_some());
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn toggling_units_reruns_automatic_lookup() {
        let provider = StubProvider::ok(london());
        let mut panel = WeatherPanel::new(
            provider.clone(),
            Arc::new(FixedGeolocator(here())),
            Box::new(MemoryLocationStore::default()),
            Units::Metric,
        );

        panel.mount();
        panel.settle().await;
        panel.dispatch(Action::ToggleUnits);
        panel.settle().await;

        assert_eq!(panel.state().units, Units::Imperial);
        assert_eq!(
            provider.calls(),
            vec![
                (LocationQuery::Coordinates(here()), Units::Metric),
                (LocationQuery::Coordinates(here()), Units::Imperial),
            ]
        );
    }

    #[tokio::test]
    async fn unit_change_cancels_pending_geolocation() {
        let provider = StubProvider::ok(london());
        let mut panel = WeatherPanel::new(
            provider.clone(),
            Arc::new(SlowGeolocator { delay: Duration::from_millis(20), position: here() }),
            Box::new(MemoryLocationStore::default()),
            Units::Metric,
        );

        panel.mount();
        panel.dispatch(Action::ToggleUnits);
        assert!(!panel.is_idle());
        panel.settle().await;

        assert!(panel.is_idle());
        assert!(!panel.state().loading);
        // Only the position requested after the toggle is used.
        assert_eq!(
            provider.calls(),
            vec![(LocationQuery::Coordinates(here()), Units::Imperial)]
        );
    }

    #[tokio::test]
    async fn position_arriving_after_submit_supersedes_manual_lookup() {
        let provider = TimedProvider::new(200, 10);
        let store = SharedStore::default();
        let mut panel = WeatherPanel::new(
            provider.clone(),
            Arc::new(SlowGeolocator { delay: Duration::from_millis(30), position: here() }),
            Box::new(store.clone()),
            Units::Metric,
        );

        panel.mount();
        panel.dispatch(Action::QueryChange("Paris".into()));
        panel.dispatch(Action::Submit);
        assert!(panel.state().loading);

        panel.settle().await;

        let state = panel.state();
        assert!(!state.loading);
        assert_eq!(state.error, None);
        assert_eq!(state.snapshot, Some(london()));
        assert_eq!(state.query, "London");
        assert_eq!(store.last_location().unwrap(), None);
        assert!(provider.calls().contains(&LocationQuery::Coordinates(here())));
    }

    #[tokio::test]
    async fn submit_during_automatic_fetch_ignores_late_automatic_result() {
        let provider = TimedProvider::new(10, 200);
        let store = SharedStore::default();
        let mut panel = WeatherPanel::new(
            provider.clone(),
            Arc::new(FixedGeolocator(here())),
            Box::new(store.clone()),
            Units::Metric,
        );

        panel.mount();
        // Position arrives and the automatic fetch starts.
        assert!(panel.step().await);
        let automatic = panel.state().in_flight().expect("automatic fetch in flight");

        panel.dispatch(Action::QueryChange("Paris".into()));
        panel.dispatch(Action::Submit);
        panel.settle().await;

        let late = panel.dispatch(Action::WeatherDidLoad {
            request: automatic,
            lookup: Lookup::Automatic,
            query: None,
            snapshot: london(),
        });
        assert!(!late);

        let state = panel.state();
        assert!(!state.loading);
        assert_eq!(state.snapshot.as_ref().map(|s| s.city.as_str()), Some("Paris"));
        assert_eq!(state.query, "Paris");
        assert_eq!(store.last_location().unwrap().as_deref(), Some("Paris"));
    }

    #[tokio::test]
    async fn panicking_provider_still_settles() {
        let mut panel = WeatherPanel::new(
            Arc::new(PanickingProvider),
            Arc::new(DeniedGeolocator),
            Box::new(MemoryLocationStore::default()),
            Units::Metric,
        );

        panel.dispatch(Action::QueryChange("London".into()));
        panel.dispatch(Action::Submit);
        tokio::time::timeout(Duration::from_secs(5), panel.settle())
            .await
            .expect("settle returns after a panicking task");

        assert!(panel.is_idle());
        assert!(!panel.state().loading);
        assert_eq!(panel.state().error.as_deref(), Some(FETCH_FAILED));
    }
}
