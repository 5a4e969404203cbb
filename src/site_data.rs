//! Forecast data for the currently selected site
//!
//! Holds the periods fetched for one location at one resolution together
//! with the normalized list built from them. Loading always replaces the
//! whole set, so the indices carried by each [`NormalizedForecast`] stay in
//! step with the periods they point into.

use thiserror::Error;
use tracing::error;

use crate::data::{
    FetchError, ForecastSource, NormalizedForecast, Period, RawForecast, Resolution, SiteForecast,
};
use crate::normalize::{normalize, NormalizeError};

/// Errors that can occur when loading or reading site data
#[derive(Debug, Error)]
pub enum SiteDataError {
    /// The fetch failed or returned nothing usable
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A record didn't match the requested resolution
    #[error(transparent)]
    Shape(#[from] NormalizeError),

    /// A selection pointed outside the loaded periods
    #[error("Stale forecast reference: period {period_index}, forecast {forecast_index}")]
    StaleReference {
        period_index: usize,
        forecast_index: usize,
    },
}

/// Everything held for one loaded site
#[derive(Debug, Clone)]
struct LoadedSite {
    location_id: String,
    resolution: Resolution,
    name: String,
    country: String,
    periods: Vec<Period>,
    forecasts: Vec<NormalizedForecast>,
}

/// Owner of the most recently fetched forecast
#[derive(Debug, Clone, Default)]
pub struct SiteDataStore {
    loaded: Option<LoadedSite>,
}

impl SiteDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetches and installs the forecast for `location_id`
    ///
    /// # Returns
    /// * `Ok(&[NormalizedForecast])` - the new normalized list
    /// * `Err(SiteDataError)` - if the fetch or normalization failed; any
    ///   previously loaded data is left untouched
    pub async fn load(
        &mut self,
        location_id: &str,
        resolution: Resolution,
        source: &dyn ForecastSource,
    ) -> Result<&[NormalizedForecast], SiteDataError> {
        let fetched = source.fetch_forecast(location_id, resolution).await?;
        self.install(location_id, resolution, fetched)
    }

    /// Normalizes a fetched forecast and makes it the current data
    ///
    /// Records are normalized period by period, in the order received. A
    /// single unrecognized record aborts the whole install. Nothing is
    /// replaced unless the new list was built completely.
    pub fn install(
        &mut self,
        location_id: &str,
        resolution: Resolution,
        fetched: SiteForecast,
    ) -> Result<&[NormalizedForecast], SiteDataError> {
        if fetched.periods.is_empty() {
            return Err(FetchError::NoPeriods {
                location_id: location_id.to_string(),
            }
            .into());
        }

        let mut forecasts = Vec::new();
        for (period_index, period) in fetched.periods.iter().enumerate() {
            for (forecast_index, raw) in period.forecasts.iter().enumerate() {
                forecasts.push(normalize(
                    period,
                    period_index,
                    raw,
                    forecast_index,
                    resolution,
                )?);
            }
        }

        let loaded = self.loaded.insert(LoadedSite {
            location_id: location_id.to_string(),
            resolution,
            name: fetched.name,
            country: fetched.country,
            periods: fetched.periods,
            forecasts,
        });
        Ok(loaded.forecasts.as_slice())
    }

    /// Looks up the raw record behind a normalized forecast
    ///
    /// Indices come from a [`NormalizedForecast`] produced by the current
    /// load. An out-of-range pair means a caller kept indices across a
    /// reload, which is logged as an error.
    pub fn resolve_selection(
        &self,
        period_index: usize,
        forecast_index: usize,
    ) -> Result<&RawForecast, SiteDataError> {
        self.loaded
            .as_ref()
            .and_then(|site| site.periods.get(period_index))
            .and_then(|period| period.forecasts.get(forecast_index))
            .ok_or_else(|| {
                error!(
                    period_index,
                    forecast_index, "forecast selection does not match loaded site data"
                );
                SiteDataError::StaleReference {
                    period_index,
                    forecast_index,
                }
            })
    }

    /// Resolves a selection and normalizes it again for the detail screen
    pub fn resolve_forecast(
        &self,
        period_index: usize,
        forecast_index: usize,
    ) -> Result<NormalizedForecast, SiteDataError> {
        let raw = self.resolve_selection(period_index, forecast_index)?;
        let site = self
            .loaded
            .as_ref()
            .ok_or(SiteDataError::StaleReference {
                period_index,
                forecast_index,
            })?;
        let period = &site.periods[period_index];
        Ok(normalize(
            period,
            period_index,
            raw,
            forecast_index,
            site.resolution,
        )?)
    }

    /// Drops any loaded data
    pub fn clear(&mut self) {
        self.loaded = None;
    }

    /// Normalized forecasts of the current load, in chronological order
    pub fn forecasts(&self) -> &[NormalizedForecast] {
        self.loaded
            .as_ref()
            .map(|site| site.forecasts.as_slice())
            .unwrap_or(&[])
    }

    /// "Name, Country" header for the loaded site
    pub fn header(&self) -> Option<String> {
        self.loaded
            .as_ref()
            .map(|site| format!("{}, {}", site.name, site.country))
    }

    /// Site name as reported by the forecast endpoint
    pub fn site_name(&self) -> Option<&str> {
        self.loaded.as_ref().map(|site| site.name.as_str())
    }

    pub fn location_id(&self) -> Option<&str> {
        self.loaded.as_ref().map(|site| site.location_id.as_str())
    }

    pub fn resolution(&self) -> Option<Resolution> {
        self.loaded.as_ref().map(|site| site.resolution)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DayReadings, HourlyReadings, Location, NightReadings, Readings};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn record(label: &str, readings: Readings) -> RawForecast {
        RawForecast {
            time_label: label.to_string(),
            weather_code: "3".to_string(),
            wind_direction: "S".to_string(),
            wind_speed: "6".to_string(),
            visibility: "VG".to_string(),
            readings,
        }
    }

    fn day_record(temperature: &str) -> RawForecast {
        record(
            "Day",
            Readings::Day(DayReadings {
                uv: "4".to_string(),
                temperature: temperature.to_string(),
                ..Default::default()
            }),
        )
    }

    fn night_record(temperature: &str) -> RawForecast {
        record(
            "Night",
            Readings::Night(NightReadings {
                temperature: temperature.to_string(),
                ..Default::default()
            }),
        )
    }

    fn hourly_record(minutes: &str) -> RawForecast {
        record(
            minutes,
            Readings::Hourly(HourlyReadings {
                temperature: "11".to_string(),
                ..Default::default()
            }),
        )
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, day).unwrap()
    }

    fn daily_fixture() -> SiteForecast {
        SiteForecast {
            name: "BRISTOL".to_string(),
            country: "ENGLAND".to_string(),
            periods: vec![
                Period {
                    date: date(15),
                    forecasts: vec![day_record("21"), night_record("13")],
                },
                Period {
                    date: date(16),
                    forecasts: vec![day_record("19"), night_record("12")],
                },
            ],
        }
    }

    fn hourly_fixture() -> SiteForecast {
        SiteForecast {
            name: "BRISTOL".to_string(),
            country: "ENGLAND".to_string(),
            periods: vec![Period {
                date: date(15),
                forecasts: vec![hourly_record("0"), hourly_record("180"), hourly_record("360")],
            }],
        }
    }

    /// In-memory source that counts forecast fetches
    struct FixtureSource {
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl ForecastSource for FixtureSource {
        async fn fetch_sitelist(&self) -> Result<Vec<Location>, FetchError> {
            Ok(Vec::new())
        }

        async fn fetch_forecast(
            &self,
            _location_id: &str,
            resolution: Resolution,
        ) -> Result<SiteForecast, FetchError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(match resolution {
                Resolution::Daily => daily_fixture(),
                Resolution::ThreeHourly => hourly_fixture(),
            })
        }
    }

    /// Source whose forecast fetch always fails
    struct FailingSource;

    #[async_trait]
    impl ForecastSource for FailingSource {
        async fn fetch_sitelist(&self) -> Result<Vec<Location>, FetchError> {
            Err(FetchError::Decode("offline".to_string()))
        }

        async fn fetch_forecast(
            &self,
            _location_id: &str,
            _resolution: Resolution,
        ) -> Result<SiteForecast, FetchError> {
            Err(FetchError::Status {
                status: 503,
                url: "http://localhost/".to_string(),
            })
        }
    }

    #[test]
    fn test_install_orders_period_then_forecast() {
        let mut store = SiteDataStore::new();
        let forecasts = store
            .install("B", Resolution::Daily, daily_fixture())
            .expect("Install should succeed");

        let positions: Vec<(usize, usize)> = forecasts
            .iter()
            .map(|f| (f.period_index, f.forecast_index))
            .collect();
        assert_eq!(positions, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
        assert_eq!(forecasts[0].display_time, "Day");
        assert_eq!(forecasts[1].display_time, "Night");
        assert_eq!(forecasts[2].date, date(16));
    }

    #[test]
    fn test_install_sets_header_and_metadata() {
        let mut store = SiteDataStore::new();
        store.install("B", Resolution::Daily, daily_fixture()).unwrap();
        assert_eq!(store.header().as_deref(), Some("BRISTOL, ENGLAND"));
        assert_eq!(store.site_name(), Some("BRISTOL"));
        assert_eq!(store.location_id(), Some("B"));
        assert_eq!(store.resolution(), Some(Resolution::Daily));
    }

    #[test]
    fn test_install_zero_periods_is_fetch_error() {
        let mut store = SiteDataStore::new();
        let empty = SiteForecast {
            name: "X".to_string(),
            country: "Y".to_string(),
            periods: Vec::new(),
        };
        let result = store.install("B", Resolution::Daily, empty);
        assert!(matches!(
            result,
            Err(SiteDataError::Fetch(FetchError::NoPeriods { .. }))
        ));
        assert!(!store.is_loaded());
    }

    #[test]
    fn test_install_shape_error_keeps_previous_data() {
        let mut store = SiteDataStore::new();
        store.install("B", Resolution::Daily, daily_fixture()).unwrap();

        // Three-hourly records under a daily request
        let result = store.install("B", Resolution::Daily, hourly_fixture());
        assert!(matches!(result, Err(SiteDataError::Shape(_))));

        assert_eq!(store.forecasts().len(), 4);
        assert_eq!(store.resolution(), Some(Resolution::Daily));
    }

    #[test]
    fn test_install_replaces_previous_data() {
        let mut store = SiteDataStore::new();
        store.install("B", Resolution::Daily, daily_fixture()).unwrap();
        store
            .install("B", Resolution::ThreeHourly, hourly_fixture())
            .unwrap();

        let forecasts = store.forecasts();
        assert_eq!(forecasts.len(), 3);
        assert!(forecasts.iter().all(|f| f.display_time.ends_with(":00")));
        assert!(forecasts.iter().all(|f| f.period_index == 0));
        assert_eq!(store.resolution(), Some(Resolution::ThreeHourly));
    }

    #[test]
    fn test_resolve_selection_returns_raw_record() {
        let mut store = SiteDataStore::new();
        store.install("B", Resolution::Daily, daily_fixture()).unwrap();

        let raw = store.resolve_selection(1, 1).expect("Selection should resolve");
        assert_eq!(raw.time_label, "Night");
        match &raw.readings {
            Readings::Night(r) => assert_eq!(r.temperature, "12"),
            other => panic!("Expected night readings, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_selection_out_of_range_is_stale() {
        let mut store = SiteDataStore::new();
        store.install("B", Resolution::Daily, daily_fixture()).unwrap();

        assert!(matches!(
            store.resolve_selection(2, 0),
            Err(SiteDataError::StaleReference {
                period_index: 2,
                forecast_index: 0
            })
        ));
        assert!(matches!(
            store.resolve_selection(0, 5),
            Err(SiteDataError::StaleReference { .. })
        ));
    }

    #[test]
    fn test_resolve_selection_after_clear_is_stale() {
        let mut store = SiteDataStore::new();
        store.install("B", Resolution::Daily, daily_fixture()).unwrap();
        store.clear();

        assert!(store.resolve_selection(0, 0).is_err());
        assert!(store.forecasts().is_empty());
        assert!(store.header().is_none());
    }

    #[test]
    fn test_resolve_forecast_matches_list_entry() {
        let mut store = SiteDataStore::new();
        store.install("B", Resolution::Daily, daily_fixture()).unwrap();

        let listed = store.forecasts()[2].clone();
        let resolved = store
            .resolve_forecast(listed.period_index, listed.forecast_index)
            .unwrap();
        assert_eq!(resolved, listed);
    }

    #[test]
    fn test_forecasts_empty_before_load() {
        let store = SiteDataStore::new();
        assert!(store.forecasts().is_empty());
        assert!(!store.is_loaded());
    }

    #[tokio::test]
    async fn test_load_twice_is_idempotent() {
        let source = FixtureSource {
            fetches: AtomicUsize::new(0),
        };
        let mut store = SiteDataStore::new();

        let first = store
            .load("B", Resolution::Daily, &source)
            .await
            .expect("First load should succeed")
            .to_vec();
        let second = store
            .load("B", Resolution::Daily, &source)
            .await
            .expect("Second load should succeed")
            .to_vec();

        assert_eq!(first.len(), second.len());
        assert_eq!(first, second);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_load_failure_propagates_fetch_error() {
        let mut store = SiteDataStore::new();
        let result = store.load("B", Resolution::Daily, &FailingSource).await;
        assert!(matches!(
            result,
            Err(SiteDataError::Fetch(FetchError::Status { status: 503, .. }))
        ));
        assert!(!store.is_loaded());
    }
}
