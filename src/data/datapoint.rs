//! Met Office DataPoint API client
//!
//! This module fetches the forecast sitelist and per-site forecasts from the
//! DataPoint `val/wxfcs/all/json` endpoints and decodes them into the domain
//! types in [`crate::data`].

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use thiserror::Error;
use tracing::debug;

use super::{
    DayReadings, HourlyReadings, Location, NightReadings, Period, RawForecast, Readings,
    Resolution, SiteForecast,
};

/// Default base URL for the DataPoint API
pub const DATAPOINT_BASE_URL: &str = "http://datapoint.metoffice.gov.uk/public/data/";

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const SITELIST_ENDPOINT: &str = "val/wxfcs/all/json/sitelist";
const FORECAST_ENDPOINT: &str = "val/wxfcs/all/json/";

/// Errors that can occur when fetching forecast data
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("DataPoint returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// Response body could not be decoded
    #[error("Failed to decode DataPoint response: {0}")]
    Decode(String),

    /// Forecast response contained no periods
    #[error("No forecast periods returned for site {location_id}")]
    NoPeriods { location_id: String },
}

/// Source of sitelist and forecast data
///
/// The navigation layer only ever talks to this trait, so tests can swap in
/// an in-memory implementation.
#[async_trait]
pub trait ForecastSource: Send + Sync {
    /// Fetches every known forecast site
    async fn fetch_sitelist(&self) -> Result<Vec<Location>, FetchError>;

    /// Fetches the forecast for one site at the given resolution
    async fn fetch_forecast(
        &self,
        location_id: &str,
        resolution: Resolution,
    ) -> Result<SiteForecast, FetchError>;
}

/// Client for the DataPoint forecast API
#[derive(Debug, Clone)]
pub struct DataPointClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl DataPointClient {
    /// Creates a client against the public DataPoint endpoint
    pub fn new(api_key: impl Into<String>) -> Result<Self, FetchError> {
        Self::with_config(api_key, DATAPOINT_BASE_URL, DEFAULT_TIMEOUT)
    }

    /// Creates a client with a custom base URL and request timeout
    ///
    /// # Arguments
    /// * `api_key` - DataPoint API key, sent as the `key` query parameter
    /// * `base_url` - Root of the DataPoint API; a trailing slash is added if missing
    /// * `timeout` - Per-request timeout
    pub fn with_config(
        api_key: impl Into<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };

        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
        })
    }

    /// Sends a GET request and decodes the JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(%url, "fetching from DataPoint");

        let response = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ForecastSource for DataPointClient {
    async fn fetch_sitelist(&self) -> Result<Vec<Location>, FetchError> {
        let response: SitelistResponse = self.get_json(SITELIST_ENDPOINT, &[]).await?;
        Ok(parse_sitelist(response))
    }

    async fn fetch_forecast(
        &self,
        location_id: &str,
        resolution: Resolution,
    ) -> Result<SiteForecast, FetchError> {
        let endpoint = format!("{}{}", FORECAST_ENDPOINT, location_id);
        let response: ForecastResponse = self
            .get_json(&endpoint, &[("res", resolution.as_query())])
            .await?;
        parse_forecast(response)
    }
}

/// Converts the sitelist wire format into locations, keeping fetch order
fn parse_sitelist(response: SitelistResponse) -> Vec<Location> {
    response
        .locations
        .location
        .into_iter()
        .map(|entry| Location {
            id: entry.id,
            name: entry.name,
            region: entry.region,
        })
        .collect()
}

/// Converts a forecast response into a [`SiteForecast`]
fn parse_forecast(response: ForecastResponse) -> Result<SiteForecast, FetchError> {
    let location = response.site_rep.dv.location;

    let periods = location
        .periods
        .into_iter()
        .map(parse_period)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SiteForecast {
        name: location.name,
        country: location.country,
        periods,
    })
}

fn parse_period(period: WirePeriod) -> Result<Period, FetchError> {
    let date = parse_date(&period.value)?;
    let forecasts = period
        .reps
        .into_iter()
        .map(parse_rep)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Period { date, forecasts })
}

/// Parses a DataPoint period date such as "2024-07-15Z"
fn parse_date(value: &str) -> Result<NaiveDate, FetchError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%dZ")
        .map_err(|_| FetchError::Decode(format!("invalid period date: {}", value)))
}

/// Builds a [`RawForecast`], picking the readings shape from whichever
/// temperature key the record carries
fn parse_rep(rep: WireRep) -> Result<RawForecast, FetchError> {
    let readings = if let Some(temperature) = rep.day_max_temp {
        Readings::Day(DayReadings {
            uv: rep.uv.unwrap_or_default(),
            precipitation: rep.day_precipitation.unwrap_or_default(),
            humidity: rep.day_humidity.unwrap_or_default(),
            gust_speed: rep.day_gust.unwrap_or_default(),
            temperature,
            feels_like_temp: rep.day_feels_like.unwrap_or_default(),
        })
    } else if let Some(temperature) = rep.night_min_temp {
        Readings::Night(NightReadings {
            precipitation: rep.night_precipitation.unwrap_or_default(),
            humidity: rep.night_humidity.unwrap_or_default(),
            gust_speed: rep.night_gust.unwrap_or_default(),
            temperature,
            feels_like_temp: rep.night_feels_like.unwrap_or_default(),
        })
    } else if let Some(temperature) = rep.temperature {
        Readings::Hourly(HourlyReadings {
            uv: rep.uv.unwrap_or_default(),
            precipitation: rep.precipitation.unwrap_or_default(),
            humidity: rep.humidity.unwrap_or_default(),
            gust_speed: rep.gust.unwrap_or_default(),
            temperature,
            feels_like_temp: rep.feels_like.unwrap_or_default(),
        })
    } else {
        return Err(FetchError::Decode(format!(
            "forecast record '{}' has no temperature reading",
            rep.time
        )));
    };

    Ok(RawForecast {
        time_label: rep.time,
        weather_code: rep.weather_code,
        wind_direction: rep.wind_direction,
        wind_speed: rep.wind_speed,
        visibility: rep.visibility,
        readings,
    })
}

/// DataPoint collapses single-element arrays into bare objects
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(items) => items,
        OneOrMany::One(item) => vec![item],
    })
}

/// Sitelist response structure
#[derive(Debug, Deserialize)]
struct SitelistResponse {
    #[serde(rename = "Locations", alias = "locations")]
    locations: SitelistLocations,
}

#[derive(Debug, Deserialize)]
struct SitelistLocations {
    #[serde(
        rename = "Location",
        alias = "location",
        default,
        deserialize_with = "one_or_many"
    )]
    location: Vec<SitelistEntry>,
}

#[derive(Debug, Deserialize)]
struct SitelistEntry {
    id: String,
    name: String,
    #[serde(default)]
    region: String,
}

/// Forecast response structure
#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(rename = "SiteRep")]
    site_rep: SiteRep,
}

#[derive(Debug, Deserialize)]
struct SiteRep {
    #[serde(rename = "DV")]
    dv: DataValues,
}

#[derive(Debug, Deserialize)]
struct DataValues {
    #[serde(rename = "Location")]
    location: WireLocation,
}

#[derive(Debug, Deserialize)]
struct WireLocation {
    #[serde(default)]
    name: String,
    #[serde(default)]
    country: String,
    #[serde(rename = "Period", default, deserialize_with = "one_or_many")]
    periods: Vec<WirePeriod>,
}

#[derive(Debug, Deserialize)]
struct WirePeriod {
    value: String,
    #[serde(rename = "Rep", default, deserialize_with = "one_or_many")]
    reps: Vec<WireRep>,
}

/// A single `Rep` record. Day, night and three-hourly records share the
/// first block of keys and differ in the rest.
#[derive(Debug, Deserialize)]
struct WireRep {
    #[serde(rename = "$")]
    time: String,
    #[serde(rename = "W", default)]
    weather_code: String,
    #[serde(rename = "D", default)]
    wind_direction: String,
    #[serde(rename = "S", default)]
    wind_speed: String,
    #[serde(rename = "V", default)]
    visibility: String,
    #[serde(rename = "U")]
    uv: Option<String>,

    #[serde(rename = "PPd")]
    day_precipitation: Option<String>,
    #[serde(rename = "Hn")]
    day_humidity: Option<String>,
    #[serde(rename = "Gn")]
    day_gust: Option<String>,
    #[serde(rename = "Dm")]
    day_max_temp: Option<String>,
    #[serde(rename = "FDm")]
    day_feels_like: Option<String>,

    #[serde(rename = "PPn")]
    night_precipitation: Option<String>,
    #[serde(rename = "Hm")]
    night_humidity: Option<String>,
    #[serde(rename = "Gm")]
    night_gust: Option<String>,
    #[serde(rename = "Nm")]
    night_min_temp: Option<String>,
    #[serde(rename = "FNm")]
    night_feels_like: Option<String>,

    #[serde(rename = "Pp")]
    precipitation: Option<String>,
    #[serde(rename = "H")]
    humidity: Option<String>,
    #[serde(rename = "G")]
    gust: Option<String>,
    #[serde(rename = "T")]
    temperature: Option<String>,
    #[serde(rename = "F")]
    feels_like: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SITELIST_RESPONSE: &str = r#"{
        "Locations": {
            "Location": [
                {"elevation": "7.0", "id": "3", "latitude": "50.9", "longitude": "-1.4", "name": "Southampton", "region": "se", "unitaryAuthArea": "Southampton"},
                {"elevation": "43.0", "id": "310069", "latitude": "50.7", "longitude": "-3.5", "name": "Exeter", "region": "sw", "unitaryAuthArea": "Devon"},
                {"elevation": "12.0", "id": "99", "latitude": "57.1", "longitude": "-2.1", "name": "Aberdeen"}
            ]
        }
    }"#;

    const DAILY_RESPONSE: &str = r#"{
        "SiteRep": {
            "Wx": {"Param": [{"name": "FDm", "units": "C", "$": "Feels Like Day Maximum Temperature"}]},
            "DV": {
                "dataDate": "2024-07-15T09:00:00Z",
                "type": "Forecast",
                "Location": {
                    "i": "310069",
                    "lat": "50.7",
                    "lon": "-3.5",
                    "name": "EXETER",
                    "country": "ENGLAND",
                    "continent": "EUROPE",
                    "Period": [
                        {
                            "type": "Day",
                            "value": "2024-07-15Z",
                            "Rep": [
                                {"D": "SW", "Gn": "20", "Hn": "60", "PPd": "4", "S": "9", "V": "VG", "Dm": "21", "FDm": "20", "W": "1", "U": "6", "$": "Day"},
                                {"D": "WSW", "Gm": "16", "Hm": "85", "PPn": "10", "S": "7", "V": "GO", "Nm": "13", "FNm": "12", "W": "0", "$": "Night"}
                            ]
                        },
                        {
                            "type": "Day",
                            "value": "2024-07-16Z",
                            "Rep": [
                                {"D": "W", "Gn": "25", "Hn": "70", "PPd": "40", "S": "11", "V": "GO", "Dm": "19", "FDm": "17", "W": "12", "U": "4", "$": "Day"},
                                {"D": "W", "Gm": "18", "Hm": "90", "PPn": "30", "S": "8", "V": "MO", "Nm": "12", "FNm": "10", "W": "9", "$": "Night"}
                            ]
                        }
                    ]
                }
            }
        }
    }"#;

    const THREE_HOURLY_RESPONSE: &str = r#"{
        "SiteRep": {
            "DV": {
                "Location": {
                    "name": "EXETER",
                    "country": "ENGLAND",
                    "Period": {
                        "type": "Day",
                        "value": "2024-07-15Z",
                        "Rep": [
                            {"D": "SW", "F": "14", "G": "11", "H": "88", "Pp": "5", "S": "4", "T": "15", "V": "GO", "W": "2", "U": "0", "$": "0"},
                            {"D": "SW", "F": "13", "G": "9", "H": "90", "Pp": "6", "S": "4", "T": "14", "V": "GO", "W": "2", "U": "0", "$": "180"}
                        ]
                    }
                }
            }
        }
    }"#;

    fn decode_forecast(json: &str) -> Result<SiteForecast, FetchError> {
        let response: ForecastResponse =
            serde_json::from_str(json).expect("Failed to parse forecast response");
        parse_forecast(response)
    }

    #[test]
    fn test_parse_sitelist() {
        let response: SitelistResponse =
            serde_json::from_str(SITELIST_RESPONSE).expect("Failed to parse sitelist");
        let locations = parse_sitelist(response);

        assert_eq!(locations.len(), 3);
        assert_eq!(locations[0].name, "Southampton");
        assert_eq!(locations[1].id, "310069");
        assert_eq!(locations[1].region, "sw");
        // Missing region decodes as empty
        assert_eq!(locations[2].region, "");
    }

    #[test]
    fn test_parse_sitelist_lowercase_keys() {
        let json = r#"{"locations": {"location": [{"id": "1", "name": "Bath", "region": "sw"}]}}"#;
        let response: SitelistResponse = serde_json::from_str(json).expect("Failed to parse");
        let locations = parse_sitelist(response);
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].name, "Bath");
    }

    #[test]
    fn test_parse_daily_forecast() {
        let forecast = decode_forecast(DAILY_RESPONSE).expect("Failed to decode forecast");

        assert_eq!(forecast.name, "EXETER");
        assert_eq!(forecast.country, "ENGLAND");
        assert_eq!(forecast.periods.len(), 2);
        assert_eq!(
            forecast.periods[0].date,
            NaiveDate::from_ymd_opt(2024, 7, 15).unwrap()
        );

        let day = &forecast.periods[0].forecasts[0];
        assert_eq!(day.time_label, "Day");
        assert_eq!(day.weather_code, "1");
        assert_eq!(day.wind_direction, "SW");
        assert_eq!(day.wind_speed, "9");
        assert_eq!(day.visibility, "VG");
        match &day.readings {
            Readings::Day(r) => {
                assert_eq!(r.uv, "6");
                assert_eq!(r.precipitation, "4");
                assert_eq!(r.humidity, "60");
                assert_eq!(r.gust_speed, "20");
                assert_eq!(r.temperature, "21");
                assert_eq!(r.feels_like_temp, "20");
            }
            other => panic!("Expected day readings, got {:?}", other),
        }

        let night = &forecast.periods[0].forecasts[1];
        assert_eq!(night.time_label, "Night");
        match &night.readings {
            Readings::Night(r) => {
                assert_eq!(r.precipitation, "10");
                assert_eq!(r.temperature, "13");
                assert_eq!(r.feels_like_temp, "12");
            }
            other => panic!("Expected night readings, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_three_hourly_single_period_object() {
        let forecast = decode_forecast(THREE_HOURLY_RESPONSE).expect("Failed to decode forecast");

        assert_eq!(forecast.periods.len(), 1);
        let period = &forecast.periods[0];
        assert_eq!(period.forecasts.len(), 2);
        assert_eq!(period.forecasts[1].time_label, "180");
        match &period.forecasts[1].readings {
            Readings::Hourly(r) => {
                assert_eq!(r.temperature, "14");
                assert_eq!(r.feels_like_temp, "13");
                assert_eq!(r.humidity, "90");
                assert_eq!(r.uv, "0");
            }
            other => panic!("Expected hourly readings, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_single_rep_object() {
        let json = r#"{
            "SiteRep": {"DV": {"Location": {"name": "EXETER", "country": "ENGLAND",
                "Period": [{"value": "2024-07-15Z",
                    "Rep": {"D": "SW", "Gm": "16", "Hm": "85", "PPn": "10", "S": "7", "V": "GO", "Nm": "13", "FNm": "12", "W": "0", "$": "Night"}}]}}}
        }"#;
        let forecast = decode_forecast(json).expect("Failed to decode forecast");
        assert_eq!(forecast.periods[0].forecasts.len(), 1);
        assert_eq!(forecast.periods[0].forecasts[0].time_label, "Night");
    }

    #[test]
    fn test_parse_missing_periods_is_empty() {
        let json = r#"{"SiteRep": {"DV": {"Location": {"name": "EXETER", "country": "ENGLAND"}}}}"#;
        let forecast = decode_forecast(json).expect("Failed to decode forecast");
        assert!(forecast.periods.is_empty());
    }

    #[test]
    fn test_parse_invalid_period_date() {
        let json = r#"{"SiteRep": {"DV": {"Location": {"name": "X", "country": "Y",
            "Period": [{"value": "15/07/2024", "Rep": []}]}}}}"#;
        match decode_forecast(json) {
            Err(FetchError::Decode(msg)) => assert!(msg.contains("15/07/2024")),
            other => panic!("Expected Decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rep_without_temperature() {
        let json = r#"{"SiteRep": {"DV": {"Location": {"name": "X", "country": "Y",
            "Period": [{"value": "2024-07-15Z", "Rep": [{"W": "1", "$": "Day"}]}]}}}}"#;
        match decode_forecast(json) {
            Err(FetchError::Decode(msg)) => assert!(msg.contains("no temperature")),
            other => panic!("Expected Decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-07-15Z").unwrap(),
            NaiveDate::from_ymd_opt(2024, 7, 15).unwrap()
        );
        assert!(parse_date("2024-07-15").is_err());
        assert!(parse_date("not a date").is_err());
    }

    #[test]
    fn test_parse_malformed_json() {
        let result: Result<ForecastResponse, _> = serde_json::from_str("{ invalid json }");
        assert!(result.is_err());
    }

    #[test]
    fn test_with_config_appends_trailing_slash() {
        let client = DataPointClient::with_config("key", "http://localhost:1234/data", DEFAULT_TIMEOUT)
            .expect("Failed to build client");
        assert_eq!(client.base_url, "http://localhost:1234/data/");
    }

    #[test]
    fn test_new_uses_public_base_url() {
        let client = DataPointClient::new("key").expect("Failed to build client");
        assert_eq!(client.base_url, DATAPOINT_BASE_URL);
        assert_eq!(client.api_key, "key");
    }
}
