//! Core data models for metforecast
//!
//! This module contains the domain types shared by the search index, the
//! normalizer and the navigation state machine: forecast sites, per-day
//! periods, the three upstream forecast shapes, and the uniform record the
//! screens render.

pub mod datapoint;

pub use datapoint::{DataPointClient, FetchError, ForecastSource};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A forecast site from the DataPoint sitelist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// DataPoint site identifier
    pub id: String,
    /// Human-readable site name
    pub name: String,
    /// Forecast region code (e.g. "sw", "yh")
    pub region: String,
}

/// Display projection of a [`Location`] used by the search screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationRow {
    pub name: String,
    pub id: String,
    pub region: String,
}

impl From<&Location> for LocationRow {
    fn from(location: &Location) -> Self {
        Self {
            name: location.name.clone(),
            id: location.id.clone(),
            region: location.region.clone(),
        }
    }
}

/// Temporal granularity of a forecast request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Resolution {
    /// One day and one night record per calendar day
    #[default]
    Daily,
    /// One record every three hours
    ThreeHourly,
}

impl Resolution {
    /// Value of the `res` query parameter DataPoint expects
    pub fn as_query(self) -> &'static str {
        match self {
            Resolution::Daily => "daily",
            Resolution::ThreeHourly => "3hourly",
        }
    }

    /// Returns the other resolution
    pub fn toggle(self) -> Self {
        match self {
            Resolution::Daily => Resolution::ThreeHourly,
            Resolution::ThreeHourly => Resolution::Daily,
        }
    }

    /// Parses a user-supplied resolution name, accepting a few aliases
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "daily" | "day" => Some(Resolution::Daily),
            "3hourly" | "three-hourly" | "3h" => Some(Resolution::ThreeHourly),
            _ => None,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Daily => write!(f, "Daily"),
            Resolution::ThreeHourly => write!(f, "3-hourly"),
        }
    }
}

/// One calendar day of forecast records, in the order DataPoint sent them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Period {
    pub date: NaiveDate,
    pub forecasts: Vec<RawForecast>,
}

/// One untransformed forecast record
///
/// `time_label` is "Day" or "Night" for daily data and minutes past midnight
/// (e.g. "180") for three-hourly data. Which readings are present depends on
/// the shape the upstream record arrived in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawForecast {
    pub time_label: String,
    pub weather_code: String,
    pub wind_direction: String,
    pub wind_speed: String,
    pub visibility: String,
    pub readings: Readings,
}

/// Shape-specific readings of a [`RawForecast`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readings {
    Day(DayReadings),
    Night(NightReadings),
    Hourly(HourlyReadings),
}

impl Readings {
    /// Short name of the shape, used in error messages
    pub fn shape_name(&self) -> &'static str {
        match self {
            Readings::Day(_) => "day",
            Readings::Night(_) => "night",
            Readings::Hourly(_) => "hourly",
        }
    }
}

/// Daytime readings (maximum temperatures, UV)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayReadings {
    pub uv: String,
    pub precipitation: String,
    pub humidity: String,
    pub gust_speed: String,
    pub temperature: String,
    pub feels_like_temp: String,
}

/// Night-time readings (minimum temperatures, no UV)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NightReadings {
    pub precipitation: String,
    pub humidity: String,
    pub gust_speed: String,
    pub temperature: String,
    pub feels_like_temp: String,
}

/// Three-hourly readings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HourlyReadings {
    pub uv: String,
    pub precipitation: String,
    pub humidity: String,
    pub gust_speed: String,
    pub temperature: String,
    pub feels_like_temp: String,
}

/// A decoded forecast response for one site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteForecast {
    /// Site name as reported by the forecast endpoint
    pub name: String,
    /// Country as reported by the forecast endpoint
    pub country: String,
    pub periods: Vec<Period>,
}

/// Uniform, render-ready forecast record
///
/// `period_index` and `forecast_index` point back into the periods held by
/// the site data store that produced this record. They are only meaningful
/// until that store is next loaded or cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedForecast {
    pub date: NaiveDate,
    pub display_time: String,
    pub weather_code: String,
    pub wind_direction: String,
    pub wind_speed: String,
    pub visibility: String,
    /// Empty for night records
    pub uv: String,
    pub precipitation: String,
    pub humidity: String,
    pub gust_speed: String,
    pub temperature: String,
    pub feels_like_temp: String,
    pub period_index: usize,
    pub forecast_index: usize,
}

impl NormalizedForecast {
    /// List title, e.g. "Mon, 15 Jul 2024 (Day)"
    pub fn title(&self) -> String {
        format!("{} ({})", self.date.format("%a, %d %b %Y"), self.display_time)
    }

    /// One-line summary, e.g. "Sunny day | 21°C | 9mph"
    pub fn summary(&self) -> String {
        format!(
            "{} | {}°C | {}mph",
            weather_description(&self.weather_code),
            self.temperature,
            self.wind_speed
        )
    }

    /// Human-readable weather description for this record's code
    pub fn weather(&self) -> &'static str {
        weather_description(&self.weather_code)
    }
}

/// Maps a DataPoint significant-weather code to a description
///
/// DataPoint distinguishes day and night variants of several codes (e.g.
/// "2"/"3" for partly cloudy); both map to the same text here since the
/// time label already says which half of the day it is.
pub fn weather_description(code: &str) -> &'static str {
    match code {
        "0" => "Clear night",
        "1" => "Sunny day",
        "2" | "3" => "Partly cloudy",
        "5" => "Mist",
        "6" => "Fog",
        "7" => "Cloudy",
        "8" => "Overcast",
        "9" | "10" => "Light rain shower",
        "11" => "Drizzle",
        "12" => "Light rain",
        "13" | "14" => "Heavy rain shower",
        "15" => "Heavy rain",
        "16" | "17" => "Sleet shower",
        "18" => "Sleet",
        "19" | "20" => "Hail shower",
        "21" => "Hail",
        "22" | "23" => "Light snow shower",
        "24" => "Light snow",
        "25" | "26" => "Heavy snow shower",
        "27" => "Heavy snow",
        "28" | "29" => "Thunder shower",
        "30" => "Thunder",
        _ => "Not available",
    }
}
