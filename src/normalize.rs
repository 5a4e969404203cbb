//! Forecast normalization
//!
//! Turns day, night and three-hourly DataPoint records into one uniform
//! [`NormalizedForecast`]. The accepted combinations are:
//!
//! | resolution  | label     | readings | uv            |
//! |-------------|-----------|----------|---------------|
//! | Daily       | "Day"     | Day      | Day.uv        |
//! | Daily       | "Night"   | Night    | empty         |
//! | ThreeHourly | numeric   | Hourly   | Hourly.uv     |
//!
//! Anything else is rejected rather than rendered with missing fields.

use thiserror::Error;

use crate::data::{NormalizedForecast, Period, RawForecast, Readings, Resolution};

/// Errors that can occur while normalizing a forecast record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// The record's label and readings don't fit the requested resolution
    #[error("Unrecognized {resolution} forecast shape: label '{label}' with {shape} readings")]
    UnrecognizedShape {
        label: String,
        shape: &'static str,
        resolution: Resolution,
    },
}

/// Readings common to every shape, after uv has been resolved
struct Selected<'a> {
    display_time: String,
    uv: &'a str,
    precipitation: &'a str,
    humidity: &'a str,
    gust_speed: &'a str,
    temperature: &'a str,
    feels_like_temp: &'a str,
}

/// Normalizes one record of `period`
///
/// # Arguments
/// * `period` - The period the record belongs to
/// * `period_index` - Position of `period` in the loaded data
/// * `raw` - The record to normalize
/// * `forecast_index` - Position of `raw` within `period.forecasts`
/// * `resolution` - Resolution the data was fetched at
///
/// # Returns
/// * `Ok(NormalizedForecast)` carrying both indices unchanged
/// * `Err(NormalizeError::UnrecognizedShape)` for any combination outside the table above
pub fn normalize(
    period: &Period,
    period_index: usize,
    raw: &RawForecast,
    forecast_index: usize,
    resolution: Resolution,
) -> Result<NormalizedForecast, NormalizeError> {
    let selected = select(raw, resolution)?;

    Ok(NormalizedForecast {
        date: period.date,
        display_time: selected.display_time,
        weather_code: raw.weather_code.clone(),
        wind_direction: raw.wind_direction.clone(),
        wind_speed: raw.wind_speed.clone(),
        visibility: raw.visibility.clone(),
        uv: selected.uv.to_string(),
        precipitation: selected.precipitation.to_string(),
        humidity: selected.humidity.to_string(),
        gust_speed: selected.gust_speed.to_string(),
        temperature: selected.temperature.to_string(),
        feels_like_temp: selected.feels_like_temp.to_string(),
        period_index,
        forecast_index,
    })
}

fn select(raw: &RawForecast, resolution: Resolution) -> Result<Selected<'_>, NormalizeError> {
    let label = raw.time_label.as_str();

    match (resolution, label, &raw.readings) {
        (Resolution::Daily, "Day", Readings::Day(r)) => Ok(Selected {
            display_time: label.to_string(),
            uv: &r.uv,
            precipitation: &r.precipitation,
            humidity: &r.humidity,
            gust_speed: &r.gust_speed,
            temperature: &r.temperature,
            feels_like_temp: &r.feels_like_temp,
        }),
        (Resolution::Daily, "Night", Readings::Night(r)) => Ok(Selected {
            display_time: label.to_string(),
            uv: "",
            precipitation: &r.precipitation,
            humidity: &r.humidity,
            gust_speed: &r.gust_speed,
            temperature: &r.temperature,
            feels_like_temp: &r.feels_like_temp,
        }),
        (Resolution::ThreeHourly, _, Readings::Hourly(r)) => {
            let minutes = parse_minutes(label).ok_or_else(|| unrecognized(raw, resolution))?;
            Ok(Selected {
                display_time: hour_label(minutes),
                uv: &r.uv,
                precipitation: &r.precipitation,
                humidity: &r.humidity,
                gust_speed: &r.gust_speed,
                temperature: &r.temperature,
                feels_like_temp: &r.feels_like_temp,
            })
        }
        _ => Err(unrecognized(raw, resolution)),
    }
}

fn unrecognized(raw: &RawForecast, resolution: Resolution) -> NormalizeError {
    NormalizeError::UnrecognizedShape {
        label: raw.time_label.clone(),
        shape: raw.readings.shape_name(),
        resolution,
    }
}

/// Parses a three-hourly label (minutes past midnight)
fn parse_minutes(label: &str) -> Option<u32> {
    if label.is_empty() || !label.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    label.parse().ok()
}

/// Formats minutes past midnight as "HH:00"
///
/// Upstream steps are whole hours; any leftover minutes are dropped.
pub fn hour_label(minutes: u32) -> String {
    format!("{:02}:00", minutes / 60)
}
