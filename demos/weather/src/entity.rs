//! Wire and storage types.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Sky condition reported with a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeatherCode {
    /// Clear sky.
    Sunny,
    /// Some clouds.
    PartlyCloudy,
    /// Overcast.
    Cloudy,
    /// Rain.
    Raining,
    /// Fog.
    Fog,
    /// Heavy rain.
    HeavyRain,
    /// Snow.
    Snow,
    /// Thunderstorms.
    ThunderStorms,
}

/// Geographic coordinates in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Longitude.
    pub longitude: f64,
    /// Latitude.
    pub latitude: f64,
}

/// A measurement as submitted and as returned.
///
/// Either `city` and `country` or `location` identify where it was taken.
/// `measureTime` is an ISO local date-time in UTC, e.g. `2017-01-01T00:00:00`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weather {
    /// City name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Country name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Coordinates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Sky condition.
    pub weather_code: WeatherCode,
    /// Temperature in degrees Celsius.
    pub temperature: f64,
    /// Measurement time.
    pub measure_time: String,
}

impl Weather {
    /// Describes `measure` as taken in `city`, `country`.
    #[must_use]
    pub fn for_city(city: String, country: String, measure: &Measure) -> Self {
        Self {
            city: Some(city),
            country: Some(country),
            location: None,
            weather_code: measure.code,
            temperature: measure.temperature,
            measure_time: measure.formatted_time(),
        }
    }

    /// Describes `measure` as taken at `location`.
    #[must_use]
    pub fn for_location(location: Location, measure: &Measure) -> Self {
        Self {
            city: None,
            country: None,
            location: Some(location),
            weather_code: measure.code,
            temperature: measure.temperature,
            measure_time: measure.formatted_time(),
        }
    }

    /// Returns city and country when both are present and non-empty.
    #[must_use]
    pub fn city_country(&self) -> Option<(&str, &str)> {
        match (self.city.as_deref(), self.country.as_deref()) {
            (Some(city), Some(country)) if !city.is_empty() && !country.is_empty() => {
                Some((city, country))
            }
            _ => None,
        }
    }

    /// Builds the stored form.
    ///
    /// # Errors
    ///
    /// Fails if `measure_time` is not an ISO local date-time.
    pub fn to_measure(&self) -> Result<Measure, chrono::ParseError> {
        Ok(Measure {
            temperature: self.temperature,
            code: self.weather_code,
            measured_at: self.measure_time.parse()?,
        })
    }
}

/// Stored measurement; the time is UTC.
#[derive(Debug, Clone, PartialEq)]
pub struct Measure {
    /// Temperature in degrees Celsius.
    pub temperature: f64,
    /// Sky condition.
    pub code: WeatherCode,
    /// Measurement time.
    pub measured_at: NaiveDateTime,
}

impl Measure {
    /// Time format used on the wire.
    pub const TIME_FORMAT: &'static str = "%Y-%m-%dT%H:%M:%S";

    /// Returns the measurement time as sent to clients.
    #[must_use]
    pub fn formatted_time(&self) -> String {
        self.measured_at.format(Self::TIME_FORMAT).to_string()
    }
}
