use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of the city search result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CityCandidate {
    pub name: String,
    pub id: i64,
    pub region: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    pub url: String,
}

impl CityCandidate {
    /// "Name, Region, Country" with empty parts skipped.
    pub fn display_name(&self) -> String {
        [&self.name, &self.region, &self.country]
            .into_iter()
            .filter(|part| !part.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Current conditions for a location, as returned by `current.json`.
///
/// Every field has a default so a partial payload still decodes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherSnapshot {
    pub current: Current,
    pub location: Location,
}

impl WeatherSnapshot {
    /// Time of the last upstream update, if the payload carried one.
    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        match self.current.last_updated_epoch {
            0 => None,
            ts => DateTime::from_timestamp(ts, 0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Current {
    pub cloud: i64,
    pub condition: Condition,
    pub dewpoint_c: f64,
    pub dewpoint_f: f64,
    pub feelslike_c: f64,
    pub feelslike_f: f64,
    pub gust_kph: f64,
    pub gust_mph: f64,
    pub heatindex_c: f64,
    pub heatindex_f: f64,
    pub humidity: i64,
    pub is_day: i64,
    pub last_updated: String,
    pub last_updated_epoch: i64,
    pub precip_in: f64,
    pub precip_mm: f64,
    pub pressure_in: f64,
    pub pressure_mb: f64,
    pub temp_c: f64,
    pub temp_f: f64,
    pub uv: f64,
    pub vis_km: f64,
    pub vis_miles: f64,
    pub wind_degree: i64,
    pub wind_dir: String,
    pub wind_kph: f64,
    pub wind_mph: f64,
    pub windchill_c: f64,
    pub windchill_f: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Condition {
    pub code: i64,
    pub icon: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    pub country: String,
    pub lat: f64,
    pub localtime: String,
    pub localtime_epoch: i64,
    pub lon: f64,
    pub name: String,
    pub region: String,
    pub tz_id: String,
}
