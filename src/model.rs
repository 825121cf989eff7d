/// Observation, Feature, Geometry, PropertiesWave, ClientError
/// core data structures and error handling
///
/// Core data types for the coastal monitoring client.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no parsing logic and no I/O: values are built by
/// `ingest::waves` and consumed by `export` and `client`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::ser::{SerializeMap, SerializeTuple, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::ingest::normalize::{NO_DATA_SENTINEL, RESPONSE_DATE_FORMAT};

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

/// Root of every observations endpoint.
pub const BASE_URL: &str = "https://coastalmonitoring.org/observations";

/// Observation endpoints published by the Coastal Monitoring API.
///
/// Only `Waves` has a retrieval operation; the others are recognised so the
/// `type` tag of a response can be validated against the full set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    Waves,
    Tides,
    TidePredictions,
    Met,
}

impl Endpoint {
    pub const ALL: [Endpoint; 4] = [
        Endpoint::Waves,
        Endpoint::Tides,
        Endpoint::TidePredictions,
        Endpoint::Met,
    ];

    /// URL path segment for this endpoint, e.g. `"tidepredictions"`.
    pub fn segment(&self) -> &'static str {
        match self {
            Endpoint::Waves => "waves",
            Endpoint::Tides => "tides",
            Endpoint::TidePredictions => "tidepredictions",
            Endpoint::Met => "met",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segment())
    }
}

impl FromStr for Endpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waves" => Ok(Endpoint::Waves),
            "tides" => Ok(Endpoint::Tides),
            "tidepredictions" | "tide-predictions" => Ok(Endpoint::TidePredictions),
            "met" => Ok(Endpoint::Met),
            other => Err(format!(
                "unknown endpoint '{}', expected one of waves, tides, tidepredictions, met",
                other
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Location types
// ---------------------------------------------------------------------------

/// A WGS84 position. The wire order is `[longitude, latitude]`; this type
/// always stores the pair by name so callers never have to remember that.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Location of a feature, e.g. `Point` at the sensor's buoy position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(serialize_with = "serialize_lon_lat")]
    pub coordinates: Coordinates,
}

/// Writes coordinates back in GeoJSON `[longitude, latitude]` order.
fn serialize_lon_lat<S: Serializer>(c: &Coordinates, serializer: S) -> Result<S::Ok, S::Error> {
    let mut pair = serializer.serialize_tuple(2)?;
    pair.serialize_element(&c.longitude)?;
    pair.serialize_element(&c.latitude)?;
    pair.end()
}

// ---------------------------------------------------------------------------
// Measurement record
// ---------------------------------------------------------------------------

/// One wave observation as reported by a sensor.
///
/// Every numeric measurement is either a finite value or `None` when the
/// service reported the `"None"` no-data sentinel.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertiesWave {
    /// Unique identifier of the sensor, e.g. `"107"`.
    pub id: String,
    /// Name of the sensor, e.g. `"Porthleven"`.
    pub sensor: String,
    pub institution: String,
    pub date: DateTime<Utc>,
    pub endpoint: Endpoint,

    pub hs: Option<f64>,     // significant wave height (m)
    pub hmax: Option<f64>,   // maximum wave height (m)
    pub sst: Option<f64>,    // sea surface temperature (°C)
    pub value: Option<f64>,
    pub tp: Option<f64>,     // peak period (s)
    pub tz: Option<f64>,     // mean zero-upcross period (s)
    pub pdir: Option<f64>,   // peak direction (°)
    pub spread: Option<f64>, // directional spread (°)
    pub te: Option<f64>,     // energy period (s)
    pub power: Option<f64>,  // wave power (kW/m)

    /// Carried through untouched; the service's own bounding box.
    pub bounded_by: Option<serde_json::Value>,
    /// Carried through untouched; alternate geometry encodings.
    pub ms_geometry: Option<serde_json::Value>,
    pub ms_geometry_osgb: Option<serde_json::Value>,
}

impl PropertiesWave {
    /// The measurement fields in declaration order, keyed by abbreviation.
    pub fn measurements(&self) -> [(&'static str, Option<f64>); 10] {
        [
            ("hs", self.hs),
            ("hmax", self.hmax),
            ("sst", self.sst),
            ("value", self.value),
            ("tp", self.tp),
            ("tz", self.tz),
            ("pdir", self.pdir),
            ("spread", self.spread),
            ("te", self.te),
            ("power", self.power),
        ]
    }
}

/// Serializes in the service's own encoding: compact `#` date, `type` tag,
/// `"None"` for absent measurements. The output parses back unchanged.
impl Serialize for PropertiesWave {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("sensor", &self.sensor)?;
        map.serialize_entry("institution", &self.institution)?;
        map.serialize_entry("date", &self.date.format(RESPONSE_DATE_FORMAT).to_string())?;
        map.serialize_entry("type", &self.endpoint)?;
        for (code, value) in self.measurements() {
            match value {
                Some(v) => map.serialize_entry(code, &v)?,
                None => map.serialize_entry(code, NO_DATA_SENTINEL)?,
            }
        }
        map.serialize_entry("bounded_by", &self.bounded_by)?;
        map.serialize_entry("ms_geometry", &self.ms_geometry)?;
        map.serialize_entry("ms_geometry_osgb", &self.ms_geometry_osgb)?;
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Response envelope
// ---------------------------------------------------------------------------

/// One sensor reading: where it was taken and what was measured.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: String,
    /// Feature identifier, e.g. `"waves.107"`.
    pub id: String,
    pub geometry: Geometry,
    pub properties: PropertiesWave,
}

/// A complete response from an observations endpoint.
///
/// Features keep the order in which the service returned them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<Feature>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when requesting or parsing observation data.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A request was attempted outside an open session.
    #[error("Client is not connected: open a session before making requests")]
    NotConnected,

    /// Non-2xx HTTP response from the observations API.
    #[error("Request failed with HTTP status {status_code}")]
    RequestFailed { status_code: u16 },

    /// The request never produced an HTTP response (DNS, TLS, timeout, …).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response body is not JSON.
    #[error("Response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A date string did not match `YYYYMMDD#HHMMSS`.
    #[error("Malformed timestamp '{value}': expected YYYYMMDD#HHMMSS")]
    MalformedTimestamp { value: String },

    /// A measurement was neither a number, a numeric string, nor `"None"`.
    #[error("Malformed measurement at {field}: {value}")]
    MalformedMeasurement { field: String, value: String },

    /// A coordinate pair was not exactly two numbers.
    #[error("Malformed geometry at {field}: {reason}")]
    MalformedGeometry { field: String, reason: String },

    /// A required field was missing or had the wrong type.
    #[error("Validation error at {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),
}

impl ClientError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ClientError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        ClientError::Config {
            message: message.into(),
        }
    }

    /// True for errors raised while turning a response body into an
    /// `Observation`, as opposed to transport or session failures.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            ClientError::Json(_)
                | ClientError::MalformedTimestamp { .. }
                | ClientError::MalformedMeasurement { .. }
                | ClientError::MalformedGeometry { .. }
                | ClientError::Validation { .. }
        )
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        // Headers are never part of reqwest's Display, so the key can't leak here.
        ClientError::Transport(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_segments_round_trip_through_from_str() {
        for endpoint in Endpoint::ALL {
            let parsed: Endpoint = endpoint.segment().parse().expect("segment should parse");
            assert_eq!(parsed, endpoint);
        }
    }

    #[test]
    fn test_endpoint_accepts_hyphenated_tide_predictions() {
        assert_eq!(
            "tide-predictions".parse::<Endpoint>(),
            Ok(Endpoint::TidePredictions)
        );
    }

    #[test]
    fn test_endpoint_rejects_unknown_tag() {
        assert!("currents".parse::<Endpoint>().is_err());
        assert!("Waves".parse::<Endpoint>().is_err(), "tags are case-sensitive");
    }

    #[test]
    fn test_request_failed_message_includes_status() {
        let err = ClientError::RequestFailed { status_code: 403 };
        assert!(err.to_string().contains("403"));
        assert!(!err.is_parse_error());
    }

    #[test]
    fn test_validation_error_carries_field_path() {
        let err = ClientError::validation("features[0].properties.sst", "missing required field");
        assert!(err.is_parse_error());
        assert!(err.to_string().contains("features[0].properties.sst"));
    }
}
