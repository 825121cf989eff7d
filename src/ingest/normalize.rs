/// Value normalization for observations API payloads.
///
/// The service is loose about encodings: measurements arrive as JSON
/// numbers, as numeric strings, or as the string `"None"` when a sensor did
/// not report; dates use a compact `YYYYMMDD#HHMMSS` form with no offset;
/// coordinates follow the GeoJSON `[longitude, latitude]` order. Everything
/// here turns one of those wire values into a strict typed value or an error.
///
/// Numeric strings are checked against a literal grammar before conversion.
/// Nothing received from the network is ever evaluated.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use crate::model::{ClientError, Coordinates};

/// Wire value meaning "not measured".
pub const NO_DATA_SENTINEL: &str = "None";

/// Date format used inside response bodies.
pub const RESPONSE_DATE_FORMAT: &str = "%Y%m%d#%H%M%S";

/// Date format used in request URL paths. Note: no `#`.
pub const REQUEST_DATE_FORMAT: &str = "%Y%m%d%H%M%S";

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// Parses a response date such as `"20250104#093000"` as a UTC instant.
///
/// The shape is checked strictly (8 digits, `#`, 6 digits) before chrono
/// sees it; chrono alone accepts single-digit months and days.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, ClientError> {
    let malformed = || ClientError::MalformedTimestamp {
        value: value.to_string(),
    };

    let bytes = value.as_bytes();
    let well_shaped = bytes.len() == 15
        && bytes[8] == b'#'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 8 || b.is_ascii_digit());
    if !well_shaped {
        return Err(malformed());
    }

    let naive = NaiveDateTime::parse_from_str(value, RESPONSE_DATE_FORMAT).map_err(|_| malformed())?;
    Ok(DateTime::from_naive_utc_and_offset(naive, Utc))
}

/// Formats an instant for the request path, e.g. `20250104093000`.
pub fn format_request_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(REQUEST_DATE_FORMAT).to_string()
}

// ---------------------------------------------------------------------------
// Measurements
// ---------------------------------------------------------------------------

/// Normalizes a measurement value.
///
/// - JSON number → `Some(value)`
/// - numeric literal string (`"12.3"`, `"-4"`, `"1e-3"`) → `Some(value)`
/// - `"None"` → `None`
/// - anything else → `MalformedMeasurement`
///
/// `field` is the path reported in the error, e.g. `features[0].properties.hs`.
pub fn parse_measurement(field: &str, value: &Value) -> Result<Option<f64>, ClientError> {
    let malformed = || ClientError::MalformedMeasurement {
        field: field.to_string(),
        value: value.to_string(),
    };

    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).map(Some).ok_or_else(malformed),
        Value::String(s) if s == NO_DATA_SENTINEL => Ok(None),
        Value::String(s) => parse_numeric_literal(s).map(Some).ok_or_else(malformed),
        _ => Err(malformed()),
    }
}

/// Accepts `[+-]? (digits [. digits*] | . digits) ([eE] [+-]? digits)?` and
/// nothing else. No whitespace, no `inf`/`nan`, no hex, no underscores.
pub fn parse_numeric_literal(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut i = 0;

    let digits = |from: usize| -> usize {
        bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count()
    };

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        i += 1;
    }

    let integer = digits(i);
    i += integer;

    let mut fraction = 0;
    if bytes.get(i) == Some(&b'.') {
        i += 1;
        fraction = digits(i);
        i += fraction;
    }

    if integer == 0 && fraction == 0 {
        return None;
    }

    if matches!(bytes.get(i), Some(b'e') | Some(b'E')) {
        i += 1;
        if matches!(bytes.get(i), Some(b'+') | Some(b'-')) {
            i += 1;
        }
        let exponent = digits(i);
        if exponent == 0 {
            return None;
        }
        i += exponent;
    }

    if i != bytes.len() {
        return None;
    }

    // The grammar above is a subset of what f64::from_str accepts.
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// Converts a GeoJSON `[longitude, latitude]` pair into `Coordinates`.
pub fn reorder_coordinates(field: &str, value: &Value) -> Result<Coordinates, ClientError> {
    let malformed = |reason: String| ClientError::MalformedGeometry {
        field: field.to_string(),
        reason,
    };

    let pair = value
        .as_array()
        .ok_or_else(|| malformed(format!("expected [longitude, latitude], got {}", value)))?;

    if pair.len() != 2 {
        return Err(malformed(format!("expected 2 elements, got {}", pair.len())));
    }

    let component = |index: usize| {
        pair[index]
            .as_f64()
            .ok_or_else(|| malformed(format!("element {} is not a number: {}", index, pair[index])))
    };

    let longitude = component(0)?;
    let latitude = component(1)?;

    Ok(Coordinates { latitude, longitude })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};
    use serde_json::json;

    // --- Timestamps ---------------------------------------------------------

    #[test]
    fn test_parse_timestamp_compact_response_format() {
        let parsed = parse_timestamp("20250104#093000").expect("valid timestamp should parse");
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 1, 4, 9, 30, 0).unwrap());
        assert_eq!(parsed.timezone(), Utc);
        assert_eq!(parsed.to_rfc3339(), "2025-01-04T09:30:00+00:00");
    }

    #[test]
    fn test_parse_timestamp_keeps_seconds() {
        let parsed = parse_timestamp("20241231#235959").expect("should parse");
        assert_eq!(parsed.second(), 59);
    }

    #[test]
    fn test_parse_timestamp_rejects_wrong_shape() {
        for bad in [
            "",
            "20250104093000",      // request format, no '#'
            "2025-01-04T09:30:00", // ISO 8601
            "2025014#093000",      // 7-digit date
            "20250104#0930",       // missing seconds
            "20250104#093000Z",
            " 20250104#093000",
        ] {
            assert!(
                matches!(parse_timestamp(bad), Err(ClientError::MalformedTimestamp { .. })),
                "'{}' should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_parse_timestamp_rejects_impossible_dates() {
        for bad in ["20250230#093000", "20251304#093000", "20250104#246000"] {
            assert!(
                matches!(parse_timestamp(bad), Err(ClientError::MalformedTimestamp { .. })),
                "'{}' should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_request_format_has_no_separator() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 4, 9, 30, 0).unwrap();
        assert_eq!(format_request_timestamp(&ts), "20250104093000");
    }

    // --- Measurements -------------------------------------------------------

    #[test]
    fn test_measurement_accepts_number_and_numeric_string() {
        assert_eq!(parse_measurement("hs", &json!(12.3)).unwrap(), Some(12.3));
        assert_eq!(parse_measurement("hs", &json!("12.3")).unwrap(), Some(12.3));
        assert_eq!(parse_measurement("hs", &json!(7)).unwrap(), Some(7.0));
        assert_eq!(parse_measurement("hs", &json!("-4")).unwrap(), Some(-4.0));
        assert_eq!(parse_measurement("hs", &json!("1.5e2")).unwrap(), Some(150.0));
    }

    #[test]
    fn test_measurement_sentinel_is_absent_not_error() {
        assert_eq!(parse_measurement("sst", &json!("None")).unwrap(), None);
    }

    #[test]
    fn test_measurement_rejects_non_numeric_strings() {
        for bad in ["abc", "", "none", "NaN", "inf", "12.3.4", "1_000", "0x10", " 12", "1e", "."] {
            assert!(
                matches!(
                    parse_measurement("hs", &json!(bad)),
                    Err(ClientError::MalformedMeasurement { .. })
                ),
                "'{}' should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_measurement_never_evaluates_expressions() {
        for bad in ["__import__('os')", "1+1", "2*3", "(5)", "[1]", "None or 1"] {
            let err = parse_measurement("features[0].properties.hs", &json!(bad))
                .expect_err("expression must not be accepted");
            match err {
                ClientError::MalformedMeasurement { field, .. } => {
                    assert_eq!(field, "features[0].properties.hs");
                }
                other => panic!("expected MalformedMeasurement, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_measurement_rejects_other_json_types() {
        for bad in [json!(null), json!(true), json!([1.0]), json!({"v": 1.0})] {
            assert!(
                matches!(
                    parse_measurement("tp", &bad),
                    Err(ClientError::MalformedMeasurement { .. })
                ),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_numeric_literal_grammar_edges() {
        assert_eq!(parse_numeric_literal("5."), Some(5.0));
        assert_eq!(parse_numeric_literal(".5"), Some(0.5));
        assert_eq!(parse_numeric_literal("+0.25"), Some(0.25));
        assert_eq!(parse_numeric_literal("3E-1"), Some(0.3));
        assert_eq!(parse_numeric_literal("1e999"), None, "overflow to infinity is rejected");
        assert_eq!(parse_numeric_literal("-"), None);
        assert_eq!(parse_numeric_literal("+e5"), None);
    }

    // --- Coordinates --------------------------------------------------------

    #[test]
    fn test_coordinates_are_swapped_from_lon_lat() {
        let coords = reorder_coordinates("geometry.coordinates", &json!([-5.30745, 50.06223]))
            .expect("valid pair should parse");
        assert_eq!(coords.latitude, 50.06223);
        assert_eq!(coords.longitude, -5.30745);
    }

    #[test]
    fn test_coordinates_reject_wrong_arity_and_types() {
        for bad in [
            json!([]),
            json!([1.0]),
            json!([1.0, 2.0, 3.0]),
            json!(["-5.3", 50.0]),
            json!({"lat": 50.0, "lon": -5.3}),
            json!(null),
        ] {
            assert!(
                matches!(
                    reorder_coordinates("geometry.coordinates", &bad),
                    Err(ClientError::MalformedGeometry { .. })
                ),
                "{} should be rejected",
                bad
            );
        }
    }
}
