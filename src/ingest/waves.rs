/// Wave observation response parser
///
/// Turns an observations API response body (a GeoJSON-style feature
/// collection) into a validated `Observation`. Parsing is all-or-nothing:
/// the first structural problem anywhere in the document aborts the parse
/// and is reported with the path of the offending field, e.g.
/// `features[2].properties.sst`.
///
/// Response shape:
///
/// ```text
/// { "type": "FeatureCollection",
///   "features": [
///     { "type": "Feature", "id": "waves.107",
///       "geometry": { "type": "Point", "coordinates": [lon, lat] },
///       "properties": { "id": "107", "sensor": "Porthleven", "date": "20250104#093000",
///                       "type": "waves", "hs": "0.82", "sst": "None", … } } ] }
/// ```

use serde_json::{Map, Value};

use crate::ingest::normalize::{parse_measurement, parse_timestamp, reorder_coordinates};
use crate::model::{ClientError, Endpoint, Feature, Geometry, Observation, PropertiesWave};

// ---------------------------------------------------------------------------
// Field aliases
// ---------------------------------------------------------------------------

/// A field together with every key it may appear under. `name` is used in
/// error paths; `aliases` lists the lowerCamelCase wire key first, then the
/// semantic key found in re-serialized payloads.
struct FieldName {
    name: &'static str,
    aliases: &'static [&'static str],
}

const fn field(name: &'static str, aliases: &'static [&'static str]) -> FieldName {
    FieldName { name, aliases }
}

const TYPE: FieldName = field("type", &["type"]);
const FEATURES: FieldName = field("features", &["features"]);
const ID: FieldName = field("id", &["id"]);
const GEOMETRY: FieldName = field("geometry", &["geometry"]);
const PROPERTIES: FieldName = field("properties", &["properties"]);
const COORDINATES: FieldName = field("coordinates", &["coordinates"]);

const SENSOR: FieldName = field("sensor", &["sensor"]);
const INSTITUTION: FieldName = field("institution", &["institution"]);
const DATE: FieldName = field("date", &["date"]);
const BOUNDED_BY: FieldName = field("bounded_by", &["boundedBy", "bounded_by"]);
const MS_GEOMETRY: FieldName = field("ms_geometry", &["msGeometry", "ms_geometry"]);
const MS_GEOMETRY_OSGB: FieldName =
    field("ms_geometry_osgb", &["msGeometryOsgb", "ms_geometry_osgb"]);

// ---------------------------------------------------------------------------
// Field access helpers
// ---------------------------------------------------------------------------

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}

fn as_object<'a>(path: &str, value: &'a Value) -> Result<&'a Map<String, Value>, ClientError> {
    value.as_object().ok_or_else(|| {
        let field = if path.is_empty() { "(root)" } else { path };
        ClientError::validation(field, format!("expected an object, got {}", kind_of(value)))
    })
}

/// Finds a field under any of its accepted names.
fn lookup<'a>(object: &'a Map<String, Value>, field: &FieldName) -> Option<&'a Value> {
    field.aliases.iter().find_map(|alias| object.get(*alias))
}

fn required<'a>(
    object: &'a Map<String, Value>,
    path: &str,
    field: &FieldName,
) -> Result<&'a Value, ClientError> {
    lookup(object, field)
        .ok_or_else(|| ClientError::validation(join(path, field.name), "missing required field"))
}

fn required_str<'a>(
    object: &'a Map<String, Value>,
    path: &str,
    field: &FieldName,
) -> Result<&'a str, ClientError> {
    let value = required(object, path, field)?;
    value.as_str().ok_or_else(|| {
        ClientError::validation(
            join(path, field.name),
            format!("expected a string, got {}", kind_of(value)),
        )
    })
}

/// Passthrough fields: kept verbatim, JSON `null` treated as absent.
fn passthrough(object: &Map<String, Value>, field: &FieldName) -> Option<Value> {
    lookup(object, field).filter(|v| !v.is_null()).cloned()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Parsers
// ---------------------------------------------------------------------------

/// Parses a response body into an `Observation`.
///
/// # Errors
/// - `ClientError::Json` — the body is not JSON.
/// - `ClientError::Validation` — a required field is missing, has the wrong
///   type, or the endpoint tag is unknown.
/// - `ClientError::MalformedTimestamp` / `MalformedMeasurement` /
///   `MalformedGeometry` — a field is present but cannot be normalized.
pub fn parse_observation(json: &str) -> Result<Observation, ClientError> {
    let value: Value = serde_json::from_str(json)?;
    observation_from_value(&value)
}

/// Same as `parse_observation`, for a document that is already decoded.
pub fn observation_from_value(value: &Value) -> Result<Observation, ClientError> {
    let root = as_object("", value)?;
    let kind = required_str(root, "", &TYPE)?.to_string();

    let features_value = required(root, "", &FEATURES)?;
    let features_array = features_value.as_array().ok_or_else(|| {
        ClientError::validation(
            FEATURES.name,
            format!("expected an array, got {}", kind_of(features_value)),
        )
    })?;

    let features = features_array
        .iter()
        .enumerate()
        .map(|(i, f)| parse_feature(&format!("features[{}]", i), f))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Observation { kind, features })
}

fn parse_feature(path: &str, value: &Value) -> Result<Feature, ClientError> {
    let object = as_object(path, value)?;

    let kind = required_str(object, path, &TYPE)?.to_string();
    let id = required_str(object, path, &ID)?.to_string();
    let geometry = parse_geometry(&join(path, GEOMETRY.name), required(object, path, &GEOMETRY)?)?;
    let properties =
        parse_properties(&join(path, PROPERTIES.name), required(object, path, &PROPERTIES)?)?;

    Ok(Feature {
        kind,
        id,
        geometry,
        properties,
    })
}

fn parse_geometry(path: &str, value: &Value) -> Result<Geometry, ClientError> {
    let object = as_object(path, value)?;

    let kind = required_str(object, path, &TYPE)?.to_string();
    let coordinates = reorder_coordinates(
        &join(path, COORDINATES.name),
        required(object, path, &COORDINATES)?,
    )?;

    Ok(Geometry { kind, coordinates })
}

fn parse_properties(path: &str, value: &Value) -> Result<PropertiesWave, ClientError> {
    let object = as_object(path, value)?;

    let id = required_str(object, path, &ID)?.to_string();
    let sensor = required_str(object, path, &SENSOR)?.to_string();
    let institution = required_str(object, path, &INSTITUTION)?.to_string();
    let date = parse_timestamp(required_str(object, path, &DATE)?)?;

    let endpoint_tag = required_str(object, path, &TYPE)?;
    let endpoint: Endpoint = endpoint_tag
        .parse()
        .map_err(|reason: String| ClientError::validation(join(path, TYPE.name), reason))?;

    // Measurement codes are single lowercase words, identical in every naming.
    let measurement = |name: &str| -> Result<Option<f64>, ClientError> {
        let value = object
            .get(name)
            .ok_or_else(|| ClientError::validation(join(path, name), "missing required field"))?;
        parse_measurement(&join(path, name), value)
    };

    Ok(PropertiesWave {
        id,
        sensor,
        institution,
        date,
        endpoint,
        hs: measurement("hs")?,
        hmax: measurement("hmax")?,
        sst: measurement("sst")?,
        value: measurement("value")?,
        tp: measurement("tp")?,
        tz: measurement("tz")?,
        pdir: measurement("pdir")?,
        spread: measurement("spread")?,
        te: measurement("te")?,
        power: measurement("power")?,
        bounded_by: passthrough(object, &BOUNDED_BY),
        ms_geometry: passthrough(object, &MS_GEOMETRY),
        ms_geometry_osgb: passthrough(object, &MS_GEOMETRY_OSGB),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
