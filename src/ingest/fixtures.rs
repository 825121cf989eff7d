/// Representative observations API response payloads, for tests only.
///
/// Measurement encodings are deliberately mixed the way the live service
/// mixes them: numeric strings, bare JSON numbers and the `"None"` sentinel
/// all appear.

/// Single-sensor response for Porthleven at 2025-01-04 09:30 UTC.
///
/// Shared with the integration tests under `tests/data/`.
pub fn fixture_porthleven_json() -> &'static str {
    include_str!("../../tests/data/observation_waves.json")
}

/// Three sensors, deliberately not in timestamp order:
/// Perranporth 09:30, Porthleven 09:00, Looe Bay 09:15.
pub fn fixture_multi_feature_json() -> &'static str {
    r#"{
      "type": "FeatureCollection",
      "features": [
        {
          "type": "Feature",
          "id": "waves.111",
          "geometry": { "type": "Point", "coordinates": [-5.16195, 50.35418] },
          "properties": {
            "id": "111", "sensor": "Perranporth", "institution": "Cornwall Council",
            "date": "20250104#093000", "type": "waves",
            "hs": "1.93", "hmax": "3.10", "sst": "10.9", "value": "None",
            "tp": "14.3", "tz": "7.1", "pdir": "281", "spread": "24",
            "te": "11.6", "power": "21.4"
          }
        },
        {
          "type": "Feature",
          "id": "waves.107",
          "geometry": { "type": "Point", "coordinates": [-5.30745, 50.06223] },
          "properties": {
            "id": "107", "sensor": "Porthleven", "institution": "Cornwall Council",
            "date": "20250104#090000", "type": "waves",
            "hs": 0.79, "hmax": 1.36, "sst": 11.3, "value": "None",
            "tp": 12.5, "tz": 6.0, "pdir": 250, "spread": 30,
            "te": 9.7, "power": 3.6
          }
        },
        {
          "type": "Feature",
          "id": "waves.118",
          "geometry": { "type": "Point", "coordinates": [-4.40623, 50.33715] },
          "properties": {
            "id": "118", "sensor": "Looe Bay", "institution": "Cornwall Council",
            "date": "20250104#091500", "type": "waves",
            "hs": "0.41", "hmax": "0.77", "sst": "None", "value": "None",
            "tp": "None", "tz": "4.8", "pdir": "None", "spread": "None",
            "te": "6.2", "power": "0.6"
          }
        }
      ]
    }"#
}
