/// Glossary of wave parameters.
///
/// Maps the short field codes used by the observations API (`hs`, `tp`,
/// `sst`, …) to descriptive column names, measurement units and a
/// plain-language explanation. `export` takes every descriptive column
/// name from here.
///
/// Source: Coastal Monitoring wave parameter handbook
///   https://coastalmonitoring.org/ccoresources/waveparameterhandbook/

use std::collections::{BTreeSet, HashMap};
use std::fmt;

// ---------------------------------------------------------------------------
// Units
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasurementUnit {
    Metres,
    Seconds,
    DegreesCelsius,
    KilowattsPerMetre,
    Degrees,
}

impl MeasurementUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            MeasurementUnit::Metres => "m",
            MeasurementUnit::Seconds => "s",
            MeasurementUnit::DegreesCelsius => "°C",
            MeasurementUnit::KilowattsPerMetre => "kW/m",
            MeasurementUnit::Degrees => "°",
        }
    }
}

impl fmt::Display for MeasurementUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.symbol())
    }
}

// ---------------------------------------------------------------------------
// Parameter entries
// ---------------------------------------------------------------------------

/// A single glossary entry.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveParameter {
    /// Field code as it appears on the wire, e.g. `"hs"`.
    pub abbreviation: &'static str,
    /// Long column name, e.g. `"wave_height_significant_m"`.
    pub descriptive_name: &'static str,
    pub unit: MeasurementUnit,
    pub description: &'static str,
}

impl fmt::Display for WaveParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<7} {:<32} {:<5} {}",
            self.abbreviation, self.descriptive_name, self.unit, self.description
        )
    }
}

/// Every wave parameter the service reports, in handbook order.
pub static GLOSSARY: &[WaveParameter] = &[
    WaveParameter {
        abbreviation: "hs",
        descriptive_name: "wave_height_significant_m",
        unit: MeasurementUnit::Metres,
        description: "Mean height of the highest 1/3rd of the waves. \
                      Significant wave height, statistically-derived.",
    },
    WaveParameter {
        abbreviation: "hmax",
        descriptive_name: "wave_height_max_m",
        unit: MeasurementUnit::Metres,
        description: "Maximum wave height, i.e. largest zero-upcrossing wave.",
    },
    WaveParameter {
        abbreviation: "tp",
        descriptive_name: "wave_period_peak_s",
        unit: MeasurementUnit::Seconds,
        description: "The peak period. The period associated with the most \
                      energetic waves in the wave spectrum.",
    },
    WaveParameter {
        abbreviation: "tz",
        descriptive_name: "wave_period_mean_s",
        unit: MeasurementUnit::Seconds,
        description: "Mean period of all waves, i.e. the zero-upcross period Tz.",
    },
    WaveParameter {
        abbreviation: "te",
        descriptive_name: "wave_period_energy_equivalent_s",
        unit: MeasurementUnit::Seconds,
        description: "The period of an energy equivalent regular wave. In other \
                      words, the period corresponding to the weighted average \
                      of the wave energy.",
    },
    WaveParameter {
        abbreviation: "sst",
        descriptive_name: "sea_surface_temperature_degc",
        unit: MeasurementUnit::DegreesCelsius,
        description: "Sea surface temperature.",
    },
    WaveParameter {
        abbreviation: "power",
        descriptive_name: "wave_power_kwperm",
        unit: MeasurementUnit::KilowattsPerMetre,
        description: "Wave power. The rate of transfer of energy through each \
                      metre of wavefront.",
    },
    WaveParameter {
        abbreviation: "pdir",
        descriptive_name: "wave_direction_deg",
        unit: MeasurementUnit::Degrees,
        description: "The wave direction associated with the most energetic \
                      waves in the wave spectrum. Also referred to as the peak \
                      direction.",
    },
    WaveParameter {
        abbreviation: "spread",
        descriptive_name: "directional_wave_spread_deg",
        unit: MeasurementUnit::Degrees,
        description: "The directional wave spread at the peak frequency.",
    },
];

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

/// Looks up a parameter by its field code. Returns `None` if not found.
pub fn lookup(abbreviation: &str) -> Option<&'static WaveParameter> {
    GLOSSARY.iter().find(|p| p.abbreviation == abbreviation)
}

/// Abbreviation → descriptive name for every glossary entry.
///
/// Built from the static table, never from a particular response, so the
/// mapping is the same whatever fields a payload happens to carry.
pub fn column_mapping() -> HashMap<&'static str, &'static str> {
    GLOSSARY
        .iter()
        .map(|p| (p.abbreviation, p.descriptive_name))
        .collect()
}

/// All known field codes.
pub fn abbreviations() -> BTreeSet<&'static str> {
    GLOSSARY.iter().map(|p| p.abbreviation).collect()
}

/// Descriptive name for a column key, or the key itself when the glossary
/// has no entry for it.
pub fn descriptive_name_or_key(key: &str) -> &str {
    lookup(key).map(|p| p.descriptive_name).unwrap_or(key)
}

/// Renders the whole glossary as an aligned, human-readable listing.
pub fn describe() -> String {
    let mut out = format!(
        "{:<7} {:<32} {:<5} {}\n",
        "code", "descriptive name", "unit", "description"
    );
    for parameter in GLOSSARY {
        out.push_str(&parameter.to_string());
        out.push('\n');
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
