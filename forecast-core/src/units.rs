//! Unit conversion helpers shared by every provider adapter.
//!
//! Adapters normalize their raw readings to degrees Celsius and meters per
//! second first; these helpers then produce the value and label the station
//! is configured to display.

use serde::{Deserialize, Serialize};

/// Miles per hour in one meter per second.
pub const MPS_TO_MPH: f64 = 2.2369362920544;
const MPS_TO_KPH: f64 = 3.6;
const MPS_TO_KTS: f64 = 1.9438444924406;

/// Lower bound, in m/s, of Beaufort forces 1 through 12.
const BEAUFORT_LOWER_BOUNDS: [f64; 12] =
    [0.3, 1.6, 3.4, 5.5, 8.0, 10.8, 13.9, 17.2, 20.8, 24.5, 28.5, 32.7];

const CARDINAL_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW",
    "NW", "NNW",
];

/// Display scale for temperatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TempUnit {
    #[default]
    C,
    F,
}

impl TempUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TempUnit::C => "c",
            TempUnit::F => "f",
        }
    }
}

impl TryFrom<&str> for TempUnit {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "c" => Ok(TempUnit::C),
            "f" => Ok(TempUnit::F),
            _ => Err(anyhow::anyhow!("Unknown temperature unit '{value}'. Supported: c, f.")),
        }
    }
}

/// Display unit for wind speeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WindUnit {
    Mps,
    #[default]
    Mph,
    Kph,
    Kts,
    Bft,
}

impl WindUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindUnit::Mps => "mps",
            WindUnit::Mph => "mph",
            WindUnit::Kph => "kph",
            WindUnit::Kts => "kts",
            WindUnit::Bft => "bft",
        }
    }

    pub const fn all() -> &'static [WindUnit] {
        &[WindUnit::Mps, WindUnit::Mph, WindUnit::Kph, WindUnit::Kts, WindUnit::Bft]
    }
}

impl TryFrom<&str> for WindUnit {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();
        WindUnit::all()
            .iter()
            .copied()
            .find(|unit| unit.as_str() == lower)
            .ok_or_else(|| {
                anyhow::anyhow!("Unknown wind unit '{value}'. Supported: mps, mph, kph, kts, bft.")
            })
    }
}

/// Convert a Celsius reading into the display scale.
pub fn convert_temperature(celsius: f64, unit: TempUnit) -> (f64, &'static str) {
    let value = match unit {
        TempUnit::C => celsius,
        TempUnit::F => celsius * 9.0 / 5.0 + 32.0,
    };
    (value, unit.as_str())
}

/// Convert a meters-per-second reading into the display unit.
pub fn convert_wind_speed(mps: f64, unit: WindUnit) -> (f64, &'static str) {
    let value = match unit {
        WindUnit::Mps => mps,
        WindUnit::Mph => mps * MPS_TO_MPH,
        WindUnit::Kph => mps * MPS_TO_KPH,
        WindUnit::Kts => mps * MPS_TO_KTS,
        WindUnit::Bft => beaufort_force(mps) as f64,
    };
    (value, unit.as_str())
}

fn beaufort_force(mps: f64) -> usize {
    BEAUFORT_LOWER_BOUNDS.partition_point(|bound| *bound <= mps)
}

/// Convert a miles-per-hour reading to meters per second.
pub fn mph_to_mps(mph: f64) -> f64 {
    mph / MPS_TO_MPH
}

/// 16-point compass label for a bearing in degrees.
pub fn cardinal_direction(bearing: f64) -> &'static str {
    let normalized = bearing.rem_euclid(360.0);
    let sector = ((normalized / 22.5) + 0.5).floor() as usize % CARDINAL_POINTS.len();
    CARDINAL_POINTS[sector]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn celsius_passes_through() {
        assert_eq!(convert_temperature(12.5, TempUnit::C), (12.5, "c"));
    }

    #[test]
    fn fahrenheit_conversion() {
        let (value, label) = convert_temperature(100.0, TempUnit::F);
        assert!((value - 212.0).abs() < 1e-9);
        assert_eq!(label, "f");
    }

    #[test]
    fn wind_speed_conversions() {
        let (mph, label) = convert_wind_speed(10.0 / MPS_TO_MPH, WindUnit::Mph);
        assert!((mph - 10.0).abs() < 1e-9);
        assert_eq!(label, "mph");

        let (kph, _) = convert_wind_speed(10.0, WindUnit::Kph);
        assert!((kph - 36.0).abs() < 1e-9);

        let (kts, _) = convert_wind_speed(1.0, WindUnit::Kts);
        assert!((kts - 1.9438444924406).abs() < 1e-9);
    }

    #[test]
    fn ten_mph_in_meters_per_second() {
        assert!((mph_to_mps(10.0) - 4.4704).abs() < 1e-6);
    }

    #[test]
    fn beaufort_thresholds() {
        assert_eq!(convert_wind_speed(0.0, WindUnit::Bft), (0.0, "bft"));
        assert_eq!(convert_wind_speed(0.3, WindUnit::Bft).0, 1.0);
        assert_eq!(convert_wind_speed(5.4, WindUnit::Bft).0, 3.0);
        assert_eq!(convert_wind_speed(5.5, WindUnit::Bft).0, 4.0);
        assert_eq!(convert_wind_speed(40.0, WindUnit::Bft).0, 12.0);
    }

    #[test]
    fn cardinal_labels() {
        assert_eq!(cardinal_direction(0.0), "N");
        assert_eq!(cardinal_direction(11.0), "N");
        assert_eq!(cardinal_direction(12.0), "NNE");
        assert_eq!(cardinal_direction(90.0), "E");
        assert_eq!(cardinal_direction(202.5), "SSW");
        assert_eq!(cardinal_direction(350.0), "N");
        assert_eq!(cardinal_direction(360.0), "N");
        assert_eq!(cardinal_direction(-90.0), "W");
    }

    #[test]
    fn unit_names_parse() {
        assert_eq!(TempUnit::try_from("F").unwrap(), TempUnit::F);
        assert_eq!(WindUnit::try_from("kts").unwrap(), WindUnit::Kts);
        assert!(WindUnit::try_from("furlongs").is_err());
    }
}
