//! Affine sensor corrections produced by the external calibration fitter.
//!
//! Persisted as a JSON object of `<group>_coeff` / `<group>_intercept`
//! keys whose values are comma-separated rows joined by newlines.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde_json::Value;

use super::error::CalibrationError;
use super::rules;

const THERMAL: [&str; 1] = [rules::TEMPERATURE];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SensorGroup {
    Acc,
    Gyro,
    Mag,
    Thermal,
}

impl SensorGroup {
    pub const ALL: [SensorGroup; 4] = [
        SensorGroup::Acc,
        SensorGroup::Gyro,
        SensorGroup::Mag,
        SensorGroup::Thermal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SensorGroup::Acc => "acc",
            SensorGroup::Gyro => "gyro",
            SensorGroup::Mag => "mag",
            SensorGroup::Thermal => "thermal",
        }
    }

    /// SI fields the correction maps, in vector order.
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            SensorGroup::Acc => &rules::ACCELERATION,
            SensorGroup::Gyro => &rules::ANGULAR_VELOCITY,
            SensorGroup::Mag => &rules::MAGNETIC_FIELD,
            SensorGroup::Thermal => &THERMAL,
        }
    }

    pub fn dimension(self) -> usize {
        self.fields().len()
    }
}

impl fmt::Display for SensorGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `corrected = coefficients · value + intercept`
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationCorrection {
    pub coefficients: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
}

impl CalibrationCorrection {
    pub fn identity(dimension: usize) -> Self {
        let coefficients = (0..dimension)
            .map(|row| {
                (0..dimension)
                    .map(|col| if row == col { 1.0 } else { 0.0 })
                    .collect()
            })
            .collect();
        Self {
            coefficients,
            intercept: vec![0.0; dimension],
        }
    }

    /// Single-axis form.
    pub fn scalar(gain: f64, offset: f64) -> Self {
        Self {
            coefficients: vec![vec![gain]],
            intercept: vec![offset],
        }
    }

    pub fn dimension(&self) -> usize {
        self.intercept.len()
    }

    pub fn apply(&self, value: &[f64]) -> Vec<f64> {
        self.coefficients
            .iter()
            .zip(&self.intercept)
            .map(|(row, intercept)| {
                row.iter().zip(value).map(|(c, v)| c * v).sum::<f64>() + intercept
            })
            .collect()
    }

    fn validate(&self, group: SensorGroup) -> Result<(), CalibrationError> {
        let n = group.dimension();
        let square = self.coefficients.len() == n && self.coefficients.iter().all(|r| r.len() == n);
        if !square {
            return Err(CalibrationError::Dimension {
                group,
                expected: format!("{n}x{n} coefficients"),
                found: format!(
                    "{}x{} coefficients",
                    self.coefficients.len(),
                    self.coefficients.first().map(Vec::len).unwrap_or(0)
                ),
            });
        }
        if self.intercept.len() != n {
            return Err(CalibrationError::Dimension {
                group,
                expected: format!("{n} intercept values"),
                found: format!("{} intercept values", self.intercept.len()),
            });
        }
        Ok(())
    }
}

/// Per-group corrections; groups without an entry pass through unchanged.
///
/// # Examples
/// ```
/// use fintrace_core::{Calibration, SensorGroup};
///
/// let json = r#"{"thermal_coeff": "2", "thermal_intercept": "-0.5"}"#;
/// let calibration = Calibration::from_json_str(json).unwrap();
/// let thermal = calibration.get(SensorGroup::Thermal).unwrap();
/// assert_eq!(thermal.apply(&[20.0]), vec![39.5]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Calibration {
    corrections: BTreeMap<SensorGroup, CalibrationCorrection>,
}

impl Calibration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self, CalibrationError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, CalibrationError> {
        let entries: BTreeMap<String, Value> = serde_json::from_str(text)?;
        let mut calibration = Self::new();
        for group in SensorGroup::ALL {
            let coeff_key = format!("{group}_coeff");
            let intercept_key = format!("{group}_intercept");
            let coefficients = entries
                .get(&coeff_key)
                .map(|value| parse_rows(&coeff_key, value))
                .transpose()?;
            let intercept = entries
                .get(&intercept_key)
                .map(|value| parse_rows(&intercept_key, value))
                .transpose()?;
            if coefficients.is_none() && intercept.is_none() {
                continue;
            }
            let n = group.dimension();
            let correction = CalibrationCorrection {
                coefficients: coefficients
                    .unwrap_or_else(|| CalibrationCorrection::identity(n).coefficients),
                intercept: intercept
                    .map(|rows| rows.into_iter().flatten().collect())
                    .unwrap_or_else(|| vec![0.0; n]),
            };
            calibration.insert(group, correction)?;
        }
        Ok(calibration)
    }

    pub fn insert(
        &mut self,
        group: SensorGroup,
        correction: CalibrationCorrection,
    ) -> Result<(), CalibrationError> {
        correction.validate(group)?;
        self.corrections.insert(group, correction);
        Ok(())
    }

    pub fn get(&self, group: SensorGroup) -> Option<&CalibrationCorrection> {
        self.corrections.get(&group)
    }

    pub fn is_empty(&self) -> bool {
        self.corrections.is_empty()
    }
}

fn parse_rows(key: &str, value: &Value) -> Result<Vec<Vec<f64>>, CalibrationError> {
    let text = match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        other => {
            return Err(CalibrationError::Number {
                key: key.to_string(),
                value: other.to_string(),
            });
        }
    };
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.split(',')
                .map(|element| {
                    element
                        .trim()
                        .parse::<f64>()
                        .map_err(|_| CalibrationError::Number {
                            key: key.to_string(),
                            value: element.to_string(),
                        })
                })
                .collect()
        })
        .collect()
}
