//! Raw → SI conversion.
//!
//! A pure post-pass over decoded ensembles. Raw fields are never touched:
//! every derived value is added next to them in an `SiEnsemble`, and an
//! optional `Calibration` refines whole sensor groups afterwards.

pub mod calibration;
pub mod error;
pub mod rules;

use std::fmt;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::packet::ensemble::{Ensemble, RawValue};
use crate::packet::layout;

pub use calibration::{Calibration, CalibrationCorrection, SensorGroup};
pub use error::CalibrationError;
use rules::{SiRule, Transform};

#[derive(Debug, Clone, PartialEq)]
pub enum SiValue {
    Number(f64),
    Flag(bool),
    Text(String),
}

impl SiValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            SiValue::Number(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for SiValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiValue::Number(value) => write!(f, "{value}"),
            SiValue::Flag(value) => write!(f, "{value}"),
            SiValue::Text(value) => f.write_str(value),
        }
    }
}

/// An ensemble plus the SI fields derived from it, in rule order.
#[derive(Debug, Clone, PartialEq)]
pub struct SiEnsemble {
    pub ensemble: Ensemble,
    pub derived: Vec<(String, SiValue)>,
}

impl SiEnsemble {
    pub fn get(&self, name: &str) -> Option<&SiValue> {
        self.derived
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut SiValue> {
        self.derived
            .iter_mut()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }
}

/// Convert a decoded sequence to SI units.
///
/// # Examples
/// ```
/// use fintrace_core::{Calibration, Ensemble, Payload, Thermal, convert};
/// use fintrace_core::units::SiValue;
///
/// let ensemble = Ensemble::new(0, Payload::TempWater(Thermal { temp: 2560, water: 0 }));
/// let si = convert(&[ensemble], &Calibration::default());
/// assert_eq!(si[0].get("Temperature (C)"), Some(&SiValue::Number(20.0)));
/// assert_eq!(si[0].get("Water Detect"), Some(&SiValue::Flag(false)));
/// ```
pub fn convert(ensembles: &[Ensemble], calibration: &Calibration) -> Vec<SiEnsemble> {
    ensembles
        .iter()
        .map(|ensemble| convert_one(ensemble, calibration))
        .collect()
}

/// Add any derived fields missing from already-converted ensembles.
/// Existing derived values are kept as they are.
pub fn reconvert(ensembles: &[SiEnsemble], calibration: &Calibration) -> Vec<SiEnsemble> {
    ensembles
        .iter()
        .map(|si| {
            let mut merged = si.clone();
            for (name, value) in convert_one(&si.ensemble, calibration).derived {
                if merged.get(&name).is_none() {
                    merged.derived.push((name, value));
                }
            }
            merged
        })
        .collect()
}

fn convert_one(ensemble: &Ensemble, calibration: &Calibration) -> SiEnsemble {
    let mut si = SiEnsemble {
        ensemble: ensemble.clone(),
        derived: Vec::new(),
    };
    if let Some(descriptor) = layout::descriptor(ensemble.data_type()) {
        for (field, (_, raw)) in descriptor.fields.iter().zip(ensemble.raw_fields()) {
            let Some(rule) = rules::rule_for(field) else {
                continue;
            };
            if let Some(value) = apply_rule(&rule, &raw) {
                si.derived.push((rule.target.to_string(), value));
            }
        }
    }
    for group in SensorGroup::ALL {
        if let Some(correction) = calibration.get(group) {
            calibrate(&mut si, group, correction);
        }
    }
    si
}

fn apply_rule(rule: &SiRule, raw: &RawValue) -> Option<SiValue> {
    let raw = raw.as_int()?;
    match rule.transform {
        Transform::Linear { scale, offset } => Some(SiValue::Number(raw as f64 * scale + offset)),
        Transform::Flag => Some(SiValue::Flag(raw > 0)),
        Transform::Epoch => OffsetDateTime::from_unix_timestamp(raw)
            .ok()
            .and_then(|at| at.format(&Rfc3339).ok())
            .map(SiValue::Text),
    }
}

fn calibrate(si: &mut SiEnsemble, group: SensorGroup, correction: &CalibrationCorrection) {
    let values: Option<Vec<f64>> = group
        .fields()
        .iter()
        .map(|name| si.get(name).and_then(SiValue::as_number))
        .collect();
    let Some(values) = values else {
        return;
    };
    for (name, corrected) in group.fields().iter().zip(correction.apply(&values)) {
        if let Some(slot) = si.get_mut(name) {
            *slot = SiValue::Number(corrected);
        }
    }
}
