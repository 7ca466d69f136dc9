//! Raw → SI conversion rules.

use crate::packet::layout::FieldDescriptor;

pub const TEMPERATURE: &str = "Temperature (C)";
pub const WATER_DETECT: &str = "Water Detect";
pub const BATTERY: &str = "Battery (V)";
pub const EPOCH: &str = "Epoch (UTC)";
pub const ACCELERATION: [&str; 3] = [
    "X Acceleration (m/s^2)",
    "Y Acceleration (m/s^2)",
    "Z Acceleration (m/s^2)",
];
pub const ANGULAR_VELOCITY: [&str; 3] = [
    "X Angular Velocity (deg/s)",
    "Y Angular Velocity (deg/s)",
    "Z Angular Velocity (deg/s)",
];
pub const MAGNETIC_FIELD: [&str; 3] = [
    "X Magnetic Field (uT)",
    "Y Magnetic Field (uT)",
    "Z Magnetic Field (uT)",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    /// `raw * scale + offset`
    Linear { scale: f64, offset: f64 },
    /// `raw > 0`
    Flag,
    /// Unix seconds rendered as RFC 3339.
    Epoch,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SiRule {
    pub raw: &'static str,
    pub target: &'static str,
    pub transform: Transform,
}

const fn linear(raw: &'static str, target: &'static str, scale: f64) -> SiRule {
    SiRule {
        raw,
        target,
        transform: Transform::Linear { scale, offset: 0.0 },
    }
}

const ACC_SCALE: f64 = 1.0 / 16384.0;
const GYRO_SCALE: f64 = 1.0 / 131.072;
const MAG_SCALE: f64 = 0.15;

pub const RULES: [SiRule; 16] = [
    linear("temp", TEMPERATURE, 1.0 / 128.0),
    SiRule {
        raw: "water",
        target: WATER_DETECT,
        transform: Transform::Flag,
    },
    linear("xAcc", ACCELERATION[0], ACC_SCALE),
    linear("yAcc", ACCELERATION[1], ACC_SCALE),
    linear("zAcc", ACCELERATION[2], ACC_SCALE),
    linear("xGyro", ANGULAR_VELOCITY[0], GYRO_SCALE),
    linear("yGyro", ANGULAR_VELOCITY[1], GYRO_SCALE),
    linear("zGyro", ANGULAR_VELOCITY[2], GYRO_SCALE),
    linear("xMag", MAGNETIC_FIELD[0], MAG_SCALE),
    linear("yMag", MAGNETIC_FIELD[1], MAG_SCALE),
    linear("zMag", MAGNETIC_FIELD[2], MAG_SCALE),
    linear("battery", BATTERY, 1.0 / 1000.0),
    SiRule {
        raw: "epoch",
        target: EPOCH,
        transform: Transform::Epoch,
    },
    // Gyro axes of the fixed-point IMU record; scaled by the descriptor.
    linear("xAng", ANGULAR_VELOCITY[0], 1.0),
    linear("yAng", ANGULAR_VELOCITY[1], 1.0),
    linear("zAng", ANGULAR_VELOCITY[2], 1.0),
];

/// Rule for a field of the dispatch table. Fixed-point fields keep the
/// target name of their axis but divide by the field's own scale.
pub fn rule_for(field: &FieldDescriptor) -> Option<SiRule> {
    let rule = RULES
        .iter()
        .find(|rule| rule.raw == field.name)
        .copied()?;
    if field.is_fixed_point() {
        return Some(SiRule {
            transform: Transform::Linear {
                scale: 1.0 / field.scale,
                offset: 0.0,
            },
            ..rule
        });
    }
    Some(rule)
}
