//! Decoded record types.
//!
//! `Payload` is a closed sum type with one variant per recognized tag, so
//! the decoder and every consumer match exhaustively instead of looking up
//! field lists at runtime. `Ensemble` pairs a payload with its 20-bit
//! decisecond timestamp.

use super::layout::{self, TypeTag};

/// Temperature and water-detect pair shared by most thermal records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thermal {
    pub temp: i16,
    pub water: i8,
}

/// Low-resolution accelerometer sample (one signed byte per axis).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawAccel {
    pub x: i8,
    pub y: i8,
    pub z: i8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpsFix {
    pub lat: i32,
    pub lon: i32,
}

/// Nine-axis IMU sample: accelerometer, gyroscope, magnetometer (x, y, z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImuTriad {
    pub acc: [i16; 3],
    pub gyro: [i16; 3],
    pub mag: [i16; 3],
}

impl ImuTriad {
    fn values(&self) -> [i16; 9] {
        let [ax, ay, az] = self.acc;
        let [gx, gy, gz] = self.gyro;
        let [mx, my, mz] = self.mag;
        [ax, ay, az, gx, gy, gz, mx, my, mz]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    TempWater(Thermal),
    RawAccel(RawAccel),
    Gps,
    TempWaterRawAccel(Thermal, RawAccel),
    TempGps,
    TempWaterRawAccelGps(Thermal, RawAccel, GpsFix),
    Battery { millivolts: u16 },
    TempWaterEpoch(Thermal, u32),
    Imu(ImuTriad),
    TempWaterImu(Thermal, ImuTriad),
    TempWaterImuGps(Thermal, ImuTriad, GpsFix),
    /// Q10 accel, Q7 gyro, Q3 mag.
    ImuFixed(ImuTriad),
    Text(String),
}

/// A raw, unconverted field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Int(i64),
    Text(String),
}

impl RawValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            RawValue::Int(value) => Some(*value),
            RawValue::Text(_) => None,
        }
    }
}

impl std::fmt::Display for RawValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawValue::Int(value) => write!(f, "{value}"),
            RawValue::Text(text) => f.write_str(text),
        }
    }
}

impl Payload {
    pub fn data_type(&self) -> TypeTag {
        match self {
            Payload::TempWater(_) => TypeTag::TempWater,
            Payload::RawAccel(_) => TypeTag::RawAccel,
            Payload::Gps => TypeTag::Gps,
            Payload::TempWaterRawAccel(..) => TypeTag::TempWaterRawAccel,
            Payload::TempGps => TypeTag::TempGps,
            Payload::TempWaterRawAccelGps(..) => TypeTag::TempWaterRawAccelGps,
            Payload::Battery { .. } => TypeTag::Battery,
            Payload::TempWaterEpoch(..) => TypeTag::TempWaterEpoch,
            Payload::Imu(_) => TypeTag::Imu,
            Payload::TempWaterImu(..) => TypeTag::TempWaterImu,
            Payload::TempWaterImuGps(..) => TypeTag::TempWaterImuGps,
            Payload::ImuFixed(_) => TypeTag::ImuFixed,
            Payload::Text(_) => TypeTag::Text,
        }
    }

    /// Integer field values in wire order. Empty for text records.
    pub fn int_values(&self) -> Vec<i64> {
        let mut out = Vec::new();
        match self {
            Payload::TempWater(thermal) => push_thermal(&mut out, thermal),
            Payload::RawAccel(accel) => push_raw_accel(&mut out, accel),
            Payload::Gps | Payload::TempGps | Payload::Text(_) => {}
            Payload::TempWaterRawAccel(thermal, accel) => {
                push_thermal(&mut out, thermal);
                push_raw_accel(&mut out, accel);
            }
            Payload::TempWaterRawAccelGps(thermal, accel, fix) => {
                push_thermal(&mut out, thermal);
                push_raw_accel(&mut out, accel);
                push_fix(&mut out, fix);
            }
            Payload::Battery { millivolts } => out.push(i64::from(*millivolts)),
            Payload::TempWaterEpoch(thermal, epoch) => {
                push_thermal(&mut out, thermal);
                out.push(i64::from(*epoch));
            }
            Payload::Imu(imu) | Payload::ImuFixed(imu) => push_imu(&mut out, imu),
            Payload::TempWaterImu(thermal, imu) => {
                push_thermal(&mut out, thermal);
                push_imu(&mut out, imu);
            }
            Payload::TempWaterImuGps(thermal, imu, fix) => {
                push_thermal(&mut out, thermal);
                push_imu(&mut out, imu);
                push_fix(&mut out, fix);
            }
        }
        out
    }
}

fn push_thermal(out: &mut Vec<i64>, thermal: &Thermal) {
    out.push(i64::from(thermal.temp));
    out.push(i64::from(thermal.water));
}

fn push_raw_accel(out: &mut Vec<i64>, accel: &RawAccel) {
    out.extend([accel.x, accel.y, accel.z].map(i64::from));
}

fn push_fix(out: &mut Vec<i64>, fix: &GpsFix) {
    out.push(i64::from(fix.lat));
    out.push(i64::from(fix.lon));
}

fn push_imu(out: &mut Vec<i64>, imu: &ImuTriad) {
    out.extend(imu.values().map(i64::from));
}

/// One decoded sensor record.
///
/// # Examples
/// ```
/// use fintrace_core::{Ensemble, Payload, Thermal, TypeTag};
///
/// let ensemble = Ensemble::new(12345, Payload::TempWater(Thermal { temp: 2560, water: 0 }));
/// assert_eq!(ensemble.timestamp(), 1234.5);
/// assert_eq!(ensemble.data_type(), TypeTag::TempWater);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Ensemble {
    /// Decisecond counter, masked to 20 bits.
    pub timestamp_ds: u32,
    pub payload: Payload,
}

impl Ensemble {
    pub fn new(timestamp_ds: u32, payload: Payload) -> Self {
        Self {
            timestamp_ds: timestamp_ds & layout::TIMESTAMP_MAX_DS,
            payload,
        }
    }

    /// Seconds since the counter origin, decisecond resolution.
    pub fn timestamp(&self) -> f64 {
        f64::from(self.timestamp_ds) / layout::DECISECONDS_PER_SECOND
    }

    pub fn data_type(&self) -> TypeTag {
        self.payload.data_type()
    }

    /// Named raw values, in wire order.
    pub fn raw_fields(&self) -> Vec<(&'static str, RawValue)> {
        if let Payload::Text(text) = &self.payload {
            return vec![("text", RawValue::Text(text.clone()))];
        }
        let Some(descriptor) = layout::descriptor(self.data_type()) else {
            return Vec::new();
        };
        descriptor
            .fields
            .iter()
            .zip(self.payload.int_values())
            .map(|(field, value)| (field.name, RawValue::Int(value)))
            .collect()
    }

    pub fn raw_field(&self, name: &str) -> Option<RawValue> {
        self.raw_fields()
            .into_iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::layout::DISPATCH_TABLE;
    use crate::packet::parser::{encode_payload, parse_fixed};

    fn sample(tag: TypeTag) -> Payload {
        let thermal = Thermal {
            temp: 2560,
            water: 1,
        };
        let accel = RawAccel { x: -1, y: 2, z: 64 };
        let fix = GpsFix {
            lat: 327_157_000,
            lon: -1_171_611_000,
        };
        let imu = ImuTriad {
            acc: [1, 2, 3],
            gyro: [4, 5, 6],
            mag: [7, 8, 9],
        };
        match tag {
            TypeTag::TempWater => Payload::TempWater(thermal),
            TypeTag::RawAccel => Payload::RawAccel(accel),
            TypeTag::Gps => Payload::Gps,
            TypeTag::TempWaterRawAccel => Payload::TempWaterRawAccel(thermal, accel),
            TypeTag::TempGps => Payload::TempGps,
            TypeTag::TempWaterRawAccelGps => Payload::TempWaterRawAccelGps(thermal, accel, fix),
            TypeTag::Battery => Payload::Battery { millivolts: 3900 },
            TypeTag::TempWaterEpoch => Payload::TempWaterEpoch(thermal, 1_600_000_000),
            TypeTag::Imu => Payload::Imu(imu),
            TypeTag::TempWaterImu => Payload::TempWaterImu(thermal, imu),
            TypeTag::TempWaterImuGps => Payload::TempWaterImuGps(thermal, imu, fix),
            TypeTag::ImuFixed => Payload::ImuFixed(imu),
            TypeTag::Text => Payload::Text("hi".to_string()),
        }
    }

    #[test]
    fn raw_field_names_follow_dispatch_table() {
        for descriptor in DISPATCH_TABLE.iter() {
            let ensemble = Ensemble::new(0, sample(descriptor.tag));
            assert_eq!(ensemble.data_type(), descriptor.tag);
            let names: Vec<&str> = ensemble.raw_fields().iter().map(|(n, _)| *n).collect();
            let expected: Vec<&str> = descriptor.fields.iter().map(|f| f.name).collect();
            assert_eq!(names, expected, "tag {:?}", descriptor.tag);
        }
    }

    #[test]
    fn parsed_values_match_descriptor_arity() {
        for tag in TypeTag::FIXED {
            let descriptor = layout::descriptor(tag).unwrap();
            let bytes = encode_payload(&sample(tag));
            assert_eq!(bytes.len(), descriptor.payload_len, "tag {tag:?}");
            let payload = parse_fixed(tag, &bytes).unwrap();
            assert_eq!(
                payload.int_values().len(),
                descriptor.fields.len(),
                "tag {tag:?}"
            );
        }
    }

    #[test]
    fn temp_water_imu_gps_field_order() {
        let payload = parse_fixed(
            TypeTag::TempWaterImuGps,
            &encode_payload(&sample(TypeTag::TempWaterImuGps)),
        )
        .unwrap();
        let names: Vec<&str> = Ensemble::new(0, payload)
            .raw_fields()
            .iter()
            .map(|(n, _)| *n)
            .collect();
        assert_eq!(
            names,
            [
                "temp", "water", "xAcc", "yAcc", "zAcc", "xGyro", "yGyro", "zGyro", "xMag", "yMag",
                "zMag", "lat", "lon",
            ]
        );
    }

    #[test]
    fn text_exposes_text_field() {
        let ensemble = Ensemble::new(5, sample(TypeTag::Text));
        assert_eq!(
            ensemble.raw_fields(),
            vec![("text", RawValue::Text("hi".to_string()))]
        );
        assert_eq!(ensemble.timestamp(), 0.5);
    }

    #[test]
    fn timestamp_is_masked_to_twenty_bits() {
        let ensemble = Ensemble::new(0x1F_FFFF, Payload::Gps);
        assert_eq!(ensemble.timestamp_ds, 0xF_FFFF);
    }

    #[test]
    fn raw_field_lookup() {
        let ensemble = Ensemble::new(0, sample(TypeTag::TempWaterImuGps));
        assert_eq!(ensemble.raw_field("zMag"), Some(RawValue::Int(9)));
        assert_eq!(ensemble.raw_field("lon"), Some(RawValue::Int(-1_171_611_000)));
        assert_eq!(ensemble.raw_field("battery"), None);
    }
}
