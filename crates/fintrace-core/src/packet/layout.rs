//! Wire layout of a telemetry packet: header geometry and the type dispatch
//! table. Every other packet module reads offsets and widths from here.

/// Header is one tag/timestamp byte followed by a little-endian u16.
pub const HEADER_LEN: usize = 3;

pub const TAG_MASK: u8 = 0x0F;
/// The upper nibble of the tag byte carries the four low timestamp bits.
pub const TIMESTAMP_LOW_SHIFT: u32 = 4;
/// The u16 word carries timestamp bits 4..20.
pub const TIMESTAMP_HIGH_SHIFT: u32 = 4;
pub const TIMESTAMP_BITS: u32 = 20;
pub const TIMESTAMP_MAX_DS: u32 = (1 << TIMESTAMP_BITS) - 1;
pub const DECISECONDS_PER_SECOND: f64 = 10.0;

pub const TAG_PADDING: u8 = 0x00;
pub const TAG_TEXT: u8 = 0x0F;
pub const TEXT_LENGTH_LEN: usize = 1;
pub const TEXT_MAX_LEN: usize = u8::MAX as usize;

/// Fixed-point divisors of the tag 12 IMU record.
pub const Q10_SCALE: f64 = 1024.0;
pub const Q7_SCALE: f64 = 128.0;
pub const Q3_SCALE: f64 = 8.0;

/// Recognized record types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum TypeTag {
    TempWater = 0x01,
    RawAccel = 0x02,
    Gps = 0x03,
    TempWaterRawAccel = 0x04,
    TempGps = 0x05,
    TempWaterRawAccelGps = 0x06,
    Battery = 0x07,
    TempWaterEpoch = 0x08,
    Imu = 0x09,
    TempWaterImu = 0x0A,
    TempWaterImuGps = 0x0B,
    ImuFixed = 0x0C,
    Text = 0x0F,
}

impl TypeTag {
    pub const FIXED: [TypeTag; 12] = [
        TypeTag::TempWater,
        TypeTag::RawAccel,
        TypeTag::Gps,
        TypeTag::TempWaterRawAccel,
        TypeTag::TempGps,
        TypeTag::TempWaterRawAccelGps,
        TypeTag::Battery,
        TypeTag::TempWaterEpoch,
        TypeTag::Imu,
        TypeTag::TempWaterImu,
        TypeTag::TempWaterImuGps,
        TypeTag::ImuFixed,
    ];

    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            TypeTag::Text => "text",
            fixed => descriptor(fixed).map(|d| d.name).unwrap_or("unknown"),
        }
    }
}

/// Classification of a 4-bit tag nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagClass {
    Padding,
    Fixed(TypeTag),
    Text,
    Unknown(u8),
}

impl TagClass {
    pub fn classify(nibble: u8) -> Self {
        let nibble = nibble & TAG_MASK;
        match nibble {
            TAG_PADDING => TagClass::Padding,
            TAG_TEXT => TagClass::Text,
            other => TypeTag::FIXED
                .iter()
                .copied()
                .find(|tag| tag.value() == other)
                .map(TagClass::Fixed)
                .unwrap_or(TagClass::Unknown(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    I8,
    I16,
    U16,
    I32,
    U32,
}

impl FieldKind {
    pub const fn width(self) -> usize {
        match self {
            FieldKind::I8 => 1,
            FieldKind::I16 | FieldKind::U16 => 2,
            FieldKind::I32 | FieldKind::U32 => 4,
        }
    }

    pub const fn signed(self) -> bool {
        matches!(self, FieldKind::I8 | FieldKind::I16 | FieldKind::I32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Fixed-point divisor; 1.0 for plain integers.
    pub scale: f64,
}

impl FieldDescriptor {
    pub fn is_fixed_point(&self) -> bool {
        self.scale != 1.0
    }
}

const fn field(name: &'static str, kind: FieldKind) -> FieldDescriptor {
    FieldDescriptor {
        name,
        kind,
        scale: 1.0,
    }
}

const fn fixed(name: &'static str, scale: f64) -> FieldDescriptor {
    FieldDescriptor {
        name,
        kind: FieldKind::I16,
        scale,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeDescriptor {
    pub tag: TypeTag,
    pub name: &'static str,
    pub fields: &'static [FieldDescriptor],
    pub payload_len: usize,
}

const fn payload_len(fields: &[FieldDescriptor]) -> usize {
    let mut total = 0;
    let mut i = 0;
    while i < fields.len() {
        total += fields[i].kind.width();
        i += 1;
    }
    total
}

const fn describe(
    tag: TypeTag,
    name: &'static str,
    fields: &'static [FieldDescriptor],
) -> TypeDescriptor {
    TypeDescriptor {
        tag,
        name,
        fields,
        payload_len: payload_len(fields),
    }
}

const THERMAL: [FieldDescriptor; 2] = [
    field("temp", FieldKind::I16),
    field("water", FieldKind::I8),
];

const RAW_ACCEL: [FieldDescriptor; 3] = [
    field("rawXAcc", FieldKind::I8),
    field("rawYAcc", FieldKind::I8),
    field("rawZAcc", FieldKind::I8),
];

const GPS_FIX: [FieldDescriptor; 2] = [
    field("lat", FieldKind::I32),
    field("lon", FieldKind::I32),
];

const IMU: [FieldDescriptor; 9] = [
    field("xAcc", FieldKind::I16),
    field("yAcc", FieldKind::I16),
    field("zAcc", FieldKind::I16),
    field("xGyro", FieldKind::I16),
    field("yGyro", FieldKind::I16),
    field("zGyro", FieldKind::I16),
    field("xMag", FieldKind::I16),
    field("yMag", FieldKind::I16),
    field("zMag", FieldKind::I16),
];

const TEMP_WATER_FIELDS: [FieldDescriptor; 2] = THERMAL;
const RAW_ACCEL_FIELDS: [FieldDescriptor; 3] = RAW_ACCEL;
const TEMP_WATER_RAW_ACCEL_FIELDS: [FieldDescriptor; 5] =
    [THERMAL[0], THERMAL[1], RAW_ACCEL[0], RAW_ACCEL[1], RAW_ACCEL[2]];
const TEMP_WATER_RAW_ACCEL_GPS_FIELDS: [FieldDescriptor; 7] = [
    THERMAL[0],
    THERMAL[1],
    RAW_ACCEL[0],
    RAW_ACCEL[1],
    RAW_ACCEL[2],
    GPS_FIX[0],
    GPS_FIX[1],
];
const BATTERY_FIELDS: [FieldDescriptor; 1] = [field("battery", FieldKind::U16)];
const TEMP_WATER_EPOCH_FIELDS: [FieldDescriptor; 3] =
    [THERMAL[0], THERMAL[1], field("epoch", FieldKind::U32)];
const IMU_FIELDS: [FieldDescriptor; 9] = IMU;
const TEMP_WATER_IMU_FIELDS: [FieldDescriptor; 11] = [
    THERMAL[0], THERMAL[1], IMU[0], IMU[1], IMU[2], IMU[3], IMU[4], IMU[5], IMU[6], IMU[7],
    IMU[8],
];
const TEMP_WATER_IMU_GPS_FIELDS: [FieldDescriptor; 13] = [
    THERMAL[0], THERMAL[1], IMU[0], IMU[1], IMU[2], IMU[3], IMU[4], IMU[5], IMU[6], IMU[7],
    IMU[8], GPS_FIX[0], GPS_FIX[1],
];
const IMU_FIXED_FIELDS: [FieldDescriptor; 9] = [
    fixed("xAcc", Q10_SCALE),
    fixed("yAcc", Q10_SCALE),
    fixed("zAcc", Q10_SCALE),
    fixed("xAng", Q7_SCALE),
    fixed("yAng", Q7_SCALE),
    fixed("zAng", Q7_SCALE),
    fixed("xMag", Q3_SCALE),
    fixed("yMag", Q3_SCALE),
    fixed("zMag", Q3_SCALE),
];

/// Type dispatch table for every fixed-layout tag, ordered by tag value.
pub const DISPATCH_TABLE: [TypeDescriptor; 12] = [
    describe(TypeTag::TempWater, "temp_water", &TEMP_WATER_FIELDS),
    describe(TypeTag::RawAccel, "raw_accel", &RAW_ACCEL_FIELDS),
    describe(TypeTag::Gps, "gps", &[]),
    describe(
        TypeTag::TempWaterRawAccel,
        "temp_water_raw_accel",
        &TEMP_WATER_RAW_ACCEL_FIELDS,
    ),
    describe(TypeTag::TempGps, "temp_gps", &[]),
    describe(
        TypeTag::TempWaterRawAccelGps,
        "temp_water_raw_accel_gps",
        &TEMP_WATER_RAW_ACCEL_GPS_FIELDS,
    ),
    describe(TypeTag::Battery, "battery", &BATTERY_FIELDS),
    describe(
        TypeTag::TempWaterEpoch,
        "temp_water_epoch",
        &TEMP_WATER_EPOCH_FIELDS,
    ),
    describe(TypeTag::Imu, "imu", &IMU_FIELDS),
    describe(TypeTag::TempWaterImu, "temp_water_imu", &TEMP_WATER_IMU_FIELDS),
    describe(
        TypeTag::TempWaterImuGps,
        "temp_water_imu_gps",
        &TEMP_WATER_IMU_GPS_FIELDS,
    ),
    describe(TypeTag::ImuFixed, "imu_fixed", &IMU_FIXED_FIELDS),
];

/// Look up the layout of a fixed-size tag. Text has no fixed layout.
pub fn descriptor(tag: TypeTag) -> Option<&'static TypeDescriptor> {
    DISPATCH_TABLE.iter().find(|d| d.tag == tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_lengths_match_wire_format() {
        let expected = [3, 3, 0, 6, 0, 14, 2, 7, 18, 21, 29, 18];
        for (descriptor, len) in DISPATCH_TABLE.iter().zip(expected) {
            assert_eq!(descriptor.payload_len, len, "tag {:?}", descriptor.tag);
        }
    }

    #[test]
    fn table_is_ordered_and_complete() {
        for (idx, descriptor) in DISPATCH_TABLE.iter().enumerate() {
            assert_eq!(descriptor.tag, TypeTag::FIXED[idx]);
            assert_eq!(descriptor.tag.value() as usize, idx + 1);
            let widths: usize = descriptor.fields.iter().map(|f| f.kind.width()).sum();
            assert_eq!(widths, descriptor.payload_len);
        }
        assert!(descriptor(TypeTag::Text).is_none());
    }

    #[test]
    fn classify_nibbles() {
        assert_eq!(TagClass::classify(0x00), TagClass::Padding);
        assert_eq!(TagClass::classify(0x0F), TagClass::Text);
        assert_eq!(TagClass::classify(0x0C), TagClass::Fixed(TypeTag::ImuFixed));
        assert_eq!(TagClass::classify(0x0D), TagClass::Unknown(0x0D));
        assert_eq!(TagClass::classify(0x0E), TagClass::Unknown(0x0E));
        assert_eq!(TagClass::classify(0xA1), TagClass::Fixed(TypeTag::TempWater));
    }

    #[test]
    fn only_imu_fixed_carries_fixed_point_fields() {
        for descriptor in DISPATCH_TABLE.iter() {
            let fixed_point = descriptor.fields.iter().any(|f| f.is_fixed_point());
            assert_eq!(fixed_point, descriptor.tag == TypeTag::ImuFixed);
        }
        let scales: Vec<f64> = IMU_FIXED_FIELDS.iter().map(|f| f.scale).collect();
        assert_eq!(
            scales,
            vec![1024.0, 1024.0, 1024.0, 128.0, 128.0, 128.0, 8.0, 8.0, 8.0]
        );
    }

    #[test]
    fn signedness_follows_kind() {
        assert!(FieldKind::I8.signed());
        assert!(!FieldKind::U16.signed());
        assert!(!FieldKind::U32.signed());
        assert_eq!(BATTERY_FIELDS[0].kind.width(), 2);
    }
}
