use super::ensemble::{GpsFix, ImuTriad, Payload, RawAccel, Thermal};
use super::error::PacketError;
use super::layout::{self, TagClass, TypeTag};
use super::reader::PacketReader;

/// Decoded 3-byte record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub class: TagClass,
    pub timestamp_ds: u32,
}

/// Split a header into its tag nibble and the 20-bit timestamp.
///
/// The low nibble of the first byte is the tag; its high nibble holds the
/// four least significant timestamp bits, and the following little-endian
/// u16 holds bits 4..20.
pub fn parse_header(bytes: &[u8]) -> Result<Header, PacketError> {
    let mut reader = PacketReader::new(bytes);
    reader.require_len(layout::HEADER_LEN)?;
    let tag_time = reader.read_u8()?;
    let high = reader.read_u16_le()?;
    let low = u32::from(tag_time >> layout::TIMESTAMP_LOW_SHIFT);
    let timestamp_ds = low | (u32::from(high) << layout::TIMESTAMP_HIGH_SHIFT);
    Ok(Header {
        class: TagClass::classify(tag_time),
        timestamp_ds,
    })
}

/// Build the header bytes for a tag and timestamp (inverse of `parse_header`).
pub fn encode_header(tag: u8, timestamp_ds: u32) -> [u8; layout::HEADER_LEN] {
    let timestamp_ds = timestamp_ds & layout::TIMESTAMP_MAX_DS;
    let low = ((timestamp_ds & 0x0F) as u8) << layout::TIMESTAMP_LOW_SHIFT;
    let high = ((timestamp_ds >> layout::TIMESTAMP_HIGH_SHIFT) as u16).to_le_bytes();
    [low | (tag & layout::TAG_MASK), high[0], high[1]]
}

/// Decode the payload of a fixed-layout record.
///
/// `payload` must hold at least the descriptor's payload length; extra
/// bytes are ignored.
pub fn parse_fixed(tag: TypeTag, payload: &[u8]) -> Result<Payload, PacketError> {
    let descriptor = layout::descriptor(tag).ok_or(PacketError::NoLayout { tag: tag.value() })?;
    let mut reader = PacketReader::new(payload);
    reader.require_len(descriptor.payload_len)?;

    let parsed = match tag {
        TypeTag::TempWater => Payload::TempWater(read_thermal(&mut reader)?),
        TypeTag::RawAccel => Payload::RawAccel(read_raw_accel(&mut reader)?),
        TypeTag::Gps => Payload::Gps,
        TypeTag::TempWaterRawAccel => {
            Payload::TempWaterRawAccel(read_thermal(&mut reader)?, read_raw_accel(&mut reader)?)
        }
        TypeTag::TempGps => Payload::TempGps,
        TypeTag::TempWaterRawAccelGps => Payload::TempWaterRawAccelGps(
            read_thermal(&mut reader)?,
            read_raw_accel(&mut reader)?,
            read_fix(&mut reader)?,
        ),
        TypeTag::Battery => Payload::Battery {
            millivolts: reader.read_u16_le()?,
        },
        TypeTag::TempWaterEpoch => {
            Payload::TempWaterEpoch(read_thermal(&mut reader)?, reader.read_u32_le()?)
        }
        TypeTag::Imu => Payload::Imu(read_imu(&mut reader)?),
        TypeTag::TempWaterImu => {
            Payload::TempWaterImu(read_thermal(&mut reader)?, read_imu(&mut reader)?)
        }
        TypeTag::TempWaterImuGps => Payload::TempWaterImuGps(
            read_thermal(&mut reader)?,
            read_imu(&mut reader)?,
            read_fix(&mut reader)?,
        ),
        TypeTag::ImuFixed => Payload::ImuFixed(read_imu(&mut reader)?),
        TypeTag::Text => return Err(PacketError::NoLayout { tag: tag.value() }),
    };
    debug_assert_eq!(reader.position(), descriptor.payload_len);
    Ok(parsed)
}

/// Text payload after the length byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedText {
    pub text: String,
    /// Bytes consumed, including the length byte.
    pub consumed: usize,
    /// True when invalid UTF-8 had to be replaced.
    pub lossy: bool,
}

pub fn parse_text(payload: &[u8]) -> Result<ParsedText, PacketError> {
    let mut reader = PacketReader::new(payload);
    let len = usize::from(reader.read_u8()?);
    let bytes = reader.read_slice(len)?;
    let (text, lossy) = match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_string(), false),
        Err(_) => (String::from_utf8_lossy(bytes).into_owned(), true),
    };
    Ok(ParsedText {
        text,
        consumed: reader.position(),
        lossy,
    })
}

fn read_thermal(reader: &mut PacketReader<'_>) -> Result<Thermal, PacketError> {
    Ok(Thermal {
        temp: reader.read_i16_le()?,
        water: reader.read_i8()?,
    })
}

fn read_raw_accel(reader: &mut PacketReader<'_>) -> Result<RawAccel, PacketError> {
    Ok(RawAccel {
        x: reader.read_i8()?,
        y: reader.read_i8()?,
        z: reader.read_i8()?,
    })
}

fn read_fix(reader: &mut PacketReader<'_>) -> Result<GpsFix, PacketError> {
    Ok(GpsFix {
        lat: reader.read_i32_le()?,
        lon: reader.read_i32_le()?,
    })
}

fn read_imu(reader: &mut PacketReader<'_>) -> Result<ImuTriad, PacketError> {
    Ok(ImuTriad {
        acc: reader.read_i16_triad()?,
        gyro: reader.read_i16_triad()?,
        mag: reader.read_i16_triad()?,
    })
}

/// Serialize a payload body (everything after the header).
///
/// Text longer than 255 bytes is cut at the length-byte limit.
pub fn encode_payload(payload: &Payload) -> Vec<u8> {
    let mut out = Vec::new();
    match payload {
        Payload::TempWater(thermal) => write_thermal(&mut out, thermal),
        Payload::RawAccel(accel) => write_raw_accel(&mut out, accel),
        Payload::Gps | Payload::TempGps => {}
        Payload::TempWaterRawAccel(thermal, accel) => {
            write_thermal(&mut out, thermal);
            write_raw_accel(&mut out, accel);
        }
        Payload::TempWaterRawAccelGps(thermal, accel, fix) => {
            write_thermal(&mut out, thermal);
            write_raw_accel(&mut out, accel);
            write_fix(&mut out, fix);
        }
        Payload::Battery { millivolts } => out.extend_from_slice(&millivolts.to_le_bytes()),
        Payload::TempWaterEpoch(thermal, epoch) => {
            write_thermal(&mut out, thermal);
            out.extend_from_slice(&epoch.to_le_bytes());
        }
        Payload::Imu(imu) | Payload::ImuFixed(imu) => write_imu(&mut out, imu),
        Payload::TempWaterImu(thermal, imu) => {
            write_thermal(&mut out, thermal);
            write_imu(&mut out, imu);
        }
        Payload::TempWaterImuGps(thermal, imu, fix) => {
            write_thermal(&mut out, thermal);
            write_imu(&mut out, imu);
            write_fix(&mut out, fix);
        }
        Payload::Text(text) => {
            let bytes = text.as_bytes();
            let len = bytes.len().min(layout::TEXT_MAX_LEN);
            out.push(len as u8);
            out.extend_from_slice(&bytes[..len]);
        }
    }
    out
}

fn write_thermal(out: &mut Vec<u8>, thermal: &Thermal) {
    out.extend_from_slice(&thermal.temp.to_le_bytes());
    out.extend_from_slice(&thermal.water.to_le_bytes());
}

fn write_raw_accel(out: &mut Vec<u8>, accel: &RawAccel) {
    for axis in [accel.x, accel.y, accel.z] {
        out.extend_from_slice(&axis.to_le_bytes());
    }
}

fn write_fix(out: &mut Vec<u8>, fix: &GpsFix) {
    out.extend_from_slice(&fix.lat.to_le_bytes());
    out.extend_from_slice(&fix.lon.to_le_bytes());
}

fn write_imu(out: &mut Vec<u8>, imu: &ImuTriad) {
    for value in imu.acc.iter().chain(&imu.gyro).chain(&imu.mag) {
        out.extend_from_slice(&value.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_splits_tag_and_timestamp() {
        let header = parse_header(&[0x01, 0x00, 0x00]).unwrap();
        assert_eq!(header.class, TagClass::Fixed(TypeTag::TempWater));
        assert_eq!(header.timestamp_ds, 0);

        // 12345 = 0x3039: low nibble 0x9 rides in the tag byte.
        let header = parse_header(&[0x9C, 0x03, 0x03]).unwrap();
        assert_eq!(header.class, TagClass::Fixed(TypeTag::ImuFixed));
        assert_eq!(header.timestamp_ds, 12345);
    }

    #[test]
    fn header_encoding_inverts_parsing() {
        for timestamp_ds in [0, 1, 15, 16, 12345, 0x8_0000, layout::TIMESTAMP_MAX_DS] {
            for tag in 0..=0x0F {
                let bytes = encode_header(tag, timestamp_ds);
                let header = parse_header(&bytes).unwrap();
                assert_eq!(header.timestamp_ds, timestamp_ds);
                assert_eq!(header.class, TagClass::classify(tag));
            }
        }
    }

    #[test]
    fn header_too_short() {
        let err = parse_header(&[0x01, 0x00]).unwrap_err();
        assert_eq!(err, PacketError::TooShort { needed: 3, actual: 2 });
    }

    #[test]
    fn fixed_temp_water() {
        let payload = [0x00, 0x0A, 0x00];
        let parsed = parse_fixed(TypeTag::TempWater, &payload).unwrap();
        assert_eq!(
            parsed,
            Payload::TempWater(Thermal {
                temp: 2560,
                water: 0
            })
        );
    }

    #[test]
    fn fixed_short_payload() {
        let payload = [0u8; 10];
        let err = parse_fixed(TypeTag::Imu, &payload).unwrap_err();
        assert!(err.to_string().contains("payload too short"));
    }

    #[test]
    fn text_length_is_checked() {
        let err = parse_text(&[5, b'a', b'b']).unwrap_err();
        assert_eq!(err, PacketError::TooShort { needed: 5, actual: 2 });
        assert!(parse_text(&[]).is_err());
    }

    #[test]
    fn text_invalid_utf8_is_replaced() {
        let parsed = parse_text(&[3, b'o', 0xFF, b'k']).unwrap();
        assert!(parsed.lossy);
        assert_eq!(parsed.text, "o\u{FFFD}k");
        assert_eq!(parsed.consumed, 4);
    }

    #[test]
    fn text_has_no_fixed_layout() {
        let err = parse_fixed(TypeTag::Text, &[]).unwrap_err();
        assert_eq!(err, PacketError::NoLayout { tag: 0x0F });
    }

    #[test]
    fn encoded_payload_has_descriptor_length() {
        let imu = ImuTriad {
            acc: [1, -2, 3],
            gyro: [i16::MIN, 0, i16::MAX],
            mag: [7, 8, 9],
        };
        let payload = Payload::TempWaterImuGps(
            Thermal {
                temp: -40,
                water: 1,
            },
            imu,
            GpsFix { lat: 1, lon: -1 },
        );
        let bytes = encode_payload(&payload);
        assert_eq!(bytes.len(), 29);
        assert_eq!(parse_fixed(TypeTag::TempWaterImuGps, &bytes).unwrap(), payload);
    }
}
