use super::layout::{self, TagClass};
use super::parser::parse_header;

/// Remove padding from a raw packet buffer.
///
/// Complete records are copied through in order. Padding bytes and a
/// truncated trailing record are dropped, and the scan stops at the first
/// unknown tag since nothing past it can be trusted. The result decodes to
/// the same ensembles as the valid prefix of the input, and stripping it
/// again returns it unchanged.
///
/// # Examples
/// ```
/// use fintrace_core::strip_padding;
///
/// let buffer = [0x00, 0x00, 0x17, 0x00, 0x00, 0x74, 0x0E, 0x00, 0x00];
/// assert_eq!(strip_padding(&buffer), vec![0x17, 0x00, 0x00, 0x74, 0x0E]);
/// ```
pub fn strip_padding(buffer: &[u8]) -> Vec<u8> {
    let mut stripped = Vec::with_capacity(buffer.len());
    let mut idx = 0usize;

    while buffer.len() - idx >= layout::HEADER_LEN {
        let header = match parse_header(&buffer[idx..]) {
            Ok(header) => header,
            Err(_) => break,
        };
        let body = &buffer[idx + layout::HEADER_LEN..];
        let record_len = match header.class {
            TagClass::Padding => {
                idx += 1;
                continue;
            }
            TagClass::Unknown(_) => break,
            TagClass::Fixed(tag) => match layout::descriptor(tag) {
                Some(descriptor) if body.len() >= descriptor.payload_len => {
                    layout::HEADER_LEN + descriptor.payload_len
                }
                _ => break,
            },
            TagClass::Text => match body.first() {
                Some(len)
                    if body.len() >= layout::TEXT_LENGTH_LEN + usize::from(*len) =>
                {
                    layout::HEADER_LEN + layout::TEXT_LENGTH_LEN + usize::from(*len)
                }
                _ => break,
            },
        };
        stripped.extend_from_slice(&buffer[idx..idx + record_len]);
        idx += record_len;
    }

    stripped
}

#[cfg(test)]
mod tests {
    use super::strip_padding;
    use crate::packet::decoder::{decode, encode};
    use crate::packet::ensemble::{Ensemble, ImuTriad, Payload, Thermal};

    fn records() -> Vec<Ensemble> {
        vec![
            Ensemble::new(1, Payload::TempWater(Thermal { temp: 300, water: 1 })),
            Ensemble::new(2, Payload::Text("fw 2.1".to_string())),
            Ensemble::new(3, Payload::ImuFixed(ImuTriad::default())),
        ]
    }

    #[test]
    fn drops_padding_between_and_after_records() {
        let mut buffer = vec![0u8; 4];
        let mut clean = Vec::new();
        for record in records() {
            let bytes = encode(&record);
            buffer.extend(&bytes);
            buffer.extend([0u8; 5]);
            clean.extend(bytes);
        }
        let stripped = strip_padding(&buffer);
        assert_eq!(stripped, clean);
        assert_eq!(decode(&stripped).0, records());
    }

    #[test]
    fn stops_at_unknown_tag() {
        let first = encode(&records()[0]);
        let mut buffer = first.clone();
        buffer.extend([0x0E, 0x01, 0x02]);
        buffer.extend(encode(&records()[1]));
        assert_eq!(strip_padding(&buffer), first);
    }

    #[test]
    fn drops_truncated_tail() {
        let first = encode(&records()[0]);
        let mut buffer = first.clone();
        let imu = encode(&records()[2]);
        buffer.extend(&imu[..imu.len() - 1]);
        assert_eq!(strip_padding(&buffer), first);
    }

    #[test]
    fn stripping_is_idempotent() {
        let mut state = 0x9E37_79B9_u32;
        for round in 0..100 {
            let mut buffer = Vec::new();
            for record in records() {
                buffer.extend(encode(&record));
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                buffer.extend(vec![0u8; (state >> 28) as usize]);
                if round % 3 == 0 {
                    buffer.push((state >> 20) as u8);
                }
            }
            let once = strip_padding(&buffer);
            assert_eq!(strip_padding(&once), once, "round {round}");
        }
    }

    #[test]
    fn all_zero_buffer_strips_to_nothing() {
        assert!(strip_padding(&[0u8; 50]).is_empty());
        assert!(strip_padding(&[]).is_empty());
    }
}
