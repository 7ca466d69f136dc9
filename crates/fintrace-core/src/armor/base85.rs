use super::error::ArmorError;

/// RFC 1924 alphabet.
const ALPHABET: &[u8; 85] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz!#$%&()*+-;<=>?@^_`{|}~";
const GROUP_CHARS: usize = 5;
const GROUP_BYTES: usize = 4;
const PAD_DIGIT: u8 = 84;

fn digit(ch: u8) -> Option<u8> {
    ALPHABET.iter().position(|c| *c == ch).map(|pos| pos as u8)
}

/// Decode RFC 1924 base85. A short final group is padded with the highest
/// digit and the padding bytes are dropped from the output.
pub fn decode(input: &str) -> Result<Vec<u8>, ArmorError> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len() / GROUP_CHARS * GROUP_BYTES + GROUP_BYTES);

    for (group_idx, group) in bytes.chunks(GROUP_CHARS).enumerate() {
        let start = group_idx * GROUP_CHARS;
        let mut acc: u64 = 0;
        for i in 0..GROUP_CHARS {
            let value = match group.get(i) {
                Some(ch) => digit(*ch).ok_or_else(|| ArmorError::InvalidCharacter {
                    ch: char::from(*ch),
                    position: start + i,
                })?,
                None => PAD_DIGIT,
            };
            acc = acc * 85 + u64::from(value);
        }
        let word = u32::try_from(acc).map_err(|_| ArmorError::Overflow {
            position: start + group.len() - 1,
        })?;
        let padding = GROUP_CHARS - group.len();
        out.extend_from_slice(&word.to_be_bytes()[..GROUP_BYTES - padding]);
    }

    Ok(out)
}

/// Encode RFC 1924 base85 without padding characters.
pub fn encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len().div_ceil(GROUP_BYTES) * GROUP_CHARS);
    for chunk in data.chunks(GROUP_BYTES) {
        let mut word = [0u8; GROUP_BYTES];
        word[..chunk.len()].copy_from_slice(chunk);
        let mut value = u32::from_be_bytes(word);
        let mut digits = [0u8; GROUP_CHARS];
        for slot in digits.iter_mut().rev() {
            *slot = ALPHABET[(value % 85) as usize];
            value /= 85;
        }
        let keep = GROUP_CHARS - (GROUP_BYTES - chunk.len());
        out.extend(digits[..keep].iter().map(|b| char::from(*b)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{decode, encode};
    use crate::armor::error::ArmorError;

    #[test]
    fn known_vectors() {
        // Values produced by Python's base64.b85encode.
        assert_eq!(encode(b"hello"), "Xk~0{Zv");
        assert_eq!(decode("Xk~0{Zv").unwrap(), b"hello");
        assert_eq!(encode(&[0, 0, 0, 0]), "00000");
        assert_eq!(decode("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn partial_groups_round_trip() {
        let data: Vec<u8> = (0u8..=40).collect();
        for len in 0..data.len() {
            let text = encode(&data[..len]);
            assert_eq!(decode(&text).unwrap(), &data[..len], "len {len}");
        }
    }

    #[test]
    fn rejects_characters_outside_alphabet() {
        let err = decode("Xk~0\"Zv").unwrap_err();
        assert_eq!(err, ArmorError::InvalidCharacter { ch: '"', position: 4 });
    }

    #[test]
    fn rejects_overflowing_group() {
        assert!(matches!(decode("~~~~~"), Err(ArmorError::Overflow { .. })));
    }
}
