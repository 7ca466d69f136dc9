use std::fs::File;
use std::io::Read;
use std::path::Path;

/// CRC-32 with the zlib polynomial and a zero initial value.
const CRC32: crc::Crc<u32> = crc::Crc::<u32>::new(&crc::CRC_32_ISO_HDLC);

/// # Examples
/// ```
/// use fintrace_core::{crc32, format_crc32};
///
/// assert_eq!(format_crc32(crc32(b"123456789")), "CRC32: CBF43926");
/// ```
pub fn crc32(bytes: &[u8]) -> u32 {
    CRC32.checksum(bytes)
}

pub fn format_crc32(crc: u32) -> String {
    format!("CRC32: {crc:08X}")
}

/// Checksum a file without loading it whole.
pub fn crc32_file(path: &Path) -> std::io::Result<u32> {
    let mut file = File::open(path)?;
    let mut digest = CRC32.digest();
    let mut chunk = vec![0u8; 64 * 1024];
    loop {
        let read = file.read(&mut chunk)?;
        if read == 0 {
            break;
        }
        digest.update(&chunk[..read]);
    }
    Ok(digest.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn file_checksum_matches_in_memory() {
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&data).unwrap();
        assert_eq!(crc32_file(file.path()).unwrap(), crc32(&data));
    }

    #[test]
    fn empty_input() {
        assert_eq!(crc32(&[]), 0);
        assert_eq!(format_crc32(0x1A), "CRC32: 0000001A");
    }
}
