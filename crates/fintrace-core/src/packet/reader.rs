use super::error::PacketError;

/// Forward-only, bounds-checked cursor over a record payload.
pub struct PacketReader<'a> {
    payload: &'a [u8],
    pos: usize,
}

impl<'a> PacketReader<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self { payload, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.payload.len() - self.pos
    }

    pub fn require_len(&self, needed: usize) -> Result<(), PacketError> {
        if self.remaining() < needed {
            return Err(PacketError::TooShort {
                needed,
                actual: self.remaining(),
            });
        }
        Ok(())
    }

    pub fn read_slice(&mut self, len: usize) -> Result<&'a [u8], PacketError> {
        self.require_len(len)?;
        let bytes = &self.payload[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], PacketError> {
        let bytes = self.read_slice(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, PacketError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8, PacketError> {
        Ok(i8::from_le_bytes(self.read_array()?))
    }

    pub fn read_i16_le(&mut self) -> Result<i16, PacketError> {
        Ok(i16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u16_le(&mut self) -> Result<u16, PacketError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32_le(&mut self) -> Result<i32, PacketError> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32_le(&mut self) -> Result<u32, PacketError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i16_triad(&mut self) -> Result<[i16; 3], PacketError> {
        Ok([self.read_i16_le()?, self.read_i16_le()?, self.read_i16_le()?])
    }
}
