use crate::profile::minimal_argument;
use crate::{CborError, ErrorCode};

/// Forward-only reader over an input buffer.
///
/// Every read that runs past the end of the buffer fails with `UnexpectedEof`, so truncation
/// is always distinguishable from a malformed item.
#[derive(Clone, Copy)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub const fn with_pos(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    pub const fn position(&self) -> usize {
        self.pos
    }

    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn read_u8(&mut self) -> Result<u8, CborError> {
        let off = self.pos;
        let b = *self
            .data
            .get(self.pos)
            .ok_or_else(|| CborError::new(ErrorCode::UnexpectedEof, off))?;
        self.pos += 1;
        Ok(b)
    }

    pub fn read_exact(&mut self, n: usize) -> Result<&'a [u8], CborError> {
        let off = self.pos;
        let end = self
            .pos
            .checked_add(n)
            .ok_or_else(|| CborError::new(ErrorCode::LengthOverflow, off))?;
        if end > self.data.len() {
            return Err(CborError::new(ErrorCode::UnexpectedEof, off));
        }
        let s = &self.data[self.pos..end];
        self.pos = end;
        Ok(s)
    }

    pub fn read_be_u16(&mut self) -> Result<u16, CborError> {
        let s = self.read_exact(2)?;
        Ok(u16::from_be_bytes([s[0], s[1]]))
    }

    pub fn read_be_u32(&mut self) -> Result<u32, CborError> {
        let s = self.read_exact(4)?;
        Ok(u32::from_be_bytes([s[0], s[1], s[2], s[3]]))
    }

    pub fn read_be_u64(&mut self) -> Result<u64, CborError> {
        let s = self.read_exact(8)?;
        Ok(u64::from_be_bytes([
            s[0], s[1], s[2], s[3], s[4], s[5], s[6], s[7],
        ]))
    }

    /// Read one header byte, returning `(major, additional_info, header_offset)`.
    pub fn read_header(&mut self) -> Result<(u8, u8, usize), CborError> {
        let off = self.pos;
        let ib = self.read_u8()?;
        Ok((ib >> 5, ib & 0x1f, off))
    }

    /// Read the argument selected by `ai`, rejecting any form longer than the shortest one.
    pub fn read_arg(&mut self, ai: u8, off: usize) -> Result<u64, CborError> {
        let (v, width) = match ai {
            0..=23 => return Ok(u64::from(ai)),
            24 => (u64::from(self.read_u8()?), 1),
            25 => (u64::from(self.read_be_u16()?), 2),
            26 => (u64::from(self.read_be_u32()?), 4),
            27 => (self.read_be_u64()?, 8),
            _ => return Err(CborError::new(ErrorCode::ReservedAdditionalInfo, off)),
        };
        if minimal_argument(v).1 != width {
            return Err(CborError::new(ErrorCode::NonCanonicalEncoding, off));
        }
        Ok(v)
    }

    /// Read a length/count argument. Indefinite lengths are rejected.
    pub fn read_len(&mut self, ai: u8, off: usize) -> Result<usize, CborError> {
        if ai == 31 {
            return Err(CborError::new(ErrorCode::IndefiniteLengthForbidden, off));
        }
        let len = self.read_arg(ai, off)?;
        usize::try_from(len).map_err(|_| CborError::new(ErrorCode::LengthOverflow, off))
    }
}
