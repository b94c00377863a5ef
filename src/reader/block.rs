//! Sub-block framing
//!
//! Variable length data in a GIF stream is split into sub-blocks: a length
//! byte (1-255) followed by that many bytes. A run of sub-blocks ends with a
//! zero length byte.

use std::io::{self, Read};

use log::warn;

use crate::traits::ReadBytesExt;

use super::DecodingError;

/// Largest payload of a single sub-block
pub const MAX_SUB_BLOCK: usize = 0xFF;

/// Byte cursor over the sub-block structure of a GIF stream
#[derive(Debug)]
pub struct BlockReader<R: Read> {
    r: R,
}

impl<R: Read> BlockReader<R> {
    pub fn new(r: R) -> BlockReader<R> {
        BlockReader { r }
    }

    /// Reads a byte that the format requires to be present.
    pub fn read_byte(&mut self) -> Result<u8, DecodingError> {
        Ok(self.r.read_le()?)
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodingError> {
        Ok(self.r.read_le()?)
    }

    /// Fills `buf` completely.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), DecodingError> {
        Ok(self.r.read_exact(buf)?)
    }

    /// Reads the next sub-block into `buf` and returns its length.
    ///
    /// A return value of zero means the block terminator was read. If the
    /// source ends inside the block, the bytes that could be read remain in
    /// `buf[..n]` and the error reports the truncation.
    pub fn read_sub_block(
        &mut self,
        buf: &mut [u8; MAX_SUB_BLOCK],
    ) -> Result<usize, (usize, DecodingError)> {
        let len = self.read_byte().map_err(|err| (0, err))? as usize;
        let n = self.fill(&mut buf[..len]).map_err(|err| (0, err))?;
        if n < len {
            warn!("sub-block truncated: expected {} bytes, got {}", len, n);
            return Err((n, DecodingError::Format("truncated sub-block")));
        }
        Ok(len)
    }

    /// Appends every sub-block up to the terminator to `out`.
    ///
    /// On a truncated sub-block the partial bytes are still appended before
    /// the error is returned.
    pub fn read_sub_block_run(&mut self, out: &mut Vec<u8>) -> Result<(), DecodingError> {
        let mut buf = [0; MAX_SUB_BLOCK];
        loop {
            match self.read_sub_block(&mut buf) {
                Ok(0) => return Ok(()),
                Ok(n) => out.extend_from_slice(&buf[..n]),
                Err((n, err)) => {
                    out.extend_from_slice(&buf[..n]);
                    return Err(err);
                }
            }
        }
    }

    /// Skips every sub-block up to the terminator.
    pub fn skip_sub_block_run(&mut self) -> Result<(), DecodingError> {
        let mut buf = [0; MAX_SUB_BLOCK];
        loop {
            match self.read_sub_block(&mut buf) {
                Ok(0) => return Ok(()),
                Ok(_) => (),
                Err((_, err)) => return Err(err),
            }
        }
    }

    /// Reads until `buf` is full or the source is exhausted.
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize, DecodingError> {
        let mut n = 0;
        while n < buf.len() {
            match self.r.read(&mut buf[n..]) {
                Ok(0) => break,
                Ok(count) => n += count,
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => (),
                Err(err) => return Err(err.into()),
            }
        }
        Ok(n)
    }
}
