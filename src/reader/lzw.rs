//! LZW decompression of GIF image data
//!
//! Codes are packed LSB first. The code width starts one bit above the
//! minimum code size and grows each time the table fills the current width,
//! up to 12 bits.

use std::io::Read;

use log::trace;

use super::block::{BlockReader, MAX_SUB_BLOCK};
use super::DecodingError;

/// Maximum number of entries in the code table
pub const MAX_CODES: usize = 4096;
const MAX_CODE_SIZE: u8 = 12;
/// Literals are palette indices, so at most 8 bits wide
pub const MAX_MIN_CODE_SIZE: u8 = 8;

/// How the code stream of an image ended
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StreamEnd {
    /// All requested pixels were produced
    Complete,
    /// End of information code
    EndCode,
    /// The sub-block terminator was reached
    Terminator,
    /// A code outside of the current table
    InvalidCode,
}

/// Indexed pixels of one image
#[derive(Debug)]
pub struct Decompressed {
    /// Exactly the requested number of pixels, zero filled past `decoded`
    pub pixels: Vec<u8>,
    /// Number of pixels actually produced by the code stream
    pub decoded: usize,
    pub end: StreamEnd,
}

impl Decompressed {
    /// The image data ran out before every pixel was produced.
    pub fn is_short(&self) -> bool {
        self.decoded < self.pixels.len()
    }
}

/// LZW decoder state for one image
pub struct LzwDecoder {
    min_code_size: u8,
    clear_code: u16,
    end_code: u16,
    code_size: u8,
    next_code: u16,
    prev: Option<u16>,
    first: u8,
    prefix: Vec<u16>,
    suffix: Vec<u8>,
    stack: Vec<u8>,
}

impl LzwDecoder {
    /// Accepts minimum code sizes from 1 to 8. Size 1 is outside the format
    /// but some encoders write it for two color images.
    pub fn new(min_code_size: u8) -> Result<LzwDecoder, DecodingError> {
        if !(1..=MAX_MIN_CODE_SIZE).contains(&min_code_size) {
            return Err(DecodingError::Format("invalid LZW minimum code size"));
        }
        let clear_code = 1u16 << min_code_size;
        let mut suffix = vec![0; MAX_CODES];
        for (code, value) in suffix.iter_mut().enumerate().take(clear_code as usize) {
            *value = code as u8;
        }
        Ok(LzwDecoder {
            min_code_size,
            clear_code,
            end_code: clear_code + 1,
            code_size: min_code_size + 1,
            next_code: clear_code + 2,
            prev: None,
            first: 0,
            prefix: vec![0; MAX_CODES],
            suffix,
            stack: Vec::with_capacity(MAX_CODES + 1),
        })
    }

    /// Decodes `len` pixels from the sub-blocks following the minimum code
    /// size byte.
    ///
    /// Running out of codes is not an error: the missing pixels are left at
    /// zero and reported through `Decompressed::decoded`. A truncated
    /// sub-block is.
    pub fn decode<R: Read>(
        &mut self,
        r: &mut BlockReader<R>,
        len: usize,
    ) -> Result<Decompressed, DecodingError> {
        let mut pixels = vec![0; len];
        let mut n = 0;
        let mut codes = CodeReader::new(r);
        let end = loop {
            while n < len {
                match self.stack.pop() {
                    Some(value) => {
                        pixels[n] = value;
                        n += 1;
                    }
                    None => break,
                }
            }
            if n == len {
                break StreamEnd::Complete;
            }
            let code = match codes.read(self.code_size)? {
                Some(code) => code,
                None => break StreamEnd::Terminator,
            };
            if code == self.clear_code {
                self.reset();
                continue;
            }
            if code == self.end_code {
                break StreamEnd::EndCode;
            }
            if code > self.next_code {
                break StreamEnd::InvalidCode;
            }
            match self.prev {
                None => {
                    // First code after a clear must be a literal
                    if code >= self.clear_code {
                        break StreamEnd::InvalidCode;
                    }
                    self.first = self.suffix[code as usize];
                    self.stack.push(self.first);
                }
                Some(prev) => {
                    let mut cur = code;
                    if code == self.next_code {
                        self.stack.push(self.first);
                        cur = prev;
                    }
                    while cur > self.clear_code {
                        self.stack.push(self.suffix[cur as usize]);
                        cur = self.prefix[cur as usize];
                    }
                    self.first = self.suffix[cur as usize];
                    self.stack.push(self.first);
                    self.add_entry(prev, self.first);
                }
            }
            self.prev = Some(code);
            self.grow();
        };
        self.stack.clear();
        Ok(Decompressed {
            pixels,
            decoded: n,
            end,
        })
    }

    fn reset(&mut self) {
        trace!("LZW clear code, table reset");
        self.code_size = self.min_code_size + 1;
        self.next_code = self.clear_code + 2;
        self.prev = None;
    }

    fn add_entry(&mut self, prefix: u16, suffix: u8) {
        let code = self.next_code as usize;
        // A full table keeps its entries until the next clear code
        if code >= MAX_CODES {
            return;
        }
        self.prefix[code] = prefix;
        self.suffix[code] = suffix;
        self.next_code += 1;
    }

    /// Widens codes once the next free code no longer fits.
    fn grow(&mut self) {
        if self.next_code >= 1 << self.code_size && self.code_size < MAX_CODE_SIZE {
            self.code_size += 1;
        }
    }
}

/// Reads variable width codes across sub-block boundaries
struct CodeReader<'a, R: Read> {
    r: &'a mut BlockReader<R>,
    block: [u8; MAX_SUB_BLOCK],
    pos: usize,
    len: usize,
    acc: u32,
    bits: u8,
    done: bool,
}

impl<'a, R: Read> CodeReader<'a, R> {
    fn new(r: &'a mut BlockReader<R>) -> CodeReader<'a, R> {
        CodeReader {
            r,
            block: [0; MAX_SUB_BLOCK],
            pos: 0,
            len: 0,
            acc: 0,
            bits: 0,
            done: false,
        }
    }

    /// Returns `None` once the terminator is reached with fewer than `size`
    /// bits left.
    fn read(&mut self, size: u8) -> Result<Option<u16>, DecodingError> {
        while self.bits < size {
            if self.pos == self.len {
                if self.done {
                    return Ok(None);
                }
                match self.r.read_sub_block(&mut self.block) {
                    Ok(0) => {
                        self.done = true;
                        return Ok(None);
                    }
                    Ok(n) => {
                        self.len = n;
                        self.pos = 0;
                    }
                    Err((_, err)) => return Err(err),
                }
            }
            self.acc |= (self.block[self.pos] as u32) << self.bits;
            self.pos += 1;
            self.bits += 8;
        }
        let code = (self.acc & ((1 << size) - 1)) as u16;
        self.acc >>= size;
        self.bits -= size;
        Ok(Some(code))
    }
}
