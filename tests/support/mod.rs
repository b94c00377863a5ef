//! Writes small GIF streams for the integration tests
#![allow(dead_code)]

pub const RED: [u8; 3] = [0xFF, 0, 0];
pub const BLUE: [u8; 3] = [0, 0, 0xFF];
pub const GREEN: [u8; 3] = [0, 0xFF, 0];
pub const WHITE: [u8; 3] = [0xFF, 0xFF, 0xFF];
pub const BLACK: [u8; 3] = [0, 0, 0];

pub fn rgba(color: [u8; 3]) -> [u8; 4] {
    [color[0], color[1], color[2], 0xFF]
}

/// Size exponent of a color table with `len` entries
fn table_size(len: usize) -> u8 {
    assert!(len.is_power_of_two() && (2..=256).contains(&len), "bad palette size {}", len);
    len.trailing_zeros() as u8 - 1
}

fn put_u16(data: &mut Vec<u8>, value: u16) {
    data.extend_from_slice(&value.to_le_bytes());
}

fn put_table(data: &mut Vec<u8>, table: &[[u8; 3]]) {
    for color in table {
        data.extend_from_slice(color);
    }
}

fn put_sub_blocks(data: &mut Vec<u8>, bytes: &[u8]) {
    for chunk in bytes.chunks(255) {
        data.push(chunk.len() as u8);
        data.extend_from_slice(chunk);
    }
    data.push(0);
}

/// Compresses indices with the GIF flavor of LZW.
pub fn compress(min_code_size: u8, indices: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut enc = lzw::Encoder::new(lzw::LsbWriter::new(&mut out), min_code_size).unwrap();
        enc.encode_bytes(indices).unwrap();
    }
    out
}

/// Reorders rows into the order an interlaced image stores them.
pub fn interlace(pixels: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixels.len());
    for &(start, step) in &[(0, 8), (4, 8), (2, 4), (1, 2)] {
        let mut y = start;
        while y < height {
            out.extend_from_slice(&pixels[y * width..(y + 1) * width]);
            y += step;
        }
    }
    out
}

/// An image block
pub struct Image<'a> {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
    pub interlaced: bool,
    pub palette: Option<&'a [[u8; 3]]>,
    /// Indices in display order. May be shorter than `width * height`.
    pub pixels: &'a [u8],
}

impl<'a> Image<'a> {
    pub fn new(left: u16, top: u16, width: u16, height: u16, pixels: &'a [u8]) -> Image<'a> {
        Image {
            left,
            top,
            width,
            height,
            interlaced: false,
            palette: None,
            pixels,
        }
    }
}

pub struct GifWriter {
    data: Vec<u8>,
    code_size: u8,
}

impl GifWriter {
    pub fn new(width: u16, height: u16, palette: Option<&[[u8; 3]]>, background: u8) -> GifWriter {
        let mut data = b"GIF89a".to_vec();
        put_u16(&mut data, width);
        put_u16(&mut data, height);
        let mut code_size = 2;
        match palette {
            Some(table) => {
                let size = table_size(table.len());
                code_size = (size + 1).max(2);
                data.extend_from_slice(&[0x80 | 0x70 | size, background, 0]);
                put_table(&mut data, table);
            }
            None => data.extend_from_slice(&[0x70, background, 0]),
        }
        GifWriter { data, code_size }
    }

    pub fn looping(&mut self, count: u16) -> &mut GifWriter {
        self.data.extend_from_slice(&[0x21, 0xFF, 11]);
        self.data.extend_from_slice(b"NETSCAPE2.0");
        self.data.extend_from_slice(&[3, 1]);
        put_u16(&mut self.data, count);
        self.data.push(0);
        self
    }

    pub fn control(&mut self, dispose: u8, transparent: Option<u8>, delay: u16) -> &mut GifWriter {
        let flags = (dispose << 2) | transparent.is_some() as u8;
        self.data.extend_from_slice(&[0x21, 0xF9, 4, flags]);
        put_u16(&mut self.data, delay);
        self.data.extend_from_slice(&[transparent.unwrap_or(0), 0]);
        self
    }

    pub fn comment(&mut self, text: &[u8]) -> &mut GifWriter {
        self.data.extend_from_slice(&[0x21, 0xFE]);
        put_sub_blocks(&mut self.data, text);
        self
    }

    pub fn image(&mut self, image: &Image) -> &mut GifWriter {
        self.data.push(0x2C);
        put_u16(&mut self.data, image.left);
        put_u16(&mut self.data, image.top);
        put_u16(&mut self.data, image.width);
        put_u16(&mut self.data, image.height);
        let mut flags = if image.interlaced { 0x40 } else { 0 };
        let mut code_size = self.code_size;
        if let Some(table) = image.palette {
            let size = table_size(table.len());
            flags |= 0x80 | size;
            code_size = (size + 1).max(2);
        }
        self.data.push(flags);
        if let Some(table) = image.palette {
            put_table(&mut self.data, table);
        }
        let pixels = if image.interlaced {
            interlace(image.pixels, image.width as usize, image.height as usize)
        } else {
            image.pixels.to_vec()
        };
        self.data.push(code_size);
        put_sub_blocks(&mut self.data, &compress(code_size, &pixels));
        self
    }

    pub fn raw(&mut self, bytes: &[u8]) -> &mut GifWriter {
        self.data.extend_from_slice(bytes);
        self
    }

    /// The stream so far, followed by the trailer
    pub fn finish(&self) -> Vec<u8> {
        let mut data = self.data.clone();
        data.push(0x3B);
        data
    }

    /// The stream so far, without a trailer
    pub fn unfinished(&self) -> Vec<u8> {
        self.data.clone()
    }
}
