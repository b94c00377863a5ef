//! Common types used by all reader stages

/// Number of bytes per output pixel, frames are expanded to RGBA
pub const N_CHANNELS: usize = 4;
/// GIF palettes are RGB
pub const PLTE_CHANNELS: usize = 3;

enum_from_primitive! {
/// Known block types
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Block {
    Image = 0x2C,
    Extension = 0x21,
    Trailer = 0x3B
}
}

enum_from_primitive! {
/// Known GIF extensions
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Extension {
    Text = 0x01,
    Control = 0xF9,
    Comment = 0xFE,
    Application = 0xFF
}
}

enum_from_primitive! {
/// Disposal method
///
/// Tells how the area covered by a frame is treated before the next frame is
/// drawn on top of it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DisposalMethod {
    /// No disposal specified, the canvas is carried forward.
    Any = 0,
    /// Do not dispose.
    Keep = 1,
    /// Restore the frame area to the background color.
    Background = 2,
    /// Restore to the canvas shown before this frame.
    Previous = 3
}
}

impl Default for DisposalMethod {
    fn default() -> DisposalMethod {
        DisposalMethod::Any
    }
}

/// A rectangle on the logical screen
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Rect {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    /// Whether the rectangle lies entirely within a `width`×`height` canvas.
    pub fn fits(&self, width: u16, height: u16) -> bool {
        self.left as u32 + self.width as u32 <= width as u32
            && self.top as u32 + self.height as u32 <= height as u32
    }
}

/// Logical screen descriptor
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct LogicalScreen {
    pub width: u16,
    pub height: u16,
    pub global_table: bool,
    /// Bits per primary color, minus one
    pub color_resolution: u8,
    pub sorted: bool,
    /// Size exponent of the global color table
    pub table_size: u8,
    /// Index of the background color in the global color table
    pub background: u8,
    pub aspect_ratio: u8,
}

impl LogicalScreen {
    pub fn from_packed(
        width: u16,
        height: u16,
        packed: u8,
        background: u8,
        aspect_ratio: u8,
    ) -> LogicalScreen {
        LogicalScreen {
            width,
            height,
            global_table: packed & 0b1000_0000 != 0,
            color_resolution: (packed & 0b0111_0000) >> 4,
            sorted: packed & 0b0000_1000 != 0,
            table_size: packed & 0b0000_0111,
            background,
            aspect_ratio,
        }
    }

    /// Number of entries in the global color table, if present
    pub fn global_table_len(&self) -> Option<usize> {
        if self.global_table {
            Some(table_len(self.table_size))
        } else {
            None
        }
    }
}

/// Image descriptor
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ImageDescriptor {
    pub rect: Rect,
    pub local_table: bool,
    pub interlaced: bool,
    pub sorted: bool,
    /// Size exponent of the local color table
    pub table_size: u8,
}

impl ImageDescriptor {
    pub fn from_packed(rect: Rect, packed: u8) -> ImageDescriptor {
        ImageDescriptor {
            rect,
            local_table: packed & 0b1000_0000 != 0,
            interlaced: packed & 0b0100_0000 != 0,
            sorted: packed & 0b0010_0000 != 0,
            table_size: packed & 0b0000_0111,
        }
    }

    /// Number of entries in the local color table, if present
    pub fn local_table_len(&self) -> Option<usize> {
        if self.local_table {
            Some(table_len(self.table_size))
        } else {
            None
        }
    }

    /// Number of indexed pixels in the image data
    pub fn pixel_count(&self) -> usize {
        self.rect.width as usize * self.rect.height as usize
    }
}

/// Graphic control extension
///
/// Applies to the next image block only.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct GraphicControl {
    pub dispose: DisposalMethod,
    pub needs_user_input: bool,
    pub transparent: Option<u8>,
    /// Frame delay in units of 10 ms
    pub delay: u16,
}

#[inline]
fn table_len(size: u8) -> usize {
    2 << (size & 7)
}

/// A composited frame
///
/// `buffer` always covers the whole logical screen in RGBA order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Canvas width
    pub width: u16,
    /// Canvas height
    pub height: u16,
    /// Frame delay in units of 10 ms
    pub delay: u16,
    pub dispose: DisposalMethod,
    pub transparent: Option<u8>,
    pub needs_user_input: bool,
    /// Area covered by the image block this frame was decoded from
    pub rect: Rect,
    pub interlaced: bool,
    pub buffer: Vec<u8>,
}

impl Frame {
    /// Frame delay in milliseconds
    pub fn delay_ms(&self) -> u32 {
        self.delay as u32 * 10
    }

    /// RGBA value of the pixel at (`x`, `y`)
    ///
    /// Panics if the coordinates are outside the canvas.
    pub fn pixel(&self, x: u16, y: u16) -> [u8; 4] {
        assert!(x < self.width && y < self.height, "pixel out of bounds");
        let i = (y as usize * self.width as usize + x as usize) * N_CHANNELS;
        [self.buffer[i], self.buffer[i + 1], self.buffer[i + 2], self.buffer[i + 3]]
    }
}
