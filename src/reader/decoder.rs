use std::io::Read;
use std::mem;

use log::{debug, warn};
use num::FromPrimitive;

use crate::traits::{HasParameters, Parameter};
use crate::types::{
    Block, DisposalMethod, Extension, Frame, GraphicControl, ImageDescriptor, LogicalScreen, Rect,
    N_CHANNELS,
};

use super::block::{BlockReader, MAX_SUB_BLOCK};
use super::compose::Compositor;
use super::lzw::{LzwDecoder, StreamEnd};
use super::palette::{self, ColorTable};
use super::{DecodeOptions, DecodingError, Leniency};

/// Application identifiers of the looping extension
const LOOPING_IDS: [&[u8]; 2] = [b"NETSCAPE2.0", b"ANIMEXTS1.0"];

/// Loop count reported when the stream has no looping extension
pub const DEFAULT_LOOP_COUNT: u16 = 1;

/// Indicates the progress of decoding
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Progress {
    /// Nothing read yet
    Start,
    /// Header done, positioned at the start of a block
    BlockStart,
    /// Trailer read
    Trailer,
    /// A fatal error stopped decoding
    Failed,
}

/// Application extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Application {
    /// Number of times the animation repeats, 0 means forever
    Looping(u16),
    /// Any other application, identified by its first sub-block
    Other(Vec<u8>),
}

/// A parsed top-level block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    /// Image descriptor and optional local color table. The compressed image
    /// data follows.
    Image(ImageDescriptor, Option<ColorTable>),
    Control(GraphicControl),
    Application(Application),
    /// Comment, plain text and unknown extensions, identified by label
    Skipped(u8),
    Trailer,
}

/// GIF stream decoder
///
/// Drives the block reader, LZW decoder, palette resolution and compositing
/// over one stream. Decoding is strictly sequential.
#[derive(Debug)]
pub struct Decoder<R: Read> {
    r: BlockReader<R>,
    options: DecodeOptions,
    progress: Progress,
    version: [u8; 3],
    screen: LogicalScreen,
    global_table: Option<ColorTable>,
    /// Graphic control for the next image
    control: GraphicControl,
    compositor: Compositor,
    loop_count: Option<u16>,
}

impl<R: Read> HasParameters for Decoder<R> {}

impl<T, R> Parameter<Decoder<R>> for T
where
    T: Parameter<DecodeOptions>,
    R: Read,
{
    fn set_param(self, this: &mut Decoder<R>) {
        Parameter::<DecodeOptions>::set_param(self, &mut this.options);
    }
}

impl<R: Read> Decoder<R> {
    pub fn new(r: R) -> Decoder<R> {
        Decoder {
            r: BlockReader::new(r),
            options: DecodeOptions::default(),
            progress: Progress::Start,
            version: [0; 3],
            screen: LogicalScreen::default(),
            global_table: None,
            control: GraphicControl::default(),
            compositor: Compositor::new(0, 0),
            loop_count: None,
        }
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    /// The three bytes following the `GIF` signature
    pub fn version(&self) -> &[u8] {
        &self.version
    }

    pub fn screen(&self) -> &LogicalScreen {
        &self.screen
    }

    pub fn width(&self) -> u16 {
        self.screen.width
    }

    pub fn height(&self) -> u16 {
        self.screen.height
    }

    pub fn global_palette(&self) -> Option<&ColorTable> {
        self.global_table.as_ref()
    }

    /// Index of the background color in the global palette
    pub fn bg_color(&self) -> usize {
        self.screen.background as usize
    }

    /// Repetitions from the looping extension seen so far
    pub fn loop_count(&self) -> u16 {
        self.loop_count.unwrap_or(DEFAULT_LOOP_COUNT)
    }

    /// Number of frames decoded so far
    pub fn frame_count(&self) -> usize {
        self.compositor.frame_count()
    }

    /// Reads the header, logical screen descriptor and global color table.
    ///
    /// Does nothing if they were already read.
    pub fn read_header(&mut self) -> Result<(), DecodingError> {
        if self.progress != Progress::Start {
            return Ok(());
        }
        let result = self.read_header_blocks();
        if result.is_err() {
            self.progress = Progress::Failed;
        }
        result
    }

    /// Decodes up to and including the next image.
    ///
    /// Returns `Ok(None)` once the trailer has been read, and after a
    /// previous error.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, DecodingError> {
        match self.progress {
            Progress::Start => self.read_header()?,
            Progress::BlockStart => (),
            Progress::Trailer | Progress::Failed => return Ok(None),
        }
        let result = self.advance();
        if result.is_err() {
            self.progress = Progress::Failed;
        }
        result
    }

    fn advance(&mut self) -> Result<Option<Frame>, DecodingError> {
        loop {
            match self.next_block()? {
                BlockKind::Image(desc, local) => return self.read_image(desc, local).map(Some),
                BlockKind::Control(control) => self.control = control,
                BlockKind::Application(Application::Looping(count)) => {
                    self.loop_count = Some(count)
                }
                BlockKind::Application(Application::Other(_)) | BlockKind::Skipped(_) => (),
                BlockKind::Trailer => {
                    self.progress = Progress::Trailer;
                    return Ok(None);
                }
            }
        }
    }

    fn read_header_blocks(&mut self) -> Result<(), DecodingError> {
        let mut magic = [0; 6];
        self.r.read_exact(&mut magic)?;
        if &magic[..3] != b"GIF" {
            return Err(DecodingError::Format("malformed GIF header"));
        }
        self.version.copy_from_slice(&magic[3..]);

        let width = self.r.read_u16()?;
        let height = self.r.read_u16()?;
        let packed = self.r.read_byte()?;
        let background = self.r.read_byte()?;
        let aspect_ratio = self.r.read_byte()?;
        self.screen = LogicalScreen::from_packed(width, height, packed, background, aspect_ratio);
        debug!("logical screen: {:?}", self.screen);

        self.options.check_memory(width as usize * height as usize * N_CHANNELS)?;
        if let Some(len) = self.screen.global_table_len() {
            self.global_table = Some(ColorTable::read(&mut self.r, len)?);
            debug!("global color table with {} entries", len);
        }
        self.compositor = Compositor::new(width, height);
        self.progress = Progress::BlockStart;
        Ok(())
    }

    /// Reads the next top-level block.
    ///
    /// For an image, only the descriptor and local color table are
    /// consumed.
    pub fn next_block(&mut self) -> Result<BlockKind, DecodingError> {
        let code = self.r.read_byte()?;
        match Block::from_u8(code) {
            Some(Block::Image) => self.read_image_descriptor(),
            Some(Block::Extension) => self.read_extension(),
            Some(Block::Trailer) => Ok(BlockKind::Trailer),
            None => {
                debug!("unknown block type 0x{:02X}", code);
                Err(DecodingError::Format("unknown block type encountered"))
            }
        }
    }

    fn read_extension(&mut self) -> Result<BlockKind, DecodingError> {
        let label = self.r.read_byte()?;
        match Extension::from_u8(label) {
            Some(Extension::Control) => self.read_control().map(BlockKind::Control),
            Some(Extension::Application) => self.read_application().map(BlockKind::Application),
            _ => {
                debug!("skipping extension 0x{:02X}", label);
                self.r.skip_sub_block_run()?;
                Ok(BlockKind::Skipped(label))
            }
        }
    }

    fn read_control(&mut self) -> Result<GraphicControl, DecodingError> {
        let mut data = Vec::with_capacity(4);
        self.r.read_sub_block_run(&mut data)?;
        if data.len() < 4 {
            return Err(DecodingError::Format("graphic control extension too short"));
        }
        let flags = data[0];
        let method = (flags & 0b1_1100) >> 2;
        let dispose = DisposalMethod::from_u8(method).unwrap_or_else(|| {
            warn!("reserved disposal method {}, treating as unspecified", method);
            DisposalMethod::Any
        });
        let control = GraphicControl {
            dispose,
            needs_user_input: flags & 0b10 != 0,
            transparent: if flags & 1 != 0 { Some(data[3]) } else { None },
            delay: u16::from_le_bytes([data[1], data[2]]),
        };
        debug!("graphic control: {:?}", control);
        Ok(control)
    }

    fn read_application(&mut self) -> Result<Application, DecodingError> {
        let mut buf = [0; MAX_SUB_BLOCK];
        let n = self.r.read_sub_block(&mut buf).map_err(|(_, err)| err)?;
        if n == 0 {
            return Ok(Application::Other(Vec::new()));
        }
        let id = buf[..n].to_vec();
        if !LOOPING_IDS.contains(&&id[..]) {
            debug!("skipping application extension {:?}", String::from_utf8_lossy(&id));
            self.r.skip_sub_block_run()?;
            return Ok(Application::Other(id));
        }
        let mut loop_count = None;
        loop {
            match self.r.read_sub_block(&mut buf).map_err(|(_, err)| err)? {
                0 => break,
                n if n >= 3 && buf[0] == 1 => {
                    loop_count = Some(u16::from_le_bytes([buf[1], buf[2]]))
                }
                _ => (),
            }
        }
        debug!("loop count: {:?}", loop_count);
        Ok(loop_count.map_or(Application::Other(id), Application::Looping))
    }

    fn read_image_descriptor(&mut self) -> Result<BlockKind, DecodingError> {
        let rect = Rect {
            left: self.r.read_u16()?,
            top: self.r.read_u16()?,
            width: self.r.read_u16()?,
            height: self.r.read_u16()?,
        };
        let packed = self.r.read_byte()?;
        let desc = ImageDescriptor::from_packed(rect, packed);
        debug!("image descriptor: {:?}", desc);
        let local = match desc.local_table_len() {
            Some(len) => Some(ColorTable::read(&mut self.r, len)?),
            None => None,
        };
        Ok(BlockKind::Image(desc, local))
    }

    /// Decodes the image data following an image descriptor and composites
    /// it into a frame.
    pub fn read_image(
        &mut self,
        desc: ImageDescriptor,
        local: Option<ColorTable>,
    ) -> Result<Frame, DecodingError> {
        let control = mem::take(&mut self.control);
        let strict = self.options.leniency == Leniency::Strict;
        if strict && !desc.rect.fits(self.screen.width, self.screen.height) {
            return Err(DecodingError::Format("image exceeds logical screen"));
        }
        self.options.check_memory(desc.pixel_count())?;
        let palette = palette::resolve(
            self.global_table.as_ref(),
            local,
            &control,
            self.screen.background,
        )?;

        let min_code_size = self.r.read_byte()?;
        if strict && min_code_size < 2 {
            return Err(DecodingError::Format("invalid LZW minimum code size"));
        }
        let mut lzw = LzwDecoder::new(min_code_size)?;
        let data = lzw.decode(&mut self.r, desc.pixel_count())?;
        if data.end != StreamEnd::Terminator {
            self.r.skip_sub_block_run()?;
        }
        if data.is_short() {
            if strict {
                return Err(DecodingError::Format(
                    "image data ended before all pixels were decoded",
                ));
            }
            warn!(
                "image data ended after {} of {} pixels, zero filling",
                data.decoded,
                data.pixels.len()
            );
        }

        let canvas = self.compositor.compose(&desc, &data.pixels, &palette, control.dispose);
        let buffer = canvas
            .iter()
            .flat_map(|&c| [(c >> 16) as u8, (c >> 8) as u8, c as u8, (c >> 24) as u8])
            .collect();
        Ok(Frame {
            width: self.screen.width,
            height: self.screen.height,
            delay: control.delay,
            dispose: control.dispose,
            transparent: control.transparent,
            needs_user_input: control.needs_user_input,
            rect: desc.rect,
            interlaced: desc.interlaced,
            buffer,
        })
    }
}
