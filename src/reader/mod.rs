use std::io::{self, Read};

use log::warn;
use thiserror::Error;

use crate::traits::{HasParameters, Parameter};
use crate::types::{Frame, LogicalScreen};

mod block;
mod compose;
mod decoder;
mod lzw;
mod palette;

pub use self::decoder::{Application, BlockKind, Decoder, Progress, DEFAULT_LOOP_COUNT};
pub use self::palette::ColorTable;

/// Errors that stop decoding
#[derive(Debug, Error)]
pub enum DecodingError {
    /// The stream violates the GIF format
    #[error("format error: {0}")]
    Format(&'static str),
    /// The source could not be opened
    #[error("cannot open source: {0}")]
    Open(#[source] io::Error),
    /// Reading from the source failed
    #[error("read error: {0}")]
    Io(#[source] io::Error),
}

impl From<io::Error> for DecodingError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            DecodingError::Format("unexpected end of stream")
        } else {
            DecodingError::Io(err)
        }
    }
}

impl DecodingError {
    /// Terminal status reported for this error
    pub fn status(&self) -> Status {
        match *self {
            DecodingError::Open(_) => Status::OpenError,
            DecodingError::Format(_) | DecodingError::Io(_) => Status::FormatError,
        }
    }
}

/// Terminal status of a decode
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Status {
    Ok,
    /// Decoding stopped on a malformed or unreadable stream. Frames decoded
    /// before the error are still available.
    FormatError,
    /// The source could not be opened, no frames were decoded
    OpenError,
}

/// How malformed input is tolerated
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Leniency {
    /// Image data that ends early is zero filled and images reaching past
    /// the logical screen are clipped. A minimum LZW code size of 1 is
    /// accepted.
    #[default]
    Legacy,
    /// All of these are format errors.
    Strict,
}

/// Upper bound in bytes for a single pixel buffer
///
/// The canvas is allocated from the logical screen size as soon as the header
/// is read, so a few bytes of input can claim up to 65535×65535×4 bytes. Set
/// a limit when decoding untrusted input.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MemoryLimit(pub usize);

impl MemoryLimit {
    /// No limit
    pub const NONE: MemoryLimit = MemoryLimit(usize::MAX);
}

impl Default for MemoryLimit {
    fn default() -> MemoryLimit {
        MemoryLimit::NONE
    }
}

/// Decoder configuration
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    pub leniency: Leniency,
    pub memory_limit: MemoryLimit,
}

impl DecodeOptions {
    fn check_memory(&self, bytes: usize) -> Result<(), DecodingError> {
        if bytes > self.memory_limit.0 {
            warn!("{} byte buffer exceeds the memory limit of {}", bytes, self.memory_limit.0);
            return Err(DecodingError::Format("memory limit exceeded"));
        }
        Ok(())
    }
}

impl HasParameters for DecodeOptions {}

impl Parameter<DecodeOptions> for Leniency {
    fn set_param(self, this: &mut DecodeOptions) {
        this.leniency = self
    }
}

impl Parameter<DecodeOptions> for MemoryLimit {
    fn set_param(self, this: &mut DecodeOptions) {
        this.memory_limit = self
    }
}

impl<T, R> Parameter<Reader<R>> for T
where
    T: Parameter<Decoder<io::BufReader<R>>>,
    R: Read,
{
    fn set_param(self, this: &mut Reader<R>) {
        this.decoder.set(self);
    }
}

/// Result of decoding a whole stream
///
/// Decoding is best effort: frames decoded before an error are kept.
#[derive(Debug)]
pub struct Decoded {
    pub frames: Vec<Frame>,
    /// Number of repetitions, 0 means forever
    pub loop_count: u16,
    /// The error that ended decoding, if any
    pub error: Option<DecodingError>,
}

impl Decoded {
    /// A decode that failed before any frame was produced
    pub fn failed(error: DecodingError) -> Decoded {
        Decoded {
            frames: Vec::new(),
            loop_count: DEFAULT_LOOP_COUNT,
            error: Some(error),
        }
    }

    pub fn status(&self) -> Status {
        self.error.as_ref().map_or(Status::Ok, DecodingError::status)
    }

    /// Drops partial results on error.
    pub fn into_result(self) -> Result<Vec<Frame>, DecodingError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.frames),
        }
    }
}

/// Buffered GIF reader
pub struct Reader<R: Read> {
    decoder: Decoder<io::BufReader<R>>,
}

impl<R: Read> HasParameters for Reader<R> {}

impl<R> Reader<R>
where
    R: Read,
{
    pub fn new(reader: R) -> Reader<R> {
        Reader {
            decoder: Decoder::new(io::BufReader::new(reader)),
        }
    }

    /// Reads everything up to the first block.
    pub fn read_info(&mut self) -> Result<(), DecodingError> {
        self.decoder.read_header()
    }

    /// Decodes the next frame, `None` after the trailer.
    pub fn read_next_frame(&mut self) -> Result<Option<Frame>, DecodingError> {
        self.decoder.next_frame()
    }

    /// Decodes all remaining frames.
    pub fn read_to_end(mut self) -> Decoded {
        let mut frames = Vec::new();
        let error = loop {
            match self.decoder.next_frame() {
                Ok(Some(frame)) => frames.push(frame),
                Ok(None) => break None,
                Err(err) => break Some(err),
            }
        };
        let error = match error {
            None if frames.is_empty() => Some(DecodingError::Format("no frames decoded")),
            error => error,
        };
        if let Some(ref err) = error {
            warn!("decoding stopped after {} frames: {}", frames.len(), err);
        }
        Decoded {
            frames,
            loop_count: self.decoder.loop_count(),
            error,
        }
    }

    /// Width of the image
    pub fn width(&self) -> u16 {
        self.decoder.width()
    }

    /// Height of the image
    pub fn height(&self) -> u16 {
        self.decoder.height()
    }

    /// Version bytes following the signature
    pub fn version(&self) -> &[u8] {
        self.decoder.version()
    }

    pub fn screen(&self) -> &LogicalScreen {
        self.decoder.screen()
    }

    /// The global color palette
    pub fn global_palette(&self) -> Option<&ColorTable> {
        self.decoder.global_palette()
    }

    /// Index of the background color in the global palette
    pub fn bg_color(&self) -> usize {
        self.decoder.bg_color()
    }

    /// Repetitions from the looping extension, 1 if there is none
    pub fn loop_count(&self) -> u16 {
        self.decoder.loop_count()
    }
}
