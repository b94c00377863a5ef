//! Traits used in this library
use std::io;

/// Configuration parameter trait
pub trait Parameter<Object> {
    fn set_param(self, this: &mut Object);
}

/// Object has parameters
pub trait HasParameters: Sized {
    fn set<T: Parameter<Self>>(&mut self, value: T) -> &mut Self {
        value.set_param(self);
        self
    }
}

/// Reader extension to read little endian data
pub trait ReadBytesExt<T> {
    fn read_le(&mut self) -> io::Result<T>;
}

impl<R: io::Read + ?Sized> ReadBytesExt<u8> for R {
    #[inline]
    fn read_le(&mut self) -> io::Result<u8> {
        let mut byte = [0];
        self.read_exact(&mut byte)?;
        Ok(byte[0])
    }
}

impl<R: io::Read + ?Sized> ReadBytesExt<u16> for R {
    #[inline]
    fn read_le(&mut self) -> io::Result<u16> {
        let mut bytes = [0; 2];
        self.read_exact(&mut bytes)?;
        Ok(u16::from_le_bytes(bytes))
    }
}
