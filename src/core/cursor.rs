// Positioned little-endian reader with fixed-width and XOR-masked text decoding.
use std::io::{self, Read, Seek, SeekFrom};

use bstr::ByteSlice;

use crate::core::error::{Error, ErrorKind};

/// Reads typed fields from a borrowed byte source.
///
/// The cursor owns its position: every read advances it by the number of bytes
/// consumed, and `seek` moves both the cursor and the underlying source.
#[derive(Debug)]
pub struct ByteCursor<'a, S> {
    source: &'a mut S,
    position: u64,
}

impl<'a, S: Read + Seek> ByteCursor<'a, S> {
    /// Starts a cursor at offset 0 without touching the source.
    pub fn new(source: &'a mut S) -> Self {
        Self {
            source,
            position: 0,
        }
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn seek(&mut self, offset: u64) -> Result<(), Error> {
        self.source
            .seek(SeekFrom::Start(offset))
            .map_err(|err| io_error(err, offset, "seek failed"))?;
        self.position = offset;
        Ok(())
    }

    pub fn skip(&mut self, len: u64) -> Result<(), Error> {
        let target = self.position.checked_add(len).ok_or_else(|| {
            Error::new(ErrorKind::Io)
                .with_message("skip overflows offset")
                .with_offset(self.position)
        })?;
        self.seek(target)
    }

    pub fn read_u16(&mut self) -> Result<u16, Error> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    pub fn read_u32(&mut self) -> Result<u32, Error> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    pub fn read_f32(&mut self) -> Result<f32, Error> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(f32::from_le_bytes(buf))
    }

    /// Reads `len` bytes as text, stopping at the first zero byte.
    pub fn read_fixed_string(&mut self, len: usize) -> Result<String, Error> {
        let buf = self.read_bytes(len)?;
        Ok(decode_text(until_nul(&buf)))
    }

    /// Reads `len` bytes, unmasks each with `key`, and decodes the result as text.
    pub fn read_xor_string(&mut self, len: usize, key: u8) -> Result<String, Error> {
        let mut buf = self.read_bytes(len)?;
        xor_in_place(&mut buf, key);
        Ok(decode_text(&buf))
    }

    /// Like `read_xor_string`, but for zero-padded fields.
    ///
    /// Padding may be stored raw (`0x00`) or masked (`key`); the text ends at
    /// whichever zero comes first, before or after unmasking.
    pub fn read_fixed_xor_string(&mut self, len: usize, key: u8) -> Result<String, Error> {
        let buf = self.read_bytes(len)?;
        let mut text = until_nul(&buf).to_vec();
        xor_in_place(&mut text, key);
        Ok(decode_text(until_nul(&text)))
    }

    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, Error> {
        let mut buf = vec![0u8; len];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        self.source
            .read_exact(buf)
            .map_err(|err| io_error(err, self.position, "short read"))?;
        self.position += buf.len() as u64;
        Ok(())
    }
}

/// XORs every byte with `key`; applying it twice restores the input.
pub fn xor_bytes(bytes: &[u8], key: u8) -> Vec<u8> {
    bytes.iter().map(|byte| byte ^ key).collect()
}

fn xor_in_place(bytes: &mut [u8], key: u8) {
    for byte in bytes.iter_mut() {
        *byte ^= key;
    }
}

fn until_nul(bytes: &[u8]) -> &[u8] {
    match bytes.find_byte(0) {
        Some(end) => &bytes[..end],
        None => bytes,
    }
}

// Invalid UTF-8 sequences become U+FFFD.
fn decode_text(bytes: &[u8]) -> String {
    bytes.to_str_lossy().into_owned()
}

fn io_error(err: io::Error, offset: u64, context: &str) -> Error {
    let message = if err.kind() == io::ErrorKind::UnexpectedEof {
        format!("{context}: unexpected end of source")
    } else {
        context.to_string()
    };
    Error::new(ErrorKind::Io)
        .with_message(message)
        .with_offset(offset)
        .with_source(err)
}
