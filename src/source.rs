//! Byte source abstraction.
//!
//! Wraps whatever the bytes actually come from (a local file, a
//! gzip-compressed file detected by suffix or magic bytes, an in-memory
//! blob, or a caller-supplied reader) behind one trait that hands out
//! whole records. Line terminators `\n`, `\r\n` and bare `\r` are all
//! treated as record ends.
//!
//! Records are handed back into a caller-owned, reused `Vec<u8>` rather
//! than as spans into a shared ring buffer: the buffer is cleared at the
//! start of every `read_record` call, so there is never a span alive past
//! the point where the buffer could be refilled.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::error::{Error, Result};

/// Default buffer size for file/stream reads, in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// A source of whole VCF records (header lines and data lines alike).
pub trait LineSource {
    /// Append the next record's bytes (terminator stripped) to `buf`,
    /// clearing `buf` first. Returns `Ok(false)` at end of input with `buf`
    /// left empty.
    fn read_record(&mut self, buf: &mut Vec<u8>) -> Result<bool>;
}

/// A [`LineSource`] over any [`BufRead`], handling `\n`, `\r\n` and bare
/// `\r` terminators uniformly.
pub struct BufLineSource<R> {
    reader: R,
}

impl<R: BufRead> BufLineSource<R> {
    pub fn new(reader: R) -> Self {
        BufLineSource { reader }
    }
}

impl<R: BufRead> LineSource for BufLineSource<R> {
    fn read_record(&mut self, buf: &mut Vec<u8>) -> Result<bool> {
        buf.clear();
        loop {
            let available = match self.reader.fill_buf() {
                Ok(available) => available,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::IoFailure(e)),
            };

            if available.is_empty() {
                return Ok(!buf.is_empty());
            }

            if let Some(pos) = available.iter().position(|&b| b == b'\n' || b == b'\r') {
                let terminator = available[pos];
                buf.extend_from_slice(&available[..pos]);
                let consumed = pos + 1;
                self.reader.consume(consumed);

                if terminator == b'\r' {
                    // Swallow a following '\n' to normalise CRLF.
                    match self.reader.fill_buf() {
                        Ok(next) if next.first() == Some(&b'\n') => self.reader.consume(1),
                        Ok(_) => {}
                        Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                        Err(e) => return Err(Error::IoFailure(e)),
                    }
                }
                return Ok(true);
            } else {
                buf.extend_from_slice(available);
                let len = available.len();
                self.reader.consume(len);
            }
        }
    }
}

/// A [`LineSource`] over an in-memory byte blob, used for tests and for
/// callers that already have the whole file in memory.
pub type MemoryLineSource = BufLineSource<Cursor<Vec<u8>>>;

impl MemoryLineSource {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        BufLineSource::new(Cursor::new(bytes.into()))
    }
}

/// Detects gzip-compressed input by its magic bytes (`1f 8b`), independent
/// of file extension.
fn is_gzip_magic(peek: &[u8]) -> bool {
    peek.len() >= 2 && peek[0] == 0x1f && peek[1] == 0x8b
}

/// Open a path as a [`LineSource`], transparently decompressing gzip input
/// detected either by the `.gz` suffix or by magic bytes.
pub fn open_path(path: impl AsRef<Path>, buffer_size: usize) -> Result<Box<dyn LineSource>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(Error::IoFailure)?;
    let mut reader = BufReader::with_capacity(buffer_size, file);

    let looks_gzip = path.extension().map(|e| e == "gz").unwrap_or(false) || {
        let peek = reader.fill_buf().map_err(Error::IoFailure)?;
        is_gzip_magic(peek)
    };

    if looks_gzip {
        let decoder = MultiGzDecoder::new(reader);
        Ok(Box::new(BufLineSource::new(BufReader::with_capacity(
            buffer_size,
            decoder,
        ))))
    } else {
        Ok(Box::new(BufLineSource::new(reader)))
    }
}

/// Wrap an arbitrary caller-supplied reader as a [`LineSource`], detecting
/// gzip framing by magic bytes only (no path/extension available).
pub fn open_reader(reader: impl Read + 'static, buffer_size: usize) -> Result<Box<dyn LineSource>> {
    let mut buffered = BufReader::with_capacity(buffer_size, reader);
    let looks_gzip = {
        let peek = buffered.fill_buf().map_err(Error::IoFailure)?;
        is_gzip_magic(peek)
    };

    if looks_gzip {
        let decoder = MultiGzDecoder::new(buffered);
        Ok(Box::new(BufLineSource::new(BufReader::with_capacity(
            buffer_size,
            decoder,
        ))))
    } else {
        Ok(Box::new(BufLineSource::new(buffered)))
    }
}

/// Wrap an in-memory byte blob as a [`LineSource`], detecting gzip framing
/// by magic bytes.
pub fn open_bytes(bytes: impl Into<Vec<u8>>) -> Result<Box<dyn LineSource>> {
    let bytes = bytes.into();
    if is_gzip_magic(&bytes) {
        let decoder = MultiGzDecoder::new(Cursor::new(bytes));
        Ok(Box::new(BufLineSource::new(BufReader::new(decoder))))
    } else {
        Ok(Box::new(MemoryLineSource::new(bytes)))
    }
}
