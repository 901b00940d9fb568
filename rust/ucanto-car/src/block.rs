//! Blocks and their on-wire frames.
//!
//! ```text
//! ┌──────────────────┬────────────┬─────────────────┐
//! │ varint(frameLen) │ link bytes │  payload bytes  │
//! └──────────────────┴────────────┴─────────────────┘
//!                    └────────── frameLen ──────────┘
//! ```

use std::{
    io::{self, Read, Seek, SeekFrom, Write},
    ops::Range,
};

use crate::{
    CarError, Hashers, Link,
    varint::{read_varint, write_varint_to},
};

/// Default upper bound on a single frame's declared length.
pub const DEFAULT_MAX_BLOCK_SIZE: u64 = 32 << 20;

/// A block decoded from an archive: its link, payload and where that
/// payload sits in the stream it came from.
///
/// Decoding does not check that the payload hashes to the link; use
/// [`Block::verify`] for that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    link: Link,
    data: Vec<u8>,
    offset: u64,
}

impl Block {
    pub(crate) fn new(link: Link, data: Vec<u8>, offset: u64) -> Self {
        Block { link, data, offset }
    }

    /// The link this block was framed with.
    pub fn link(&self) -> &Link {
        &self.link
    }

    /// The payload bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Absolute position of the first payload byte in the source stream.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Payload length in bytes.
    pub fn length(&self) -> u64 {
        self.data.len() as u64
    }

    /// Where the payload sits in the source stream.
    pub fn span(&self) -> Span {
        Span {
            offset: self.offset,
            length: self.length(),
        }
    }

    /// Checks that the payload hashes to the block's link.
    pub fn verify(&self, hashers: &Hashers) -> Result<bool, CarError> {
        self.link.verify(&self.data, hashers)
    }

    /// Consumes the block, returning the payload.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Consumes the block, returning link and payload.
    pub fn into_parts(self) -> (Link, Vec<u8>) {
        (self.link, self.data)
    }
}

/// A byte range of a payload inside the stream it was decoded from.
///
/// Only meaningful for that stream: the span lets a caller come back to the
/// payload later (to verify it, or to serve part of an archive) without
/// having held on to the bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    /// Absolute position of the first byte
    pub offset: u64,
    /// Number of bytes
    pub length: u64,
}

impl Span {
    /// The span as an index range into an in-memory copy of the stream.
    pub fn range(&self) -> Range<usize> {
        self.offset as usize..(self.offset + self.length) as usize
    }

    /// Re-reads the spanned bytes through `reader`.
    ///
    /// `reader` should be its own cursor onto the same storage (a second
    /// file handle, a fresh `Cursor`): it is seeked, so sharing it with a
    /// live [`Blocks`](crate::Blocks) iterator would corrupt that iterator.
    pub fn read_from<R>(&self, reader: &mut R) -> Result<Vec<u8>, CarError>
    where
        R: Read + Seek + ?Sized,
    {
        reader.seek(SeekFrom::Start(self.offset))?;

        let mut data = Vec::new();
        Read::take(&mut *reader, self.length).read_to_end(&mut data)?;
        if (data.len() as u64) < self.length {
            return Err(CarError::TruncatedBlock {
                offset: self.offset,
            });
        }

        Ok(data)
    }
}

/// Anything that can be written as a frame: a link and the payload it
/// names.
pub trait AsBlock {
    /// The link to frame the payload with.
    fn link(&self) -> &Link;

    /// The payload bytes.
    fn data(&self) -> &[u8];
}

impl AsBlock for Block {
    fn link(&self) -> &Link {
        &self.link
    }

    fn data(&self) -> &[u8] {
        &self.data
    }
}

impl AsBlock for (Link, Vec<u8>) {
    fn link(&self) -> &Link {
        &self.0
    }

    fn data(&self) -> &[u8] {
        &self.1
    }
}

impl AsBlock for (Link, &[u8]) {
    fn link(&self) -> &Link {
        &self.0
    }

    fn data(&self) -> &[u8] {
        self.1
    }
}

impl<T> AsBlock for &T
where
    T: AsBlock + ?Sized,
{
    fn link(&self) -> &Link {
        (**self).link()
    }

    fn data(&self) -> &[u8] {
        (**self).data()
    }
}

/// Reads the frame starting at `offset`.
///
/// Returns `Ok(None)` when the stream is cleanly exhausted before the first
/// byte of a frame, otherwise the block and the number of bytes consumed.
pub(crate) fn read_frame<R>(
    reader: &mut R,
    offset: u64,
    max_size: u64,
) -> Result<Option<(Block, u64)>, CarError>
where
    R: Read + ?Sized,
{
    let Some(first) = read_byte(reader)? else {
        return Ok(None);
    };

    let truncated = || CarError::TruncatedBlock { offset };

    let (length, prefix) = read_varint(&mut [first].as_slice().chain(&mut *reader))
        .map_err(|error| error.or_truncated(truncated()))?;

    if length > max_size {
        return Err(CarError::SectionTooLarge {
            offset,
            declared: length,
            limit: max_size,
        });
    }

    let mut frame = Vec::new();
    Read::take(&mut *reader, length).read_to_end(&mut frame)?;
    if (frame.len() as u64) < length {
        return Err(truncated());
    }

    let (link, link_length) = Link::decode(&frame).map_err(|source| CarError::MalformedBlock {
        offset,
        source: Box::new(source),
    })?;

    frame.drain(..link_length);
    let payload_offset = offset + prefix as u64 + link_length as u64;

    Ok(Some((
        Block::new(link, frame, payload_offset),
        prefix as u64 + length,
    )))
}

/// Writes one frame, returning the number of bytes written.
pub(crate) fn write_frame<W>(writer: &mut W, link: &Link, data: &[u8]) -> Result<u64, CarError>
where
    W: Write + ?Sized,
{
    let link_bytes = link.to_bytes();
    let length = (link_bytes.len() + data.len()) as u64;

    let prefix = write_varint_to(writer, length)?;
    writer.write_all(&link_bytes)?;
    writer.write_all(data)?;

    Ok(prefix as u64 + length)
}

fn read_byte<R>(reader: &mut R) -> io::Result<Option<u8>>
where
    R: Read + ?Sized,
{
    let mut byte = [0u8];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte[0])),
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Prefix,
        hash::{IDENTITY, SHA2_256},
        link::RAW,
    };
    use pretty_assertions::assert_eq;
    use std::io::Cursor;
    use testresult::TestResult;

    fn raw_block(data: &[u8]) -> Result<(Link, Vec<u8>), CarError> {
        let link = Prefix::v1(RAW, SHA2_256).sum(data, &Hashers::default())?;
        Ok((link, data.to_vec()))
    }

    #[test]
    fn it_frames_link_then_payload() -> TestResult {
        let (link, data) = raw_block(b"payload")?;

        let mut bytes = Vec::new();
        let written = write_frame(&mut bytes, &link, &data)?;

        assert_eq!(written, bytes.len() as u64);
        assert_eq!(bytes[0] as usize, link.encoded_len() + data.len());
        assert_eq!(&bytes[1..1 + link.encoded_len()], link.to_bytes().as_slice());
        assert_eq!(&bytes[1 + link.encoded_len()..], b"payload");
        Ok(())
    }

    #[test]
    fn it_reports_the_payload_offset() -> TestResult {
        let (link, data) = raw_block(b"payload")?;

        let mut bytes = vec![0xee; 10];
        write_frame(&mut bytes, &link, &data)?;

        let mut reader = &bytes[10..];
        let (block, consumed) = read_frame(&mut reader, 10, DEFAULT_MAX_BLOCK_SIZE)?
            .ok_or("expected a frame")?;

        assert_eq!(consumed, bytes.len() as u64 - 10);
        assert_eq!(block.link(), &link);
        assert_eq!(block.data(), b"payload");
        assert_eq!(block.offset(), 10 + 1 + link.encoded_len() as u64);
        assert_eq!(&bytes[block.span().range()], b"payload");
        Ok(())
    }

    #[test]
    fn it_ends_cleanly_on_an_empty_stream() -> TestResult {
        assert!(read_frame(&mut &[][..], 0, DEFAULT_MAX_BLOCK_SIZE)?.is_none());
        Ok(())
    }

    #[test]
    fn it_reports_short_frames_as_truncated() -> TestResult {
        let (link, data) = raw_block(b"payload")?;
        let mut bytes = Vec::new();
        write_frame(&mut bytes, &link, &data)?;

        let result = read_frame(&mut &bytes[..bytes.len() - 1], 4, DEFAULT_MAX_BLOCK_SIZE);
        assert!(matches!(result, Err(CarError::TruncatedBlock { offset: 4 })));

        // A length prefix cut in half
        let result = read_frame(&mut &[0x80][..], 4, DEFAULT_MAX_BLOCK_SIZE);
        assert!(matches!(result, Err(CarError::TruncatedBlock { offset: 4 })));
        Ok(())
    }

    #[test]
    fn it_wraps_link_failures_as_malformed_blocks() {
        // Declares a 40-byte digest inside a 6-byte frame
        let bytes = [0x06, 0x01, 0x55, 0x12, 0x28, 0xaa, 0xbb];
        let result = read_frame(&mut &bytes[..], 0, DEFAULT_MAX_BLOCK_SIZE);

        match result {
            Err(CarError::MalformedBlock { offset, source }) => {
                assert_eq!(offset, 0);
                assert!(matches!(*source, CarError::TruncatedLink { .. }));
            }
            other => panic!("expected a malformed block, got {other:?}"),
        }

        let result = read_frame(&mut &[0x00][..], 0, DEFAULT_MAX_BLOCK_SIZE);
        assert!(matches!(result, Err(CarError::MalformedBlock { .. })));
    }

    #[test]
    fn it_rejects_payloads_that_only_extend_an_identity_link() -> TestResult {
        let link = Link::new(RAW, IDENTITY, b"ab")?;
        let mut bytes = Vec::new();
        write_frame(&mut bytes, &link, b"abc")?;

        let (block, _) =
            read_frame(&mut &bytes[..], 0, DEFAULT_MAX_BLOCK_SIZE)?.ok_or("expected a frame")?;
        assert!(!block.verify(&Hashers::default())?);
        Ok(())
    }

    #[test]
    fn it_rereads_spans_through_an_independent_cursor() -> TestResult {
        let (link, data) = raw_block(b"seekable")?;
        let mut bytes = Vec::new();
        write_frame(&mut bytes, &link, &data)?;

        let (block, _) =
            read_frame(&mut &bytes[..], 0, DEFAULT_MAX_BLOCK_SIZE)?.ok_or("expected a frame")?;

        let mut cursor = Cursor::new(&bytes);
        assert_eq!(block.span().read_from(&mut cursor)?, b"seekable".to_vec());

        let mut short = Cursor::new(&bytes[..bytes.len() - 2]);
        assert!(matches!(
            block.span().read_from(&mut short),
            Err(CarError::TruncatedBlock { .. })
        ));
        Ok(())
    }
}
