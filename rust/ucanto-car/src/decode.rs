//! Lazy, single-pass decoding of an archive into its roots and blocks.

use std::{io::Read, iter::FusedIterator};

use crate::{
    Block, CarError, Header, Link,
    block::{DEFAULT_MAX_BLOCK_SIZE, read_frame},
    header::DEFAULT_MAX_HEADER_SIZE,
};

/// Limits applied while decoding untrusted archives.
///
/// Declared lengths above a limit fail with [`CarError::SectionTooLarge`]
/// before anything is allocated for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    max_header_size: u64,
    max_block_size: u64,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            max_header_size: DEFAULT_MAX_HEADER_SIZE,
            max_block_size: DEFAULT_MAX_BLOCK_SIZE,
        }
    }
}

impl DecodeOptions {
    /// Options with the default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the largest header length that will be accepted.
    pub fn max_header_size(mut self, max_header_size: u64) -> Self {
        self.max_header_size = max_header_size;
        self
    }

    /// Sets the largest frame length that will be accepted.
    pub fn max_block_size(mut self, max_block_size: u64) -> Self {
        self.max_block_size = max_block_size;
        self
    }

    /// Decodes the header of `reader` and returns its roots together with a
    /// lazy iterator over the blocks that follow.
    ///
    /// Offsets reported by the blocks count from the position `reader` was
    /// at when this was called.
    pub fn decode<R>(&self, mut reader: R) -> Result<(Vec<Link>, Blocks<R>), CarError>
    where
        R: Read,
    {
        let (header, position) = Header::read(&mut reader, self.max_header_size)?;

        tracing::debug!(
            roots = header.roots().len(),
            length = position,
            "Decoded archive header"
        );

        let roots = header.roots().to_vec();
        let blocks = Blocks {
            reader,
            header,
            position,
            max_block_size: self.max_block_size,
            status: Status::Reading,
        };

        Ok((roots, blocks))
    }
}

/// Decodes an archive with the default [`DecodeOptions`].
pub fn decode<R>(reader: R) -> Result<(Vec<Link>, Blocks<R>), CarError>
where
    R: Read,
{
    DecodeOptions::default().decode(reader)
}

/// Where a [`Blocks`] iterator is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// More frames may follow.
    Reading,
    /// The stream ended cleanly on a frame boundary.
    Complete,
    /// A frame failed to decode; the error was the last item yielded.
    Failed,
}

/// A forward-only, single-pass iterator over the blocks of an archive.
///
/// Each item is either a decoded [`Block`] or the error that ended
/// iteration. After an error (or a clean end) the iterator yields nothing
/// more; [`Blocks::status`] tells the two endings apart. Blocks yielded
/// before an error remain valid.
#[derive(Debug)]
pub struct Blocks<R> {
    reader: R,
    header: Header,
    position: u64,
    max_block_size: u64,
    status: Status,
}

impl<R> Blocks<R> {
    /// The archive header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The archive roots.
    pub fn roots(&self) -> &[Link] {
        self.header.roots()
    }

    /// Number of bytes consumed from the stream so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Whether iteration is still going, ended cleanly or failed.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Gives back the underlying reader, positioned after the last frame
    /// read.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R> Iterator for Blocks<R>
where
    R: Read,
{
    type Item = Result<Block, CarError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.status != Status::Reading {
            return None;
        }

        match read_frame(&mut self.reader, self.position, self.max_block_size) {
            Ok(Some((block, consumed))) => {
                tracing::trace!(
                    link = %block.link(),
                    offset = block.offset(),
                    length = block.length(),
                    "Decoded block"
                );
                self.position += consumed;
                Some(Ok(block))
            }
            Ok(None) => {
                tracing::debug!(length = self.position, "Reached end of archive");
                self.status = Status::Complete;
                None
            }
            Err(error) => {
                tracing::warn!(offset = self.position, %error, "Archive decoding failed");
                self.status = Status::Failed;
                Some(Err(error))
            }
        }
    }
}

impl<R> FusedIterator for Blocks<R> where R: Read {}
