//! Writing archives, incrementally or in one call.

use std::io::Write;

use crate::{
    AsBlock, CarError, Link, Span,
    block::write_frame,
    header::encode_header,
};

/// Writes an archive incrementally: the header on construction, then one
/// frame per [`Encoder::write_block`] call, in call order.
///
/// Nothing is hashed or verified; a block is framed with exactly the link
/// it is given. If the writer fails part way, whatever was written should
/// be discarded.
#[derive(Debug)]
pub struct Encoder<W> {
    writer: W,
    position: u64,
}

impl<W> Encoder<W>
where
    W: Write,
{
    /// Writes the header for `roots` (in the given order) and returns an
    /// encoder ready for blocks.
    pub fn new(mut writer: W, roots: &[Link]) -> Result<Self, CarError> {
        let header = encode_header(roots)?;
        writer.write_all(&header)?;

        tracing::debug!(
            roots = roots.len(),
            length = header.len(),
            "Wrote archive header"
        );

        Ok(Encoder {
            writer,
            position: header.len() as u64,
        })
    }

    /// Appends one frame, returning where its payload landed.
    pub fn write_block(&mut self, link: &Link, data: &[u8]) -> Result<Span, CarError> {
        let written = write_frame(&mut self.writer, link, data)?;
        let span = Span {
            offset: self.position + written - data.len() as u64,
            length: data.len() as u64,
        };
        self.position += written;

        tracing::trace!(
            %link,
            offset = span.offset,
            length = span.length,
            "Wrote block"
        );

        Ok(span)
    }

    /// Appends anything that can be framed.
    pub fn write<B>(&mut self, block: &B) -> Result<Span, CarError>
    where
        B: AsBlock + ?Sized,
    {
        self.write_block(block.link(), block.data())
    }

    /// Number of bytes written so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Flushes and returns the writer.
    pub fn finish(mut self) -> Result<W, CarError> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Writes a complete archive: header for `roots`, then every block in
/// iteration order, with no padding or separators.
pub fn encode<W, I, B>(writer: W, roots: &[Link], blocks: I) -> Result<W, CarError>
where
    W: Write,
    I: IntoIterator<Item = B>,
    B: AsBlock,
{
    let mut encoder = Encoder::new(writer, roots)?;
    for block in blocks {
        encoder.write(&block)?;
    }
    encoder.finish()
}

/// Encodes a complete archive into memory.
pub fn to_vec<I, B>(roots: &[Link], blocks: I) -> Result<Vec<u8>, CarError>
where
    I: IntoIterator<Item = B>,
    B: AsBlock,
{
    encode(Vec::new(), roots, blocks)
}
