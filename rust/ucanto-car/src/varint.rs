//! Unsigned LEB128 varints, as used for every length prefix and link
//! component in an archive.
//!
//! Reading is strict: an encoding is accepted only if it is the single
//! minimal encoding of its value, so that anything decoded here re-encodes
//! to the same bytes.

use std::io::{self, Read, Write};

use crate::{CarError, VarintError};

/// Maximum number of bytes in the encoding of a `u64`.
pub const MAX_VARINT_LENGTH: usize = 10;

/// Number of bytes in the minimal encoding of `value`.
pub const fn varint_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    if bits == 0 { 1 } else { bits.div_ceil(7) }
}

/// Reads one varint, returning the value and the number of bytes consumed.
///
/// At most [`MAX_VARINT_LENGTH`] bytes are read. Fails with
/// [`CarError::MalformedVarint`] if the input ends before the final group,
/// if the value overflows 64 bits, or if the encoding is not minimal. Other
/// I/O failures are returned as [`CarError::Io`].
pub fn read_varint<R>(reader: &mut R) -> Result<(u64, usize), CarError>
where
    R: Read + ?Sized,
{
    let mut bounded = Bounded {
        reader,
        count: 0,
        exhausted: false,
    };

    let value = match leb128::read::unsigned(&mut bounded) {
        Ok(value) => value,
        // Running past the last group a u64 can have is an overflow, even
        // if the input would have ended right after.
        Err(_) if bounded.exhausted => return Err(VarintError::Overflow.into()),
        Err(leb128::read::Error::Overflow) => return Err(VarintError::Overflow.into()),
        Err(leb128::read::Error::IoError(error))
            if error.kind() == io::ErrorKind::UnexpectedEof =>
        {
            return Err(VarintError::UnexpectedEnd.into());
        }
        Err(leb128::read::Error::IoError(error)) => return Err(CarError::Io(error)),
    };

    if bounded.count != varint_len(value) {
        return Err(VarintError::NotMinimal.into());
    }

    Ok((value, bounded.count))
}

/// Returns the minimal encoding of `value`.
pub fn write_varint(value: u64) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(varint_len(value));
    match leb128::write::unsigned(&mut bytes, value) {
        Ok(_) => bytes,
        Err(_) => Vec::new(),
    }
}

/// Writes the minimal encoding of `value`, returning the number of bytes
/// written.
pub fn write_varint_to<W>(writer: &mut W, value: u64) -> io::Result<usize>
where
    W: Write + ?Sized,
{
    leb128::write::unsigned(writer, value)
}

/// Counts what passes through and refuses to read beyond
/// [`MAX_VARINT_LENGTH`] bytes.
struct Bounded<'a, R: ?Sized> {
    reader: &'a mut R,
    count: usize,
    exhausted: bool,
}

impl<R: Read + ?Sized> Read for Bounded<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = MAX_VARINT_LENGTH - self.count;
        if remaining == 0 && !buf.is_empty() {
            self.exhausted = true;
            return Err(io::Error::other("varint longer than 10 bytes"));
        }

        let limit = buf.len().min(remaining);
        let read = self.reader.read(&mut buf[..limit])?;
        self.count += read;
        Ok(read)
    }
}
