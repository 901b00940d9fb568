//! Archive header: a varint length followed by a DAG-CBOR map
//! `{roots: [Link], version: 1}`.

use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::{
    CarError, Link,
    varint::{read_varint, write_varint},
};

/// The only archive version this codec reads and writes.
pub const CAR_VERSION: u64 = 1;

/// Default upper bound on the declared header length.
pub const DEFAULT_MAX_HEADER_SIZE: u64 = 32 << 20;

/// The decoded header of an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    version: u64,
    roots: Vec<Link>,
}

#[derive(Serialize)]
struct HeaderModel<'a> {
    // Field order is the canonical DAG-CBOR key order.
    roots: &'a [Link],
    version: u64,
}

#[derive(Deserialize)]
struct HeaderData {
    roots: Option<Vec<Link>>,
    version: Option<u64>,
}

impl Header {
    /// A header for the supported version with the given roots, in order.
    ///
    /// An empty root list is allowed; whether it makes sense is up to the
    /// caller.
    pub fn new(roots: Vec<Link>) -> Self {
        Header {
            version: CAR_VERSION,
            roots,
        }
    }

    /// The archive version.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The root links, in archive order.
    pub fn roots(&self) -> &[Link] {
        &self.roots
    }

    /// Consumes the header, returning its roots.
    pub fn into_roots(self) -> Vec<Link> {
        self.roots
    }

    /// Parses the structured value of a header (without its length prefix).
    pub fn from_cbor(bytes: &[u8]) -> Result<Self, CarError> {
        let data: HeaderData = serde_ipld_dagcbor::from_slice(bytes)
            .map_err(|error| CarError::MalformedHeader(error.to_string()))?;

        let version = data
            .version
            .ok_or_else(|| CarError::MalformedHeader("missing version".into()))?;
        if version != CAR_VERSION {
            return Err(CarError::UnsupportedVersion(version));
        }

        let roots = data
            .roots
            .ok_or_else(|| CarError::MalformedHeader("missing roots".into()))?;

        Ok(Header { version, roots })
    }

    /// The structured value of this header (without its length prefix).
    pub fn to_cbor(&self) -> Result<Vec<u8>, CarError> {
        serde_ipld_dagcbor::to_vec(&HeaderModel {
            roots: &self.roots,
            version: self.version,
        })
        .map_err(|error| CarError::MalformedHeader(error.to_string()))
    }

    /// The full wire form: length prefix followed by the structured value.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CarError> {
        let body = self.to_cbor()?;
        let mut bytes = write_varint(body.len() as u64);
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    /// Reads a header from the start of `reader`, returning it along with
    /// the number of bytes consumed.
    ///
    /// Fails with [`CarError::TruncatedHeader`] if the stream ends early,
    /// [`CarError::SectionTooLarge`] if the declared length exceeds
    /// `max_size`, [`CarError::UnsupportedVersion`] for any version but
    /// [`CAR_VERSION`] and [`CarError::MalformedHeader`] if the value does
    /// not parse within its declared length.
    pub fn read<R>(reader: &mut R, max_size: u64) -> Result<(Self, u64), CarError>
    where
        R: Read + ?Sized,
    {
        let (length, prefix) =
            read_varint(reader).map_err(|error| error.or_truncated(CarError::TruncatedHeader))?;

        if length > max_size {
            return Err(CarError::SectionTooLarge {
                offset: 0,
                declared: length,
                limit: max_size,
            });
        }

        let mut body = Vec::new();
        Read::take(&mut *reader, length).read_to_end(&mut body)?;
        if (body.len() as u64) < length {
            return Err(CarError::TruncatedHeader);
        }

        let header = Header::from_cbor(&body)?;
        Ok((header, prefix as u64 + length))
    }
}

/// Encodes a header for `roots` in wire form.
pub fn encode_header(roots: &[Link]) -> Result<Vec<u8>, CarError> {
    Header::new(roots.to_vec()).to_bytes()
}
