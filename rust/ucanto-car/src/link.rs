//! Content identifiers.
//!
//! A [`Link`] names a block by the hash of its bytes. On the wire it is a
//! CID:
//!
//! ```text
//! version 1:  varint(1) varint(codec) varint(multihash code) varint(digest length) digest
//! version 0:  0x12 0x20 <32-byte sha2-256 digest>          (codec is implicitly dag-pb)
//! ```

use std::{
    fmt::{Debug, Display},
    io::{self, Read, Write},
    str::FromStr,
};

use ipld_core::cid::{Cid, Version, multihash::Multihash};
use serde::{Deserialize, Serialize};

use crate::{
    CarError, Hashers,
    hash::{IDENTITY, SHA2_256},
    varint::read_varint,
};

/// Multicodec code for raw bytes.
pub const RAW: u64 = 0x55;
/// Multicodec code for DAG-PB.
pub const DAG_PB: u64 = 0x70;
/// Multicodec code for DAG-CBOR.
pub const DAG_CBOR: u64 = 0x71;

/// Largest digest a link can carry.
pub const MAX_DIGEST_LENGTH: u64 = 64;

const V0_DIGEST_LENGTH: u64 = 32;

/// An immutable content identifier: codec, multihash code and digest.
///
/// Links are plain values. Equality, ordering and hashing are by content.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Link(Cid);

impl Link {
    /// Creates a version 1 link from its three components.
    pub fn new(codec: u64, multihash_code: u64, digest: &[u8]) -> Result<Self, CarError> {
        Ok(Link(Cid::new_v1(codec, wrap(multihash_code, digest)?)))
    }

    /// Reads one link from `reader`, returning it with the number of bytes
    /// consumed.
    ///
    /// Fails with [`CarError::MalformedLink`] if any varint component is
    /// malformed or the version is not supported, and with
    /// [`CarError::TruncatedLink`] if fewer digest bytes are available than
    /// declared.
    pub fn read<R>(reader: &mut R) -> Result<(Self, usize), CarError>
    where
        R: Read + ?Sized,
    {
        let (version, mut consumed) = read_component(reader, "version")?;

        // A version 0 link is a bare sha2-256 multihash.
        if version == SHA2_256 {
            let (length, read) = read_component(reader, "digest length")?;
            consumed += read;
            if length != V0_DIGEST_LENGTH {
                return Err(CarError::MalformedLink(format!(
                    "version 0 link must carry a {V0_DIGEST_LENGTH}-byte digest, found {length}"
                )));
            }
            let digest = read_digest(reader, length)?;
            consumed += digest.len();

            let cid = Cid::new_v0(wrap(SHA2_256, &digest)?)
                .map_err(|error| CarError::MalformedLink(error.to_string()))?;
            return Ok((Link(cid), consumed));
        }

        if version != 1 {
            return Err(CarError::MalformedLink(format!(
                "unsupported link version {version}"
            )));
        }

        let (codec, read) = read_component(reader, "codec")?;
        consumed += read;
        let (multihash_code, read) = read_component(reader, "multihash code")?;
        consumed += read;
        let (length, read) = read_component(reader, "digest length")?;
        consumed += read;

        if length > MAX_DIGEST_LENGTH {
            return Err(CarError::MalformedLink(format!(
                "digest length {length} exceeds {MAX_DIGEST_LENGTH}"
            )));
        }

        let digest = read_digest(reader, length)?;
        consumed += digest.len();

        Ok((Link::new(codec, multihash_code, &digest)?, consumed))
    }

    /// Decodes a link from the front of `bytes`, returning it with the
    /// number of bytes it occupied.
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize), CarError> {
        Link::read(&mut &bytes[..])
    }

    /// The wire encoding of this link.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_bytes()
    }

    /// Writes the wire encoding of this link, returning the bytes written.
    pub fn write_to<W>(&self, writer: &mut W) -> io::Result<usize>
    where
        W: Write + ?Sized,
    {
        let bytes = self.to_bytes();
        writer.write_all(&bytes)?;
        Ok(bytes.len())
    }

    /// Length of the wire encoding.
    pub fn encoded_len(&self) -> usize {
        self.0.encoded_len()
    }

    /// CID version: 0 or 1.
    pub fn version(&self) -> u64 {
        self.0.version().into()
    }

    /// Multicodec code of the content this link points to.
    pub fn codec(&self) -> u64 {
        self.0.codec()
    }

    /// Multihash code of the digest.
    pub fn multihash_code(&self) -> u64 {
        self.0.hash().code()
    }

    /// The raw digest bytes.
    pub fn digest(&self) -> &[u8] {
        self.0.hash().digest()
    }

    /// Everything about this link except the digest itself.
    pub fn prefix(&self) -> Prefix {
        Prefix {
            version: self.0.version(),
            codec: self.codec(),
            multihash_code: self.multihash_code(),
            digest_length: Some(self.digest().len()),
        }
    }

    /// Checks that `payload` hashes to this link's digest.
    ///
    /// A truncated digest matches when it is a prefix of the recomputed
    /// one, but an identity digest must equal the payload exactly and an
    /// empty digest never matches anything else. Returns `Ok(false)` on
    /// mismatch. Fails only with [`CarError::UnsupportedHashAlgorithm`] when
    /// `hashers` has nothing registered for this link's multihash code.
    pub fn verify(&self, payload: &[u8], hashers: &Hashers) -> Result<bool, CarError> {
        let expected = self.digest();
        let digest = hashers.digest(self.multihash_code(), payload)?;

        if self.multihash_code() == IDENTITY {
            return Ok(digest == expected);
        }
        if expected.is_empty() {
            return Ok(false);
        }

        Ok(digest.get(..expected.len()) == Some(expected))
    }

    /// The underlying CID.
    pub fn as_cid(&self) -> &Cid {
        &self.0
    }
}

impl From<Cid> for Link {
    fn from(value: Cid) -> Self {
        Link(value)
    }
}

impl From<Link> for Cid {
    fn from(value: Link) -> Self {
        value.0
    }
}

impl Display for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Debug for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Link").field(&self.0.to_string()).finish()
    }
}

impl FromStr for Link {
    type Err = CarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Cid::try_from(s)
            .map(Link)
            .map_err(|error| CarError::MalformedLink(error.to_string()))
    }
}

/// The shape of a link without its digest: what is needed to compute the
/// link of some bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Prefix {
    /// CID version
    pub version: Version,
    /// Multicodec code of the content
    pub codec: u64,
    /// Multihash code of the digest
    pub multihash_code: u64,
    /// Digest length; `None` keeps the hasher's full output
    pub digest_length: Option<usize>,
}

impl Prefix {
    /// A version 1 prefix with full-length digests.
    pub const fn v1(codec: u64, multihash_code: u64) -> Self {
        Prefix {
            version: Version::V1,
            codec,
            multihash_code,
            digest_length: None,
        }
    }

    /// The only version 0 prefix: dag-pb over sha2-256.
    pub const fn v0() -> Self {
        Prefix {
            version: Version::V0,
            codec: DAG_PB,
            multihash_code: SHA2_256,
            digest_length: Some(V0_DIGEST_LENGTH as usize),
        }
    }

    /// Computes the link `bytes` would have under this prefix.
    ///
    /// The digest is truncated to the prefix's digest length. A digest
    /// length longer than the hasher's output is [`CarError::MalformedLink`].
    pub fn sum(&self, bytes: &[u8], hashers: &Hashers) -> Result<Link, CarError> {
        let mut digest = hashers.digest(self.multihash_code, bytes)?;

        if let Some(length) = self.digest_length {
            if self.multihash_code == IDENTITY && length != digest.len() {
                return Err(CarError::MalformedLink(format!(
                    "identity digest length {length} differs from the {}-byte payload",
                    digest.len()
                )));
            }
            if length == 0 && self.multihash_code != IDENTITY {
                return Err(CarError::MalformedLink(format!(
                    "digest of {:#x} cannot be truncated to nothing",
                    self.multihash_code
                )));
            }
            if length > digest.len() {
                return Err(CarError::MalformedLink(format!(
                    "digest length {length} exceeds the {} bytes produced by {:#x}",
                    digest.len(),
                    self.multihash_code
                )));
            }
            digest.truncate(length);
        }

        let hash = wrap(self.multihash_code, &digest)?;
        let cid = match self.version {
            Version::V0 => {
                Cid::new_v0(hash).map_err(|error| CarError::MalformedLink(error.to_string()))?
            }
            Version::V1 => Cid::new_v1(self.codec, hash),
        };

        Ok(Link(cid))
    }
}

fn wrap(code: u64, digest: &[u8]) -> Result<Multihash<64>, CarError> {
    Multihash::wrap(code, digest).map_err(|error| CarError::MalformedLink(error.to_string()))
}

fn read_component<R>(reader: &mut R, component: &str) -> Result<(u64, usize), CarError>
where
    R: Read + ?Sized,
{
    read_varint(reader).map_err(|error| match error {
        CarError::Io(error) => CarError::Io(error),
        error => CarError::MalformedLink(format!("invalid {component}: {error}")),
    })
}

fn read_digest<R>(reader: &mut R, length: u64) -> Result<Vec<u8>, CarError>
where
    R: Read + ?Sized,
{
    let mut digest = Vec::with_capacity(length as usize);
    Read::take(&mut *reader, length).read_to_end(&mut digest)?;

    if (digest.len() as u64) < length {
        return Err(CarError::TruncatedLink {
            expected: length,
            found: digest.len() as u64,
        });
    }

    Ok(digest)
}
