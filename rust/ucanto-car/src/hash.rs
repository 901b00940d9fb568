//! Injectable multihash capability.
//!
//! The codec never hashes anything on its own. Callers that want to check a
//! block against its link (or compute a link for new bytes) hand a
//! [`Hashers`] registry to [`Link::verify`](crate::Link::verify) or
//! [`Prefix::sum`](crate::Prefix::sum).

use std::{collections::BTreeMap, fmt::Debug, sync::Arc};

use sha2::{Digest, Sha256, Sha512};

use crate::CarError;

/// Multihash code of the identity "hash" (digest is the input itself).
pub const IDENTITY: u64 = 0x00;
/// Multihash code of SHA2-256.
pub const SHA2_256: u64 = 0x12;
/// Multihash code of SHA2-512.
pub const SHA2_512: u64 = 0x13;
/// Multihash code of BLAKE3.
pub const BLAKE3: u64 = 0x1e;

/// A hash function addressed by its multihash code.
pub trait Multihasher: Send + Sync {
    /// The multihash code this hasher answers to.
    fn code(&self) -> u64;

    /// Computes the full-length digest of `bytes`.
    fn digest(&self, bytes: &[u8]) -> Vec<u8>;
}

/// The identity multihash.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Multihasher for Identity {
    fn code(&self) -> u64 {
        IDENTITY
    }

    fn digest(&self, bytes: &[u8]) -> Vec<u8> {
        bytes.to_vec()
    }
}

/// SHA2-256.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha2_256;

impl Multihasher for Sha2_256 {
    fn code(&self) -> u64 {
        SHA2_256
    }

    fn digest(&self, bytes: &[u8]) -> Vec<u8> {
        Sha256::digest(bytes).to_vec()
    }
}

/// SHA2-512.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha2_512;

impl Multihasher for Sha2_512 {
    fn code(&self) -> u64 {
        SHA2_512
    }

    fn digest(&self, bytes: &[u8]) -> Vec<u8> {
        Sha512::digest(bytes).to_vec()
    }
}

/// BLAKE3 with its default 32-byte output.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3;

impl Multihasher for Blake3 {
    fn code(&self) -> u64 {
        BLAKE3
    }

    fn digest(&self, bytes: &[u8]) -> Vec<u8> {
        blake3::hash(bytes).as_bytes().to_vec()
    }
}

/// A registry of [`Multihasher`]s keyed by multihash code.
///
/// [`Hashers::default`] knows identity, SHA2-256, SHA2-512 and BLAKE3.
/// Additional algorithms are added with [`Hashers::register`] without
/// touching the codec.
#[derive(Clone)]
pub struct Hashers {
    hashers: BTreeMap<u64, Arc<dyn Multihasher>>,
}

impl Hashers {
    /// A registry with no hashers at all.
    pub fn empty() -> Self {
        Self {
            hashers: BTreeMap::new(),
        }
    }

    /// Adds (or replaces) the hasher for `hasher.code()`.
    pub fn register<H>(&mut self, hasher: H) -> &mut Self
    where
        H: Multihasher + 'static,
    {
        self.hashers.insert(hasher.code(), Arc::new(hasher));
        self
    }

    /// Builder form of [`Hashers::register`].
    pub fn with<H>(mut self, hasher: H) -> Self
    where
        H: Multihasher + 'static,
    {
        self.register(hasher);
        self
    }

    /// Looks up the hasher for a multihash code.
    pub fn get(&self, code: u64) -> Option<&dyn Multihasher> {
        self.hashers.get(&code).map(|hasher| hasher.as_ref())
    }

    /// Whether a hasher is registered for `code`.
    pub fn supports(&self, code: u64) -> bool {
        self.hashers.contains_key(&code)
    }

    /// Computes the full-length digest of `bytes` under `code`.
    ///
    /// Fails with [`CarError::UnsupportedHashAlgorithm`] when no hasher is
    /// registered for `code`.
    pub fn digest(&self, code: u64, bytes: &[u8]) -> Result<Vec<u8>, CarError> {
        self.get(code)
            .map(|hasher| hasher.digest(bytes))
            .ok_or(CarError::UnsupportedHashAlgorithm(code))
    }
}

impl Default for Hashers {
    fn default() -> Self {
        Self::empty()
            .with(Identity)
            .with(Sha2_256)
            .with(Sha2_512)
            .with(Blake3)
    }
}

impl Debug for Hashers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set()
            .entries(self.hashers.keys().map(|code| format!("{code:#x}")))
            .finish()
    }
}
