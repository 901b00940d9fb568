//! Content-addressed archives (CAR) for UCAN tokens, proofs and receipts.
//!
//! An archive bundles a graph of hash-identified blocks into one byte
//! stream, together with the links of its root blocks:
//!
//! ```text
//! varint(len) DAG-CBOR {roots: [link, ..], version: 1}    header
//! varint(len) link payload                                frame
//! varint(len) link payload                                frame
//! ...
//! ```
//!
//! Decoding is lazy and single-pass: [`decode`] reads the header and hands
//! back a [`Blocks`] iterator that yields each frame as a [`Block`],
//! including the byte [`Span`] of its payload in the original stream.
//! Payloads are never checked against their links during decoding; that is
//! an explicit, separate step ([`Block::verify`]) driven by a caller
//! supplied [`Hashers`] registry.
//!
//! Encoding is the exact inverse. Re-encoding the roots and blocks of a
//! decoded archive, in the same order, reproduces the original bytes.
//!
//! # Example
//!
//! ```rust
//! use ucanto_car::{Hashers, Prefix, decode, to_vec, hash::SHA2_256, link::RAW};
//!
//! # fn main() -> Result<(), ucanto_car::CarError> {
//! let hashers = Hashers::default();
//! let link = Prefix::v1(RAW, SHA2_256).sum(b"hello", &hashers)?;
//!
//! let bytes = to_vec(&[link], [(link, b"hello".to_vec())])?;
//!
//! let (roots, blocks) = decode(bytes.as_slice())?;
//! assert_eq!(roots, vec![link]);
//!
//! for block in blocks {
//!     let block = block?;
//!     assert!(block.verify(&hashers)?);
//!     assert_eq!(&bytes[block.span().range()], b"hello");
//! }
//! # Ok(())
//! # }
//! ```

mod error;
pub use error::*;

pub mod hash;
pub use hash::{Hashers, Multihasher};

pub mod varint;

pub mod link;
pub use link::{Link, Prefix};

mod header;
pub use header::*;

mod block;
pub use block::{AsBlock, Block, DEFAULT_MAX_BLOCK_SIZE, Span};

mod decode;
pub use decode::*;

mod encode;
pub use encode::*;

pub use ipld_core::cid::{Cid, Version};
