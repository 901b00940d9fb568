//! Data model for the values that travel inside UCAN archives.
//!
//! The archive codec in [`ucanto_car`] moves opaque bytes. This crate gives
//! those bytes meaning on either side of it:
//!
//! - [`Outcome`] is the two-armed result of an invocation (`{ok}` or
//!   `{error}`), with [`Failure`] as the conventional error arm.
//! - [`Transaction`] pairs an outcome with the [`Effects`] (forked and
//!   joined tasks) a receipt reports.
//! - [`Capability`] and [`Payload`] describe what a token grants.
//!
//! Every type here serializes with `serde`, and [`Payload::to_block`] turns
//! a payload into a DAG-CBOR block ready to be written into an archive.

mod error;
pub use error::*;

pub mod result;
pub use result::Outcome;

pub mod failure;
pub use failure::{AsFailure, Failure, failure};

pub mod transaction;
pub use transaction::{Effects, Transaction};

pub mod capability;
pub use capability::{Ability, Capability, Resource};

pub mod payload;
pub use payload::Payload;

pub use ucanto_car::Link;
