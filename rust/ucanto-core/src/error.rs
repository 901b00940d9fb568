use thiserror::Error;
use ucanto_car::{CarError, Link};

/// Errors produced while encoding or decoding data-model values.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A value could not be encoded as DAG-CBOR.
    #[error("Failed to encode: {0}")]
    Encode(String),

    /// Bytes could not be decoded into the expected value.
    #[error("Failed to decode: {0}")]
    Decode(String),

    /// A block's bytes do not hash to the link it was framed with.
    #[error("Block does not hash to {0}")]
    Mismatch(Link),

    /// Computing or checking a link failed.
    #[error(transparent)]
    Car(#[from] CarError),
}
