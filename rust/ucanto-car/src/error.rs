use thiserror::Error;

/// Reasons a variable-length integer could not be read.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarintError {
    /// The input ended before a group without the continuation bit.
    #[error("input ended before the final group")]
    UnexpectedEnd,

    /// More groups than a 64-bit value can hold.
    #[error("value does not fit in 64 bits")]
    Overflow,

    /// The encoding carries a redundant trailing zero group.
    #[error("value is not minimally encoded")]
    NotMinimal,
}

/// Errors that can occur while encoding, decoding or verifying an archive.
///
/// None of these are recovered from internally. Once a decode error is
/// returned, the underlying stream should be considered unusable from that
/// point on; blocks yielded before the error remain valid.
#[derive(Error, Debug)]
pub enum CarError {
    /// A length prefix or link component was not a valid varint.
    #[error("Malformed varint: {0}")]
    MalformedVarint(VarintError),

    /// A link could not be parsed.
    #[error("Malformed link: {0}")]
    MalformedLink(String),

    /// A link declared more digest bytes than were available.
    #[error("Truncated link: expected {expected} digest bytes, found {found}")]
    TruncatedLink {
        /// Digest length declared by the link
        expected: u64,
        /// Digest bytes actually available
        found: u64,
    },

    /// The header's structured value could not be parsed.
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    /// The stream ended before the declared header length.
    #[error("Truncated header")]
    TruncatedHeader,

    /// The header declares a version other than the supported one.
    #[error("Unsupported archive version: {0}")]
    UnsupportedVersion(u64),

    /// A frame's link could not be decoded.
    #[error("Malformed block at offset {offset}: {source}")]
    MalformedBlock {
        /// Offset of the frame's length prefix
        offset: u64,
        /// The link failure inside the frame
        #[source]
        source: Box<CarError>,
    },

    /// The stream ended inside a frame.
    #[error("Truncated block at offset {offset}")]
    TruncatedBlock {
        /// Offset of the frame's length prefix
        offset: u64,
    },

    /// A header or frame declares a length above the configured limit.
    #[error("Section at offset {offset} declares {declared} bytes, limit is {limit}")]
    SectionTooLarge {
        /// Offset of the section's length prefix
        offset: u64,
        /// Declared length
        declared: u64,
        /// Configured limit
        limit: u64,
    },

    /// No hasher is registered for the multihash code.
    #[error("Unsupported hash algorithm: {0:#x}")]
    UnsupportedHashAlgorithm(u64),

    /// An underlying read or write failed.
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

impl From<VarintError> for CarError {
    fn from(value: VarintError) -> Self {
        CarError::MalformedVarint(value)
    }
}

impl CarError {
    /// Replaces a premature end of input with the given truncation error,
    /// leaving every other error untouched.
    pub(crate) fn or_truncated(self, truncated: CarError) -> CarError {
        match self {
            CarError::MalformedVarint(VarintError::UnexpectedEnd) => truncated,
            CarError::Io(error) if error.kind() == std::io::ErrorKind::UnexpectedEof => truncated,
            other => other,
        }
    }
}
