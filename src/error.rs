//! Construction and decoding errors.

use std::io;

use thiserror::Error;

/// Errors returned by construction and decoding. Lookup never fails.
#[derive(Error, Debug)]
pub enum Error {
    /// No keys were provided to a constructor.
    #[error("no keys provided")]
    EmptyKeys,

    /// Construction reached the level limit without placing every key.
    /// This is almost certain to mean the input contained duplicate keys,
    /// although a pathological key set combined with a small `gamma` can
    /// also trigger it.
    #[error("cannot find minimal perfect hash after {0} levels")]
    TooManyLevels(u32),

    /// The requested build options cannot be combined.
    #[error("incompatible options: {0}")]
    IncompatibleOptions(&'static str),

    /// Serialized input ended before the declared structure was read.
    #[error("serialized data is truncated")]
    DecodeTruncated,

    /// A count field in the serialized input is outside its valid range.
    #[error("invalid {field} in serialized data: {value}")]
    DecodeInvalidHeader {
        field: &'static str,
        value: u64,
    },

    /// An I/O failure other than premature end of input.
    #[error(transparent)]
    Io(io::Error),
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Error::DecodeTruncated
        } else {
            Error::Io(e)
        }
    }
}
