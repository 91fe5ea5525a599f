//! Error type and Return values used by the Serialization.

use core::fmt::Display;

use serde::ser;

/// Represents all possible errors that can happen during Serialization.
///
/// Note that custom errors using [ser::Error::custom()] are not supported.
#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    /// The value contains a type that has no static 32-byte-slot
    /// representation.
    ///
    /// Settlement digests only ever contain unsigned integers, addresses and
    /// fixed-size byte arrays. Anything with a dynamic or ambiguous layout
    /// (sequences, maps, strings, enums, floats) is rejected so that two
    /// different values can never encode to the same byte string.
    TypeNotRepresentable(&'static str),
    /// [serde::Serializer::serialize_bytes] was called with something other
    /// than a full 32-byte slot.
    InvalidSlotLength(usize),
}

impl ser::Error for Error {
    fn custom<T>(_: T) -> Self
    where
        T: core::fmt::Display,
    {
        unimplemented!()
    }
}

impl ser::StdError for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::TypeNotRepresentable(type_name) => {
                f.write_str("type is not representable in static abi encoding: ")?;
                f.write_str(type_name)
            }
            Error::InvalidSlotLength(len) => {
                f.write_fmt(format_args!("expected a 32 byte slot, got {len} bytes"))
            }
        }
    }
}

/// Alias for `Result` using the [Error] returned by the Serializer.
pub type Result<T> = core::result::Result<T, Error>;
