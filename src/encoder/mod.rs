//! Encoder Module
//!
//! Value marshaling strategies used by [`Storage`](crate::Storage).
//!
//! ## Responsibilities
//! - Turn any `Serialize` value into bytes for a backend
//! - Turn stored bytes back into the caller's target type
//!
//! ## Implementations
//! - [`JsonEncoder`]: textual and self-describing (default)
//! - [`BincodeEncoder`]: compact binary, not compatible with JSON data
//!
//! Swapping encoders over a store that already holds entries written by a
//! different encoder is unsupported and will usually fail to decode.

mod binary;
mod json;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CodecError;

pub use binary::BincodeEncoder;
pub use json::JsonEncoder;

/// Converts typed values to bytes and back
pub trait Encoder {
    /// Encode a value. Must accept the empty forms (`()`, `None`).
    fn encode<T>(&self, value: &T) -> Result<Vec<u8>, CodecError>
    where
        T: Serialize + ?Sized;

    /// Decode bytes into a value of type `T`
    fn decode<T>(&self, data: &[u8]) -> Result<T, CodecError>
    where
        T: DeserializeOwned;
}
