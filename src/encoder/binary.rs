//! Binary encoder
//!
//! Compact encoding via bincode. The format is not self-describing: bytes
//! only decode into the same shape they were written from.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CodecError;

use super::Encoder;

/// Encodes values with bincode
#[derive(Debug, Default, Clone, Copy)]
pub struct BincodeEncoder;

impl BincodeEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Encoder for BincodeEncoder {
    fn encode<T>(&self, value: &T) -> Result<Vec<u8>, CodecError>
    where
        T: Serialize + ?Sized,
    {
        Ok(bincode::serialize(value)?)
    }

    fn decode<T>(&self, data: &[u8]) -> Result<T, CodecError>
    where
        T: DeserializeOwned,
    {
        Ok(bincode::deserialize(data)?)
    }
}
