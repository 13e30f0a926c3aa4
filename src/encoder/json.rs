//! JSON encoder
//!
//! Default encoder. Values are stored as JSON text, so no schema is needed
//! up front and stored data stays readable from the CLI.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CodecError;

use super::Encoder;

/// Encodes values as JSON (serde_json)
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonEncoder;

impl JsonEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Encoder for JsonEncoder {
    fn encode<T>(&self, value: &T) -> Result<Vec<u8>, CodecError>
    where
        T: Serialize + ?Sized,
    {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode<T>(&self, data: &[u8]) -> Result<T, CodecError>
    where
        T: DeserializeOwned,
    {
        Ok(serde_json::from_slice(data)?)
    }
}
