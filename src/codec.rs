//! Codec Module
//!
//! JSON encoding used for size accounting, typed retrieval and persistence.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{CacheError, Result};

// == Encoded ==
/// A value in stored form plus its reversible JSON token.
#[derive(Debug, Clone, PartialEq)]
pub struct Encoded {
    /// Structured form kept in the cache
    pub value: Value,
    /// JSON text of `value`
    pub token: String,
}

impl Encoded {
    /// Serialized size in bytes, as counted against the size budget.
    pub fn size(&self) -> u64 {
        self.token.len() as u64
    }
}

// == JSON Codec ==
/// Stateless serde_json codec. Nulls are encoded as `null` and accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl JsonCodec {
    /// Encodes any serializable value.
    pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Encoded> {
        let value = serde_json::to_value(value)?;
        let token = serde_json::to_string(&value)?;
        Ok(Encoded { value, token })
    }

    /// Parses a persisted token back into stored form.
    pub fn parse(token: &str) -> Result<Encoded> {
        let value: Value = serde_json::from_str(token)?;
        // Re-render so the counted size matches what `encode` would produce.
        let token = serde_json::to_string(&value)?;
        Ok(Encoded { value, token })
    }

    /// Renders a stored value as its token.
    pub fn token(value: &Value) -> Result<String> {
        Ok(serde_json::to_string(value)?)
    }

    /// Views a stored value as `T`.
    pub fn decode<T: DeserializeOwned>(key: &str, value: &Value) -> Result<T> {
        T::deserialize(value).map_err(|e| CacheError::TypeMismatch {
            key: key.to_string(),
            expected: std::any::type_name::<T>(),
            reason: e.to_string(),
        })
    }
}
