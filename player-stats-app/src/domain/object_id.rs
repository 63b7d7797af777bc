use std::{
    str::FromStr,
    sync::{
        LazyLock,
        atomic::{AtomicU32, Ordering},
    },
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

const OBJECT_ID_LEN: usize = 12;

const COUNTER_MASK: u32 = 0x00ff_ffff;

static PROCESS_UNIQUE: LazyLock<[u8; 5]> = LazyLock::new(|| rand::random());

static COUNTER: LazyLock<AtomicU32> =
    LazyLock::new(|| AtomicU32::new(rand::random::<u32>() & COUNTER_MASK));

/// 12-byte record identifier, written as 24 hex characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; OBJECT_ID_LEN]);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not a valid ObjectId, it must be a 12-byte input or a 24-character hex string.")]
pub struct InvalidObjectId(pub String);

impl ObjectId {
    /// Generates a fresh id: big-endian seconds, process bytes, then a wrapping counter.
    pub fn new() -> Self {
        let timestamp = chrono::Utc::now().timestamp() as u32;
        let counter = COUNTER.fetch_add(1, Ordering::Relaxed) & COUNTER_MASK;

        let mut bytes = [0u8; OBJECT_ID_LEN];
        bytes[..4].copy_from_slice(&timestamp.to_be_bytes());
        bytes[4..9].copy_from_slice(&*PROCESS_UNIQUE);
        bytes[9..].copy_from_slice(&counter.to_be_bytes()[1..]);
        ObjectId(bytes)
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    pub fn is_valid(value: &str) -> bool {
        value.parse::<ObjectId>().is_ok()
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for ObjectId {
    type Err = InvalidObjectId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidObjectId(s.to_string());
        if s.len() != OBJECT_ID_LEN * 2 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let mut bytes = [0u8; OBJECT_ID_LEN];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
        }
        Ok(ObjectId(bytes))
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let id: ObjectId = "5b0f1c0b9a3e4b2d8c7f6e5d".parse().unwrap();
        assert_eq!(id.to_string(), "5b0f1c0b9a3e4b2d8c7f6e5d");

        let upper: ObjectId = "5B0F1C0B9A3E4B2D8C7F6E5D".parse().unwrap();
        assert_eq!(upper, id);
    }

    #[test]
    fn test_rejects_malformed_ids() {
        assert!("INVALID_OBJECT_ID".parse::<ObjectId>().is_err());
        assert!("".parse::<ObjectId>().is_err());
        assert!("5b0f1c0b9a3e4b2d8c7f6e5".parse::<ObjectId>().is_err());
        assert!("5b0f1c0b9a3e4b2d8c7f6e5d0".parse::<ObjectId>().is_err());
        assert!("zb0f1c0b9a3e4b2d8c7f6e5d".parse::<ObjectId>().is_err());
        // multi-byte chars must not slip past the length check
        assert!("5b0f1c0b9a3e4b2d8c7f6eé".parse::<ObjectId>().is_err());
    }

    #[test]
    fn test_new_ids_are_unique_and_valid() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        assert_ne!(a, b);
        assert!(ObjectId::is_valid(&a.to_hex()));
        assert_eq!(a.to_hex().parse::<ObjectId>().unwrap(), a);
    }

    #[test]
    fn test_serde_uses_hex_string() {
        let id: ObjectId = "5b0f1c0b9a3e4b2d8c7f6e5d".parse().unwrap();
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::json!("5b0f1c0b9a3e4b2d8c7f6e5d"));

        let back: ObjectId = serde_json::from_value(json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_value::<ObjectId>(serde_json::json!("nope")).is_err());
    }
}
