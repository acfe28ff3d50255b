// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Wire encoding for the database payload.
//!
//! etcd values are stored as text, so the raw file bytes travel as lowercase
//! hex. Decoding is strict: odd lengths and non-hex characters are rejected
//! instead of producing a truncated file.

use crate::error::{AgentError, Result};
use sha2::{Digest, Sha256};

/// Encode raw file bytes for the store.
pub fn encode(payload: &[u8]) -> String {
    hex::encode(payload)
}

/// Decode a stored value back into raw bytes.
///
/// `key` is only used to give the error some context.
pub fn decode(key: &str, value: &str) -> Result<Vec<u8>> {
    hex::decode(value).map_err(|e| AgentError::Decode {
        key: key.to_string(),
        message: e.to_string(),
    })
}

/// Short content fingerprint for log lines (first 8 bytes of SHA-256, hex).
pub fn fingerprint(payload: &[u8]) -> String {
    let digest = Sha256::digest(payload);
    hex::encode(&digest[..8])
}
