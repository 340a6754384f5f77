//! Dedup key derivation

use sha2::{Digest, Sha256};
use transaction_core::IdempotencyKey;

/// Store key for an idempotency key: `<prefix>:<hex sha256>`
///
/// The raw client key never reaches the store.
pub fn dedup_key(prefix: &str, idempotency_key: &IdempotencyKey) -> String {
    let digest = Sha256::digest(idempotency_key.as_str().as_bytes());
    format!("{}:{}", prefix, hex::encode(digest))
}
