//! HMAC signatures for URLs served by the local backend.
//!
//! Signature = base64url(HMAC-SHA256(secret, key || "\n" || expires_unix)).

use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::traits::{StorageError, StorageResult};

type HmacSha256 = Hmac<Sha256>;

pub(crate) fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

pub(crate) fn expiry_after(expires_in: Duration) -> u64 {
    now_unix().saturating_add(expires_in.as_secs())
}

fn mac_for(secret: &[u8], storage_key: &str, expires_at: u64) -> StorageResult<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| StorageError::ConfigError(format!("Invalid signing secret: {}", e)))?;
    mac.update(storage_key.as_bytes());
    mac.update(b"\n");
    mac.update(expires_at.to_string().as_bytes());
    Ok(mac)
}

pub(crate) fn sign(secret: &[u8], storage_key: &str, expires_at: u64) -> StorageResult<String> {
    let tag = mac_for(secret, storage_key, expires_at)?
        .finalize()
        .into_bytes();
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(tag))
}

/// Check `signature` for (`storage_key`, `expires_at`) and that `now` is not past expiry.
pub(crate) fn verify(
    secret: &[u8],
    storage_key: &str,
    expires_at: u64,
    signature: &str,
    now: u64,
) -> StorageResult<()> {
    let tag = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| StorageError::InvalidSignature("malformed signature".to_string()))?;

    mac_for(secret, storage_key, expires_at)?
        .verify_slice(&tag)
        .map_err(|_| StorageError::InvalidSignature("signature mismatch".to_string()))?;

    if now > expires_at {
        return Err(StorageError::Expired);
    }
    Ok(())
}
