//! Fingerprints used to tell whether two sweep reports are comparable.

use crate::types::DailyObservation;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::warn;

/// Compute SHA256 hash of arbitrary bytes.
pub fn compute_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Compute SHA256 checksum of a file.
pub fn compute_file_checksum(path: impl AsRef<Path>) -> std::io::Result<String> {
    let data = std::fs::read(path.as_ref())?;
    Ok(compute_hash(&data))
}

/// Hash any serializable configuration through its JSON form.
pub fn compute_config_hash<T: Serialize>(config: &T) -> String {
    match serde_json::to_vec(config) {
        Ok(bytes) => compute_hash(&bytes),
        Err(e) => {
            warn!("Failed to serialize config for hashing: {}", e);
            String::new()
        }
    }
}

/// Hash an observation series by its exact values.
///
/// Prices are hashed by bit pattern so that two series hash equal exactly
/// when simulations over them are guaranteed to agree.
pub fn observations_hash(observations: &[DailyObservation]) -> String {
    let mut hasher = Sha256::new();
    for obs in observations {
        hasher.update(obs.date.to_string().as_bytes());
        hasher.update(obs.close_price.to_bits().to_le_bytes());
        hasher.update([obs.fgi_value]);
    }
    format!("{:x}", hasher.finalize())
}
