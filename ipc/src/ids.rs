//! Correlation IDs and workspace hashes.
//!
//! Correlation IDs are lexicographically-sortable 26-char Crockford-base32
//! tokens: a 48-bit millisecond timestamp prefix followed by 80 bits of
//! randomness, the same layout ULID uses. We don't depend on the `ulid`
//! crate for this — it's a small, self-contained encoder and the rest of
//! the pipeline has no other use for that dependency.

use rand::RngCore;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

const CROCKFORD_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Sortable 26-character correlation ID, generated once by the Hook and
/// propagated unchanged through every subsequent artifact and event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CorrelationId([u8; 26]);

impl CorrelationId {
    /// Generates a fresh correlation ID from the current wall clock.
    pub fn generate() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let mut rng = rand::thread_rng();
        let mut entropy = [0u8; 10];
        rng.fill_bytes(&mut entropy);
        Self::from_parts(millis, &entropy)
    }

    fn from_parts(millis_u64: u64, entropy: &[u8; 10]) -> Self {
        // 48 bits of timestamp + 80 bits of entropy = 128 bits = 26 base32 chars.
        let mut bits: u128 = (millis_u64 as u128 & 0xFFFF_FFFF_FFFF) << 80;
        let mut entropy_bits: u128 = 0;
        for &b in entropy {
            entropy_bits = (entropy_bits << 8) | b as u128;
        }
        bits |= entropy_bits;

        let mut out = [0u8; 26];
        for (i, slot) in out.iter_mut().enumerate() {
            let shift = 125 - i * 5;
            let idx = ((bits >> shift) & 0x1F) as usize;
            *slot = CROCKFORD_ALPHABET[idx];
        }
        CorrelationId(out)
    }

    pub fn as_str(&self) -> &str {
        // Safe: every byte comes from CROCKFORD_ALPHABET, which is pure ASCII.
        std::str::from_utf8(&self.0).expect("crockford alphabet is ascii")
    }

    pub fn parse(s: &str) -> Option<Self> {
        if s.len() != 26 || !s.bytes().all(|b| CROCKFORD_ALPHABET.contains(&b)) {
            return None;
        }
        let mut out = [0u8; 26];
        out.copy_from_slice(s.as_bytes());
        Some(CorrelationId(out))
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for CorrelationId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for CorrelationId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        CorrelationId::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("not a valid correlation id: {s}")))
    }
}

/// An 8-character hex prefix of a SHA-256 hash over the canonicalized
/// absolute workspace path. Filename-safe and human-glanceable, not a
/// security boundary — collisions are tolerated because the workspace path
/// is always also carried in the JSON payload.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct WorkspaceHash(String);

impl WorkspaceHash {
    pub fn of(workspace_path: &Path) -> Self {
        let canonical = workspace_path
            .canonicalize()
            .unwrap_or_else(|_| workspace_path.to_path_buf());
        let mut hasher = Sha256::new();
        hasher.update(canonical.to_string_lossy().as_bytes());
        let digest = hasher.finalize();
        WorkspaceHash(hex::encode(&digest[..4]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WorkspaceHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correlation_ids_are_26_chars_and_sortable() {
        let a = CorrelationId::generate();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = CorrelationId::generate();
        assert_eq!(a.as_str().len(), 26);
        assert!(a.as_str() < b.as_str(), "{} should sort before {}", a, b);
    }

    #[test]
    fn correlation_id_roundtrips_through_parse() {
        let a = CorrelationId::generate();
        let parsed = CorrelationId::parse(a.as_str()).unwrap();
        assert_eq!(a, parsed);
    }

    #[test]
    fn parse_rejects_wrong_length_and_bad_alphabet() {
        assert!(CorrelationId::parse("too-short").is_none());
        assert!(CorrelationId::parse(&"I".repeat(26)).is_none()); // I excluded from alphabet
    }

    #[test]
    fn workspace_hash_is_stable_for_same_path() {
        let dir = tempfile::tempdir().unwrap();
        let a = WorkspaceHash::of(dir.path());
        let b = WorkspaceHash::of(dir.path());
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 8);
    }

    #[test]
    fn workspace_hash_differs_for_different_paths() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        assert_ne!(WorkspaceHash::of(a.path()), WorkspaceHash::of(b.path()));
    }
}
