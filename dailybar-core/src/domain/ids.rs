use serde::{Deserialize, Serialize};
use std::fmt;

/// Deterministic content hash of a normalized series (BLAKE3, hex).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesHash(pub String);

impl SeriesHash {
    pub fn from_hash(hash: &str) -> Self {
        Self(hash.to_string())
    }

    /// First 12 hex characters, for log lines.
    pub fn short(&self) -> &str {
        let end = self.0.len().min(12);
        &self.0[..end]
    }
}

impl fmt::Display for SeriesHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_truncates_long_hashes() {
        let h = SeriesHash::from_hash("0123456789abcdef0123");
        assert_eq!(h.short(), "0123456789ab");
    }

    #[test]
    fn short_keeps_short_hashes() {
        let h = SeriesHash::from_hash("abc");
        assert_eq!(h.short(), "abc");
        assert_eq!(h.to_string(), "abc");
    }
}
