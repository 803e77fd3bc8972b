//! Content fingerprints for normalized series.
//!
//! Two normalizations of the same inputs must produce byte-identical output;
//! the BLAKE3 digest over every encoded field makes that checkable and is
//! what the run manifest records per symbol.

use crate::domain::{NormalizedRow, SeriesHash};

/// BLAKE3 over dates and every encoded field, in row order.
pub fn series_hash(rows: &[NormalizedRow]) -> SeriesHash {
    let mut hasher = blake3::Hasher::new();
    for row in rows {
        hasher.update(row.date.to_string().as_bytes());
        hasher.update(&row.open.to_le_bytes());
        hasher.update(&row.high.to_le_bytes());
        hasher.update(&row.low.to_le_bytes());
        hasher.update(&row.close.to_le_bytes());
        hasher.update(&row.volume.to_le_bytes());
        hasher.update(&row.dividend.to_le_bytes());
        hasher.update(&row.split.to_le_bytes());
    }
    SeriesHash(hasher.finalize().to_hex().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(close: u32) -> NormalizedRow {
        NormalizedRow {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            open: 1,
            high: 2,
            low: 1,
            close,
            volume: 10,
            dividend: 0.0,
            split: 1.0,
        }
    }

    #[test]
    fn hash_is_stable() {
        assert_eq!(series_hash(&[row(2)]), series_hash(&[row(2)]));
        assert_eq!(series_hash(&[row(2)]).0.len(), 64);
    }

    #[test]
    fn hash_sees_every_field() {
        assert_ne!(series_hash(&[row(2)]), series_hash(&[row(1)]));
        let mut split = row(2);
        split.split = 2.0;
        assert_ne!(series_hash(&[row(2)]), series_hash(&[split]));
    }
}
