//! Domain types for dailybar

pub mod ids;
pub mod row;

pub use ids::SeriesHash;
pub use row::{NormalizedRow, RawPriceRow, NORMALIZED_COLUMNS};
