//! Raw price sources

pub mod csv_source;
pub mod provider;
pub mod synthetic;

pub use csv_source::CsvProvider;
pub use provider::{DataError, DataProvider, DataSource, FetchResult};
pub use synthetic::SyntheticProvider;
