pub mod csv_file;
pub mod synthetic;

pub use csv_file::CsvSeriesSource;
pub use synthetic::{generate_series, LoadProfile, SeriesSpec, SyntheticSource};
