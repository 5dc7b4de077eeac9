pub mod csv_export;
pub mod json_report;

pub use csv_export::CsvObservationSink;
pub use json_report::{AnomalyPoint, JsonReportSink, WasteReport};
