pub mod report;

pub use report::{AppRecord, BuildRecord, Report, StatusValue, json_schema};
