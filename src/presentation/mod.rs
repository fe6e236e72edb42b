pub mod display;

pub use display::{write_banner, write_report, ScanSummary};
