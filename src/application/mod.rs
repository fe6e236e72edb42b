pub mod audit;
pub mod config;

pub use audit::{announce, run_audit, AuditOptions, AuditOutcome};
pub use config::{Config, ScanConfig};
