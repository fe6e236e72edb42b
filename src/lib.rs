// 分层架构模块
pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;
pub mod error;

// 重新导出主要类型
pub use domain::{AggregateResult, FeatureSet, FeatureSpec, Scanner, SuffixFilter, WalkOptions};
pub use application::{announce, run_audit, AuditOptions, AuditOutcome, Config};
pub use infrastructure::{Logger, LoggerTrait, SkipRecorder};
pub use presentation::{write_banner, write_report, ScanSummary};
pub use error::{FileError, ScanError, SkipReason};
