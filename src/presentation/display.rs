use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use humansize::{format_size, BINARY};

use crate::application::AuditOutcome;
use crate::domain::aggregate::{AggregateResult, FeatureStatus};

pub const FOUND_MARKER: &str = "✅";
pub const MISSING_MARKER: &str = "❌";

/// 格式化持续时间
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, mins, secs)
    } else if mins > 0 {
        format!("{}m {}s", mins, secs)
    } else {
        format!("{}.{:03}s", secs, duration.subsec_millis())
    }
}

/// 输出扫描开始的提示行
pub fn write_banner<W: Write>(mut out: W, root: &Path) -> io::Result<()> {
    writeln!(out, "🔍 正在扫描缺失的功能: {}", root.display())
}

fn report_line(status: &FeatureStatus, verbose: bool) -> String {
    let marker = if status.found() {
        FOUND_MARKER
    } else {
        MISSING_MARKER
    };

    match status.evidence() {
        Some(evidence) if verbose => format!(
            "{} {}  ({}:{})",
            marker,
            status.id(),
            evidence.path.display(),
            evidence.line
        ),
        _ => format!("{} {}", marker, status.id()),
    }
}

/// 按功能声明顺序输出报告，每个功能一行
pub fn write_report<W: Write>(mut out: W, aggregate: &AggregateResult, verbose: bool) -> io::Result<()> {
    for status in aggregate.iter() {
        writeln!(out, "{}", report_line(status, verbose))?;
    }
    Ok(())
}

/// 扫描摘要
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSummary {
    pub files_scanned: u64,
    pub files_skipped: u64,
    pub bytes_scanned: u64,
    pub features_found: usize,
    pub features_total: usize,
    pub duration: Duration,
}

impl ScanSummary {
    pub fn from_outcome(outcome: &AuditOutcome) -> Self {
        Self {
            files_scanned: outcome.files_scanned,
            files_skipped: outcome.skips.total() as u64,
            bytes_scanned: outcome.bytes_scanned,
            features_found: outcome.aggregate.found_count(),
            features_total: outcome.aggregate.len(),
            duration: outcome.duration,
        }
    }

    pub fn write_to<W: Write>(&self, mut out: W) -> io::Result<()> {
        writeln!(out, "\n扫描摘要:")?;
        writeln!(out, "----------------------------")?;
        writeln!(out, "总用时: {}", format_duration(self.duration))?;
        writeln!(out, "扫描文件: {}", self.files_scanned)?;
        writeln!(out, "跳过文件: {}", self.files_skipped)?;
        writeln!(out, "扫描数据: {}", format_size(self.bytes_scanned, BINARY))?;
        writeln!(
            out,
            "已找到功能: {}/{}",
            self.features_found, self.features_total
        )?;
        Ok(())
    }
}
