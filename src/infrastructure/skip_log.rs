use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{FileError, SkipReason};

/// 记录扫描过程中被跳过的文件
#[derive(Debug, Default)]
pub struct SkipRecorder {
    counts: BTreeMap<SkipReason, usize>,
    skipped: Vec<PathBuf>,
}

impl SkipRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一个被跳过的文件
    pub fn record(&mut self, error: &FileError) {
        *self.counts.entry(error.reason()).or_insert(0) += 1;
        self.skipped.push(error.path().to_path_buf());
    }

    /// 单个文件的警告信息
    pub fn warning(error: &FileError) -> String {
        format!("⚠️  已跳过: {}", error)
    }

    /// 按原因分类的跳过统计
    pub fn summary(&self) -> &BTreeMap<SkipReason, usize> {
        &self.counts
    }

    pub fn total(&self) -> usize {
        self.skipped.len()
    }

    pub fn has_skips(&self) -> bool {
        !self.skipped.is_empty()
    }

    pub fn skipped_paths(&self) -> impl Iterator<Item = &Path> {
        self.skipped.iter().map(PathBuf::as_path)
    }

    /// 输出跳过摘要，没有跳过的文件时不输出任何内容
    pub fn write_summary<W: Write>(&self, mut out: W) -> io::Result<()> {
        if !self.has_skips() {
            return Ok(());
        }

        writeln!(out, "\n⚠️  扫描过程中跳过了部分文件:")?;
        writeln!(out, "----------------------------")?;
        for (reason, count) in &self.counts {
            writeln!(out, "  {}: {} 个", reason.as_str(), count)?;
        }
        writeln!(out, "  总计: {} 个文件", self.total())?;

        Ok(())
    }
}
