use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;

/// 日志记录器trait
pub trait LoggerTrait: Send + Sync {
    fn is_enabled(&self) -> bool;
    fn log_message(&self, message: &str) -> Result<()>;
    fn log_file(&self, path: &Path, size: u64, status: &str) -> Result<()>;
    fn finalize(
        &self,
        files_scanned: u64,
        files_skipped: u64,
        features_found: usize,
        duration: Duration,
    ) -> Result<()>;
}

/// 扫描日志记录器，未启用时所有调用都是空操作
pub struct Logger {
    log_file: Arc<Mutex<Option<File>>>,
    log_path: PathBuf,
    enabled: bool,
}

impl Logger {
    /// 创建新的日志记录器，日志文件写到当前目录
    pub fn new(enabled: bool) -> Result<Self> {
        if !enabled {
            return Ok(Self::disabled());
        }

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        Self::create(PathBuf::from(format!("gap_scanner_{}.log", timestamp)))
    }

    pub fn disabled() -> Self {
        Self {
            log_file: Arc::new(Mutex::new(None)),
            log_path: PathBuf::new(),
            enabled: false,
        }
    }

    /// 在指定路径创建日志文件
    pub fn create(log_path: PathBuf) -> Result<Self> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("无法创建日志文件: {}", log_path.display()))?;

        // 写入UTF-8 BOM以确保文件被正确识别为UTF-8
        file.write_all(&[0xEF, 0xBB, 0xBF])?;

        let now = Local::now();
        writeln!(file, "# gap-scanner 扫描日志")?;
        writeln!(file, "# 开始时间: {}", now.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(file, "# --------------------------------------------")?;
        file.flush()?;

        Ok(Self {
            log_file: Arc::new(Mutex::new(Some(file))),
            log_path,
            enabled: true,
        })
    }

    /// 获取日志文件路径
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    fn write_line(&self, line: &str) -> Result<()> {
        if let Ok(mut file_guard) = self.log_file.lock() {
            if let Some(ref mut file) = *file_guard {
                writeln!(file, "{}", line)?;
                file.flush()?;
            }
        }
        Ok(())
    }
}

impl LoggerTrait for Logger {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn log_message(&self, message: &str) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        self.write_line(&format!("[{}] {}", timestamp, message))
    }

    fn log_file(&self, path: &Path, size: u64, status: &str) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        self.write_line(&format!(
            "[{}] 文件: {} | 大小: {} 字节 | 状态: {}",
            timestamp,
            path.display(),
            size,
            status
        ))
    }

    fn finalize(
        &self,
        files_scanned: u64,
        files_skipped: u64,
        features_found: usize,
        duration: Duration,
    ) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let now = Local::now();
        self.write_line("# --------------------------------------------")?;
        self.write_line(&format!("# 扫描完成时间: {}", now.format("%Y-%m-%d %H:%M:%S")))?;
        self.write_line(&format!("# 总用时: {:.3}秒", duration.as_secs_f64()))?;
        self.write_line(&format!("# 扫描文件数: {}", files_scanned))?;
        self.write_line(&format!("# 跳过文件数: {}", files_skipped))?;
        self.write_line(&format!("# 找到功能数: {}", features_found))?;
        self.write_line("# ============================================")
    }
}
