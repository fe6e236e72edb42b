use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::bounded;
use ignore::WalkState;
use indicatif::{ProgressBar, ProgressStyle};

use crate::domain::aggregate::AggregateResult;
use crate::domain::file_walker::{self, WalkOptions};
use crate::domain::scanner::{FileScan, Scanner};
use crate::error::{FileError, ScanError};
use crate::infrastructure::{LoggerTrait, SkipRecorder};
use crate::presentation::write_banner;

const CHANNEL_CAPACITY: usize = 256;

/// 审计运行选项
#[derive(Debug, Clone)]
pub struct AuditOptions {
    pub walk: WalkOptions,
    /// 是否使用多线程遍历
    pub parallel: bool,
    /// 并行线程数，默认使用所有可用CPU
    pub threads: Option<usize>,
    pub show_progress: bool,
}

impl AuditOptions {
    pub fn new(walk: WalkOptions) -> Self {
        Self {
            walk,
            parallel: false,
            threads: None,
            show_progress: false,
        }
    }
}

/// 一次完整扫描的结果
#[derive(Debug)]
pub struct AuditOutcome {
    pub aggregate: AggregateResult,
    pub files_scanned: u64,
    pub bytes_scanned: u64,
    pub skips: SkipRecorder,
    pub duration: Duration,
}

/// 并行模式下工作线程发给汇总线程的事件
enum Event {
    Scanned(PathBuf, Result<FileScan, FileError>),
    Failed(ScanError),
}

/// 汇总状态，始终只由一个线程修改
struct Fold<'a> {
    aggregate: AggregateResult,
    files_scanned: u64,
    bytes_scanned: u64,
    skips: SkipRecorder,
    logger: &'a dyn LoggerTrait,
    progress: ProgressBar,
}

impl<'a> Fold<'a> {
    fn absorb(&mut self, path: &Path, result: Result<FileScan, FileError>) {
        match result {
            Ok(scan) => {
                self.aggregate.record(path, &scan.matches);
                self.files_scanned += 1;
                self.bytes_scanned += scan.bytes;

                if self.logger.is_enabled() {
                    let status = format!("已扫描 (命中 {} 个功能)", scan.matches.hit_count());
                    let _ = self.logger.log_file(path, scan.bytes, &status);
                }
            }
            Err(err) => {
                // 单个文件失败不影响其他文件的结果
                self.progress
                    .suspend(|| eprintln!("{}", SkipRecorder::warning(&err)));
                if self.logger.is_enabled() {
                    let status = format!("已跳过 ({})", err.reason().as_str());
                    let _ = self.logger.log_file(path, 0, &status);
                    let _ = self.logger.log_message(&err.to_string());
                }
                self.skips.record(&err);
            }
        }

        self.progress.set_message(format!(
            "已扫描 {} 个文件，跳过 {} 个",
            self.files_scanned,
            self.skips.total()
        ));
        self.progress.tick();
    }

    fn finish(self, started: Instant) -> AuditOutcome {
        self.progress
            .finish_with_message(format!("完成! 已扫描 {} 个文件", self.files_scanned));

        AuditOutcome {
            aggregate: self.aggregate,
            files_scanned: self.files_scanned,
            bytes_scanned: self.bytes_scanned,
            skips: self.skips,
            duration: started.elapsed(),
        }
    }
}

fn progress_bar(visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let progress = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.green} [{elapsed_precise}] {msg}")
    {
        progress.set_style(style);
    }
    progress.set_message("已扫描 0 个文件");
    progress
}

/// 检查根目录后输出开始提示行
///
/// 根目录无效时直接返回错误，不输出任何内容。
pub fn announce<W: Write>(mut out: W, walk: &WalkOptions) -> anyhow::Result<()> {
    file_walker::check_root(&walk.root)?;
    write_banner(&mut out, &walk.root)?;
    out.flush()?;
    Ok(())
}

/// 遍历根目录，扫描每个文件并汇总结果
///
/// 根目录不可访问或遍历出错时返回致命错误；单个文件的读取或解码错误
/// 只会被记录并跳过。
pub fn run_audit(
    scanner: &Arc<Scanner>,
    options: &AuditOptions,
    logger: &dyn LoggerTrait,
) -> Result<AuditOutcome, ScanError> {
    let started = Instant::now();

    if logger.is_enabled() {
        let _ = logger.log_message(&format!("开始扫描目录: {}", options.walk.root.display()));
    }

    let mut fold = Fold {
        aggregate: AggregateResult::new(scanner.features()),
        files_scanned: 0,
        bytes_scanned: 0,
        skips: SkipRecorder::new(),
        logger,
        progress: progress_bar(options.show_progress),
    };

    let result = if options.parallel {
        let threads = options.threads.unwrap_or_else(num_cpus::get);
        scan_parallel(scanner, &options.walk, threads, &mut fold)
    } else {
        scan_sequential(scanner, &options.walk, &mut fold)
    };

    if let Err(err) = result {
        fold.progress.abandon();
        if logger.is_enabled() {
            let _ = logger.log_message(&format!("扫描中止: {}", err));
        }
        return Err(err);
    }

    Ok(fold.finish(started))
}

fn scan_sequential(scanner: &Scanner, walk: &WalkOptions, fold: &mut Fold<'_>) -> Result<(), ScanError> {
    for path in file_walker::walk(walk)? {
        let path = path?;
        let result = scanner.scan_file(&path);
        fold.absorb(&path, result);
    }
    Ok(())
}

fn scan_parallel(
    scanner: &Arc<Scanner>,
    walk: &WalkOptions,
    threads: usize,
    fold: &mut Fold<'_>,
) -> Result<(), ScanError> {
    let walker = file_walker::walk_parallel(walk, threads)?;
    let (tx, rx) = bounded::<Event>(CHANNEL_CAPACITY);

    let joined = thread::scope(|scope| {
        // 唯一的汇总点：所有结果都在这个线程合并
        let consumer = scope.spawn(move || {
            let mut fatal = None;
            for event in rx {
                match event {
                    Event::Scanned(path, result) => {
                        if fatal.is_none() {
                            fold.absorb(&path, result);
                        }
                    }
                    Event::Failed(err) => {
                        if fatal.is_none() {
                            fatal = Some(err);
                        }
                    }
                }
            }
            fatal
        });

        walker.run(|| {
            let tx = tx.clone();
            let scanner = Arc::clone(scanner);
            let filter = walk.filter.clone();

            Box::new(move |entry| match file_walker::accept(entry, &filter) {
                Ok(Some(path)) => {
                    let result = scanner.scan_file(&path);
                    if tx.send(Event::Scanned(path, result)).is_err() {
                        return WalkState::Quit;
                    }
                    WalkState::Continue
                }
                Ok(None) => WalkState::Continue,
                Err(err) => {
                    let _ = tx.send(Event::Failed(err));
                    WalkState::Quit
                }
            })
        });

        // 关闭发送通道，汇总线程随之结束
        drop(tx);
        consumer.join()
    });

    match joined {
        Ok(Some(err)) => Err(err),
        Ok(None) => Ok(()),
        Err(_) => Err(ScanError::WorkerPanicked),
    }
}
