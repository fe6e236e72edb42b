use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use gap_scanner::application::{announce, run_audit, AuditOptions, Config};
use gap_scanner::domain::{FeatureSet, Scanner};
use gap_scanner::infrastructure::{Logger, LoggerTrait};
use gap_scanner::presentation::{write_report, ScanSummary};

/// 检查源码目录中是否实现了必需功能
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// 要扫描的根目录 (默认为 lib)
    path: Option<PathBuf>,

    /// 从 TOML 文件加载扫描配置和功能规则
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// 只扫描以该后缀结尾的文件，可重复指定 (默认 .dart)
    #[clap(short, long = "suffix")]
    suffixes: Vec<String>,

    /// 使用多线程并行扫描
    #[clap(long)]
    parallel: bool,

    /// 并行线程数 (指定后自动启用并行扫描)
    #[clap(long)]
    threads: Option<usize>,

    /// 遵循 .gitignore / .ignore 规则
    #[clap(long)]
    respect_gitignore: bool,

    /// 跟随符号链接
    #[clap(long)]
    follow_links: bool,

    /// 显示命中位置和扫描摘要
    #[clap(short, long)]
    verbose: bool,

    /// 不显示进度
    #[clap(long)]
    no_progress: bool,

    /// 启用日志记录，日志文件保存到当前目录
    #[clap(long)]
    log: bool,

    /// 输出内置配置 (TOML) 后退出
    #[clap(long)]
    print_config: bool,
}

/// 加载配置并应用命令行参数
fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };

    if let Some(path) = &args.path {
        config.scan.root = path.clone();
    }
    if !args.suffixes.is_empty() {
        config.scan.suffixes = args.suffixes.clone();
    }
    config.scan.parallel |= args.parallel || args.threads.is_some();
    config.scan.respect_gitignore |= args.respect_gitignore;
    config.scan.follow_links |= args.follow_links;

    config.validate().context("配置无效")?;
    Ok(config)
}

fn log_parameters(logger: &Logger, config: &Config, features: &FeatureSet) -> Result<()> {
    logger.log_message(&format!("根目录: {}", config.scan.root.display()))?;
    logger.log_message(&format!("文件后缀: {}", config.scan.suffixes.join(", ")))?;
    logger.log_message(&format!("并行扫描: {}", config.scan.parallel))?;
    logger.log_message(&format!("遵循 .gitignore 规则: {}", config.scan.respect_gitignore))?;
    logger.log_message(&format!("跟随符号链接: {}", config.scan.follow_links))?;
    logger.log_message(&format!("功能: {}", features.ids().collect::<Vec<_>>().join(", ")))?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print!("{}", Config::default().to_toml()?);
        return Ok(());
    }

    let config = load_config(&args)?;

    // 在遍历开始前编译全部规则，模式无效直接退出
    let features = FeatureSet::new(config.features.clone())?;
    let walk = config.walk_options();

    // 根目录无效时不输出提示行
    announce(io::stdout().lock(), &walk)?;

    let logger = Logger::new(args.log)?;
    if logger.is_enabled() {
        log_parameters(&logger, &config, &features)?;
    }

    let scanner = Arc::new(Scanner::new(features));
    let mut options = AuditOptions::new(walk);
    options.parallel = config.scan.parallel;
    options.threads = args.threads;
    options.show_progress = !args.no_progress;

    let outcome = run_audit(&scanner, &options, &logger)?;

    outcome.skips.write_summary(io::stderr().lock())?;

    let mut stdout = io::stdout().lock();
    write_report(&mut stdout, &outcome.aggregate, args.verbose)?;
    if args.verbose {
        ScanSummary::from_outcome(&outcome).write_to(&mut stdout)?;
    }
    stdout.flush()?;

    // 完成日志记录
    if logger.is_enabled() {
        logger.finalize(
            outcome.files_scanned,
            outcome.skips.total() as u64,
            outcome.aggregate.found_count(),
            outcome.duration,
        )?;
        eprintln!("完整日志已保存到: {}", logger.log_path().display());
    }

    Ok(())
}
