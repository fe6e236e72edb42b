use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// 致命错误：出现后整个扫描立即终止
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("功能列表为空，至少需要一个功能")]
    NoFeatures,

    #[error("功能标识不能为空")]
    EmptyFeatureId,

    #[error("重复的功能标识: `{0}`")]
    DuplicateFeature(String),

    #[error("功能 `{feature}` 的匹配模式无效: {source}")]
    InvalidPattern {
        feature: String,
        #[source]
        source: grep_regex::Error,
    },

    #[error("根目录不存在: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("根路径不是目录: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("无法访问根目录 {}: {source}", .path.display())]
    RootAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("目录遍历失败: {0}")]
    Walk(#[from] ignore::Error),

    #[error("扫描线程异常退出")]
    WorkerPanicked,
}

/// 单个文件的错误：记录后跳过该文件，扫描继续
#[derive(Debug, Error)]
pub enum FileError {
    #[error("无法读取文件 {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("二进制文件 {}", .path.display())]
    Binary { path: PathBuf },

    #[error("文件不是有效的 UTF-8 文本 {}: {source}", .path.display())]
    Encoding {
        path: PathBuf,
        #[source]
        source: bstr::Utf8Error,
    },

    #[error("搜索文件失败 {}: {source}", .path.display())]
    Search {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FileError {
    pub fn path(&self) -> &Path {
        match self {
            FileError::Read { path, .. }
            | FileError::Binary { path }
            | FileError::Encoding { path, .. }
            | FileError::Search { path, .. } => path,
        }
    }

    pub fn reason(&self) -> SkipReason {
        match self {
            FileError::Read { .. } => SkipReason::Unreadable,
            FileError::Binary { .. } => SkipReason::Binary,
            FileError::Encoding { .. } => SkipReason::Encoding,
            FileError::Search { .. } => SkipReason::Search,
        }
    }
}

/// 跳过文件的原因分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SkipReason {
    Unreadable,
    Binary,
    Encoding,
    Search,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Unreadable => "无法读取",
            SkipReason::Binary => "二进制内容",
            SkipReason::Encoding => "编码错误",
            SkipReason::Search => "搜索失败",
        }
    }
}
