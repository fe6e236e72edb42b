use std::io;
use std::path::Path;

use bstr::ByteSlice;

use crate::domain::aggregate::FileMatches;
use crate::domain::feature::FeatureSet;
use crate::error::FileError;

/// 单个文件的扫描结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileScan {
    pub matches: FileMatches,
    pub bytes: u64,
}

/// 对文件内容逐个评估全部功能规则
#[derive(Debug, Clone)]
pub struct Scanner {
    features: FeatureSet,
}

impl Scanner {
    pub fn new(features: FeatureSet) -> Self {
        Self { features }
    }

    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    /// 在完整内容上评估每个功能，功能之间互不短路
    pub fn scan_content(&self, content: &[u8]) -> io::Result<FileMatches> {
        let mut lines = Vec::with_capacity(self.features.len());

        for feature in self.features.iter() {
            // 是否命中以 is_match 为准，行号只用于展示
            let line = if feature.is_match(content) {
                Some(feature.first_match_line(content)?.unwrap_or(1))
            } else {
                None
            };
            lines.push(line);
        }

        Ok(FileMatches::from_lines(lines))
    }

    /// 读取整个文件并扫描
    ///
    /// 无法读取、包含 NUL 字节或不是 UTF-8 的文件返回 [`FileError`]，
    /// 由调用方决定跳过。
    pub fn scan_file(&self, path: &Path) -> Result<FileScan, FileError> {
        let content = std::fs::read(path).map_err(|source| FileError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        if content.find_byte(b'\x00').is_some() {
            return Err(FileError::Binary {
                path: path.to_path_buf(),
            });
        }

        if let Err(source) = content.to_str() {
            return Err(FileError::Encoding {
                path: path.to_path_buf(),
                source,
            });
        }

        let matches = self
            .scan_content(&content)
            .map_err(|source| FileError::Search {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(FileScan {
            matches,
            bytes: content.len() as u64,
        })
    }
}
