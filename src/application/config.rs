use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::feature::{builtin_specs, FeatureSpec};
use crate::domain::file_walker::{SuffixFilter, WalkOptions};

/// 应用程序配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// 扫描相关配置
    #[serde(default)]
    pub scan: ScanConfig,
    /// 功能规则，按报告顺序排列
    pub features: Vec<FeatureSpec>,
}

/// 扫描配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// 扫描的根目录
    pub root: PathBuf,
    /// 需要扫描的文件名后缀
    pub suffixes: Vec<String>,
    /// 是否遵循 .gitignore / .ignore 规则
    pub respect_gitignore: bool,
    /// 是否跟随符号链接
    pub follow_links: bool,
    /// 是否并行扫描
    pub parallel: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("lib"),
            suffixes: vec![".dart".to_string()],
            respect_gitignore: false,
            follow_links: false,
            parallel: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scan: ScanConfig::default(),
            features: builtin_specs(),
        }
    }
}

impl Config {
    /// 从文件加载配置
    pub fn load_from_file(config_path: &Path) -> Result<Self> {
        let content = fs::read_to_string(config_path)
            .with_context(|| format!("无法读取配置文件: {}", config_path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", config_path.display()))?;

        Ok(config)
    }

    /// 序列化为 TOML 文本
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("无法序列化配置")
    }

    /// 验证配置的有效性
    ///
    /// 匹配模式在构建功能集合时编译，这里只检查结构。
    pub fn validate(&self) -> Result<()> {
        if self.features.is_empty() {
            anyhow::bail!("features 不能为空");
        }

        if self.scan.suffixes.iter().any(|suffix| suffix.is_empty()) {
            anyhow::bail!("suffixes 中不能包含空字符串");
        }

        if self.scan.root.as_os_str().is_empty() {
            anyhow::bail!("root 不能为空");
        }

        Ok(())
    }

    /// 生成遍历选项
    pub fn walk_options(&self) -> WalkOptions {
        let mut options = WalkOptions::new(
            &self.scan.root,
            SuffixFilter::new(self.scan.suffixes.clone()),
        );
        options.respect_gitignore = self.scan.respect_gitignore;
        options.follow_links = self.scan.follow_links;
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.scan.root, PathBuf::from("lib"));
        assert_eq!(config.scan.suffixes, vec![".dart".to_string()]);
        assert!(!config.scan.parallel);
        assert_eq!(config.features.len(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = config.to_toml().unwrap();
        let deserialized: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("rules.toml");
        fs::write(
            &config_path,
            r#"
[scan]
root = "app/lib"
suffixes = [".dart", ".kt"]

[[features]]
id = "push"
pattern = 'FirebaseMessaging\.instance'

[[features]]
id = "paywall"
pattern = "RevenueCat"
literal = true
"#,
        )
        .unwrap();

        let config = Config::load_from_file(&config_path).unwrap();
        assert_eq!(config.scan.root, PathBuf::from("app/lib"));
        assert_eq!(config.scan.suffixes.len(), 2);
        assert!(!config.scan.follow_links);
        assert_eq!(config.features[0], FeatureSpec::regex("push", r"FirebaseMessaging\.instance"));
        assert!(config.features[1].literal);
    }

    #[test]
    fn test_missing_scan_section_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
[[features]]
id = "only"
pattern = "x"
"#,
        )
        .unwrap();

        assert_eq!(config.scan, ScanConfig::default());
        assert_eq!(config.features.len(), 1);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.features.clear();
        assert!(config.validate().is_err());

        config = Config::default();
        config.scan.suffixes.push(String::new());
        assert!(config.validate().is_err());

        assert!(Config::load_from_file(Path::new("/nonexistent/rules.toml")).is_err());
    }

    #[test]
    fn test_walk_options() {
        let mut config = Config::default();
        config.scan.follow_links = true;

        let options = config.walk_options();
        assert_eq!(options.root, PathBuf::from("lib"));
        assert!(options.follow_links);
        assert!(!options.respect_gitignore);
        assert_eq!(options.filter.suffixes(), &[".dart".to_string()]);
    }
}
