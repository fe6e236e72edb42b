use std::path::{Path, PathBuf};

use ignore::{DirEntry, WalkBuilder, WalkParallel};

use crate::error::ScanError;

/// 文件名后缀过滤条件，为空时接受所有文件
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuffixFilter {
    suffixes: Vec<String>,
}

impl SuffixFilter {
    pub fn new(suffixes: Vec<String>) -> Self {
        Self { suffixes }
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    /// 检查文件名是否以任一后缀结尾
    pub fn matches(&self, path: &Path) -> bool {
        if self.suffixes.is_empty() {
            return true;
        }

        let Some(file_name) = path.file_name() else {
            return false;
        };
        let file_name = file_name.to_string_lossy();
        self.suffixes
            .iter()
            .any(|suffix| file_name.ends_with(suffix.as_str()))
    }
}

/// 遍历选项
#[derive(Debug, Clone)]
pub struct WalkOptions {
    pub root: PathBuf,
    pub filter: SuffixFilter,
    pub respect_gitignore: bool,
    pub follow_links: bool,
}

impl WalkOptions {
    pub fn new(root: impl Into<PathBuf>, filter: SuffixFilter) -> Self {
        Self {
            root: root.into(),
            filter,
            respect_gitignore: false,
            follow_links: false,
        }
    }

    fn builder(&self) -> WalkBuilder {
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(false) // 包含隐藏文件
            .follow_links(self.follow_links)
            .ignore(self.respect_gitignore)
            .parents(self.respect_gitignore)
            .git_global(self.respect_gitignore)
            .git_ignore(self.respect_gitignore)
            .git_exclude(self.respect_gitignore);
        builder
    }
}

/// 检查根目录：不存在、无法访问或不是目录都是致命错误
pub fn check_root(root: &Path) -> Result<(), ScanError> {
    let metadata = std::fs::metadata(root).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ScanError::RootNotFound(root.to_path_buf())
        } else {
            ScanError::RootAccess {
                path: root.to_path_buf(),
                source,
            }
        }
    })?;

    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    Ok(())
}

/// 处理一个遍历条目
///
/// 遍历错误 (权限不足、符号链接循环等) 直接返回错误，不静默跳过，
/// 否则汇总结果会漏掉整个子目录。
pub fn accept(
    entry: Result<DirEntry, ignore::Error>,
    filter: &SuffixFilter,
) -> Result<Option<PathBuf>, ScanError> {
    let entry = entry?;

    // 只处理文件
    if !entry.file_type().map_or(false, |ft| ft.is_file()) {
        return Ok(None);
    }

    if !filter.matches(entry.path()) {
        return Ok(None);
    }

    Ok(Some(entry.into_path()))
}

/// 惰性地遍历根目录下所有符合后缀的文件
pub fn walk(
    options: &WalkOptions,
) -> Result<impl Iterator<Item = Result<PathBuf, ScanError>>, ScanError> {
    check_root(&options.root)?;

    let filter = options.filter.clone();
    Ok(options
        .builder()
        .build()
        .filter_map(move |entry| accept(entry, &filter).transpose()))
}

/// 创建多线程遍历器，条目仍需经过 [`accept`] 处理
pub fn walk_parallel(options: &WalkOptions, threads: usize) -> Result<WalkParallel, ScanError> {
    check_root(&options.root)?;

    let mut builder = options.builder();
    builder.threads(threads.max(1));
    Ok(builder.build_parallel())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn dart_filter() -> SuffixFilter {
        SuffixFilter::new(vec![".dart".to_string()])
    }

    fn collect(options: &WalkOptions) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = walk(options)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        paths.sort();
        paths
    }

    #[test]
    fn test_suffix_filter() {
        let filter = SuffixFilter::new(vec![".dart".to_string(), ".yaml".to_string()]);

        assert!(filter.matches(Path::new("lib/main.dart")));
        assert!(filter.matches(Path::new("pubspec.yaml")));
        assert!(!filter.matches(Path::new("lib/main.dart.bak")));
        assert!(!filter.matches(Path::new("README.md")));
        assert!(SuffixFilter::default().matches(Path::new("anything")));
    }

    #[test]
    fn test_walk_recurses_and_filters() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("screens/chat")).unwrap();
        fs::create_dir_all(root.join(".hidden")).unwrap();
        fs::write(root.join("main.dart"), "void main() {}").unwrap();
        fs::write(root.join("screens/chat/room.dart"), "class Room {}").unwrap();
        fs::write(root.join(".hidden/secret.dart"), "Redis").unwrap();
        fs::write(root.join("screens/notes.txt"), "Redis").unwrap();

        let paths = collect(&WalkOptions::new(root, dart_filter()));
        let mut expected = vec![
            root.join(".hidden/secret.dart"),
            root.join("main.dart"),
            root.join("screens/chat/room.dart"),
        ];
        expected.sort();
        assert_eq!(paths, expected);
    }

    #[test]
    fn test_ignore_files_respected_only_when_enabled() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("generated")).unwrap();
        fs::write(root.join(".ignore"), "generated/\n").unwrap();
        fs::write(root.join("generated/api.dart"), "Redis").unwrap();
        fs::write(root.join("app.dart"), "").unwrap();

        let mut options = WalkOptions::new(root, dart_filter());
        assert_eq!(collect(&options).len(), 2);

        options.respect_gitignore = true;
        assert_eq!(collect(&options), vec![root.join("app.dart")]);
    }

    #[test]
    fn test_root_errors() {
        let temp_dir = tempdir().unwrap();
        let missing = temp_dir.path().join("lib");
        assert!(matches!(check_root(&missing), Err(ScanError::RootNotFound(_))));

        let file = temp_dir.path().join("main.dart");
        fs::write(&file, "").unwrap();
        assert!(matches!(check_root(&file), Err(ScanError::NotADirectory(_))));

        assert!(walk(&WalkOptions::new(&missing, dart_filter())).is_err());
        assert!(walk_parallel(&WalkOptions::new(&missing, dart_filter()), 2).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_is_fatal_when_following_links() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("a")).unwrap();
        fs::write(root.join("a/x.dart"), "").unwrap();
        std::os::unix::fs::symlink(root, root.join("a/loop")).unwrap();

        let mut options = WalkOptions::new(root, dart_filter());
        assert_eq!(collect(&options), vec![root.join("a/x.dart")]);

        options.follow_links = true;
        let result: Result<Vec<PathBuf>, ScanError> = walk(&options).unwrap().collect();
        assert!(matches!(result, Err(ScanError::Walk(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_is_fatal() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        let locked = root.join("locked");
        fs::create_dir_all(&locked).unwrap();
        fs::write(locked.join("x.dart"), "Redis").unwrap();
        fs::write(root.join("ok.dart"), "").unwrap();

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(&locked).is_ok() {
            // root 用户不受目录权限限制
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result: Result<Vec<PathBuf>, ScanError> =
            walk(&WalkOptions::new(root, dart_filter())).unwrap().collect();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(matches!(result, Err(ScanError::Walk(_))));
    }
}
