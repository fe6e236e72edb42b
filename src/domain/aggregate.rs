use std::path::{Path, PathBuf};

use crate::domain::feature::FeatureSet;

/// 单个文件的匹配结果，按功能顺序保存第一个匹配的行号
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileMatches {
    lines: Vec<Option<u64>>,
}

impl FileMatches {
    pub fn from_lines(lines: Vec<Option<u64>>) -> Self {
        Self { lines }
    }

    pub fn line(&self, index: usize) -> Option<u64> {
        self.lines.get(index).copied().flatten()
    }

    /// 命中的功能数
    pub fn hit_count(&self) -> usize {
        self.lines.iter().filter(|line| line.is_some()).count()
    }
}

/// 功能命中的位置
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Evidence {
    pub path: PathBuf,
    pub line: u64,
}

impl Evidence {
    fn precedes(&self, path: &Path, line: u64) -> bool {
        (self.path.as_path(), self.line) <= (path, line)
    }
}

/// 单个功能的汇总状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureStatus {
    id: String,
    evidence: Option<Evidence>,
}

impl FeatureStatus {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn found(&self) -> bool {
        self.evidence.is_some()
    }

    pub fn evidence(&self) -> Option<&Evidence> {
        self.evidence.as_ref()
    }

    // 只会从未找到变为找到；多个命中时保留最小的 (路径, 行号)，
    // 这样结果与文件访问顺序无关
    fn absorb(&mut self, path: &Path, line: u64) {
        let replace = self
            .evidence
            .as_ref()
            .map_or(true, |current| !current.precedes(path, line));

        if replace {
            self.evidence = Some(Evidence {
                path: path.to_path_buf(),
                line,
            });
        }
    }
}

/// 整棵目录树的汇总结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateResult {
    statuses: Vec<FeatureStatus>,
}

impl AggregateResult {
    /// 每个功能一项，初始均为未找到
    pub fn new(features: &FeatureSet) -> Self {
        Self {
            statuses: features
                .ids()
                .map(|id| FeatureStatus {
                    id: id.to_string(),
                    evidence: None,
                })
                .collect(),
        }
    }

    /// 按功能做 OR 合并一个文件的结果
    pub fn record(&mut self, path: &Path, matches: &FileMatches) {
        for (index, status) in self.statuses.iter_mut().enumerate() {
            if let Some(line) = matches.line(index) {
                status.absorb(path, line);
            }
        }
    }

    /// 合并两个由同一功能集合产生的结果
    pub fn merge(mut self, other: AggregateResult) -> AggregateResult {
        debug_assert!(self.ids().eq(other.ids()));

        for (status, theirs) in self.statuses.iter_mut().zip(other.statuses) {
            if let Some(evidence) = theirs.evidence {
                status.absorb(&evidence.path, evidence.line);
            }
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeatureStatus> {
        self.statuses.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.statuses.iter().map(FeatureStatus::id)
    }

    /// 查询某个功能是否找到，未知的功能返回 None
    pub fn is_found(&self, id: &str) -> Option<bool> {
        self.statuses
            .iter()
            .find(|status| status.id == id)
            .map(FeatureStatus::found)
    }

    pub fn found_count(&self) -> usize {
        self.statuses.iter().filter(|status| status.found()).count()
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::feature::{FeatureSet, FeatureSpec};

    fn features() -> FeatureSet {
        FeatureSet::new(vec![
            FeatureSpec::regex("a", "alpha"),
            FeatureSpec::regex("b", "beta"),
            FeatureSpec::regex("c", "gamma"),
        ])
        .unwrap()
    }

    #[test]
    fn test_new_contains_every_feature() {
        let aggregate = AggregateResult::new(&features());

        assert_eq!(aggregate.len(), 3);
        assert_eq!(aggregate.ids().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert!(aggregate.iter().all(|status| !status.found()));
    }

    #[test]
    fn test_record_is_monotonic() {
        let mut aggregate = AggregateResult::new(&features());

        aggregate.record(Path::new("one.dart"), &FileMatches::from_lines(vec![Some(4), None, None]));
        assert_eq!(aggregate.is_found("a"), Some(true));

        // 后续文件没有命中，不能把已找到的功能改回未找到
        aggregate.record(Path::new("two.dart"), &FileMatches::from_lines(vec![None, None, None]));
        assert_eq!(aggregate.is_found("a"), Some(true));
        assert_eq!(aggregate.is_found("b"), Some(false));
        assert_eq!(aggregate.is_found("missing"), None);
        assert_eq!(aggregate.found_count(), 1);
    }

    #[test]
    fn test_order_invariance() {
        let files = vec![
            (PathBuf::from("lib/b.dart"), FileMatches::from_lines(vec![Some(2), None, None])),
            (PathBuf::from("lib/a.dart"), FileMatches::from_lines(vec![Some(9), Some(1), None])),
            (PathBuf::from("lib/c.dart"), FileMatches::from_lines(vec![None, Some(3), None])),
        ];

        let mut forward = AggregateResult::new(&features());
        for (path, matches) in &files {
            forward.record(path, matches);
        }

        let mut backward = AggregateResult::new(&features());
        for (path, matches) in files.iter().rev() {
            backward.record(path, matches);
        }

        assert_eq!(forward, backward);
        let evidence = forward.iter().next().unwrap().evidence().unwrap();
        assert_eq!(evidence.path, PathBuf::from("lib/a.dart"));
        assert_eq!(evidence.line, 9);
    }

    #[test]
    fn test_merge_is_commutative() {
        let set = features();

        let mut left = AggregateResult::new(&set);
        left.record(Path::new("x.dart"), &FileMatches::from_lines(vec![Some(1), None, None]));

        let mut right = AggregateResult::new(&set);
        right.record(Path::new("y.dart"), &FileMatches::from_lines(vec![Some(5), None, Some(2)]));

        let merged = left.clone().merge(right.clone());
        assert_eq!(merged, right.merge(left));
        assert_eq!(merged.is_found("a"), Some(true));
        assert_eq!(merged.is_found("b"), Some(false));
        assert_eq!(merged.is_found("c"), Some(true));
    }

    #[test]
    fn test_file_matches_hit_count() {
        let matches = FileMatches::from_lines(vec![Some(1), None, Some(7)]);
        assert_eq!(matches.hit_count(), 2);
        assert_eq!(matches.line(2), Some(7));
        assert_eq!(matches.line(10), None);
    }
}
