use std::borrow::Cow;
use std::collections::HashSet;
use std::io;

use bstr::ByteSlice;
use grep_matcher::Matcher;
use grep_regex::{RegexMatcher, RegexMatcherBuilder};
use grep_searcher::{Searcher, SearcherBuilder, Sink, SinkMatch};
use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// 功能规则：功能标识 + 匹配模式
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub id: String,
    pub pattern: String,
    /// 为 true 时模式按普通文本处理
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub literal: bool,
}

impl FeatureSpec {
    /// 正则表达式规则
    pub fn regex(id: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pattern: pattern.into(),
            literal: false,
        }
    }

    /// 普通文本规则
    pub fn literal(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pattern: text.into(),
            literal: true,
        }
    }

    fn regex_source(&self) -> Cow<'_, str> {
        if self.literal {
            // 转义正则表达式特殊字符
            Cow::Owned(regex::escape(&self.pattern))
        } else {
            Cow::Borrowed(&self.pattern)
        }
    }

    fn compile(&self) -> Result<RegexMatcher, ScanError> {
        // 允许模式跨行匹配: `.` 匹配换行，`^`/`$` 按行锚定
        RegexMatcherBuilder::new()
            .multi_line(true)
            .dot_matches_new_line(true)
            .build(&self.regex_source())
            .map_err(|source| ScanError::InvalidPattern {
                feature: self.id.clone(),
                source,
            })
    }
}

/// 内置的功能规则，按报告顺序排列
pub fn builtin_specs() -> Vec<FeatureSpec> {
    vec![
        FeatureSpec::regex(
            "anonymous_auth",
            r"FirebaseAuth\.instance\.signInAnonymously\(\)",
        ),
        FeatureSpec::regex("advice_toggle", r"Switch.*onChanged.*wantsAdvice"),
        FeatureSpec::regex("burn_after_read", r"FirebaseDynamicLinks|Redis"),
        FeatureSpec::regex("voice_confessions", r"flutter_voice_processor|WhisperAPI"),
    ]
}

/// 编译后的单个功能
#[derive(Debug, Clone)]
pub struct Feature {
    id: String,
    matcher: RegexMatcher,
}

impl Feature {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// 内容中任意位置存在匹配即返回 true
    pub fn is_match(&self, content: &[u8]) -> bool {
        matches!(self.matcher.is_match(content), Ok(true))
    }

    /// 返回第一个匹配所在的行号 (从 1 开始)
    pub fn first_match_line(&self, content: &[u8]) -> io::Result<Option<u64>> {
        let mut sink = FirstMatch::default();
        let mut searcher = SearcherBuilder::new()
            .multi_line(true)
            .line_number(true)
            .build();
        searcher.search_slice(&self.matcher, content, &mut sink)?;

        // 输入末尾的空匹配 (如 `\z`、空文件上的 `x*`) 不会交给 Sink，
        // 此时按匹配位置计算行号
        Ok(sink.line.or_else(|| self.offset_line(content)))
    }

    fn offset_line(&self, content: &[u8]) -> Option<u64> {
        let m = self.matcher.find(content).ok().flatten()?;
        let newlines = content[..m.start()].find_iter("\n").count();
        Some(newlines as u64 + 1)
    }
}

/// 只记录第一个匹配，然后停止搜索
#[derive(Default)]
struct FirstMatch {
    line: Option<u64>,
}

impl Sink for FirstMatch {
    type Error = io::Error;

    fn matched(&mut self, _searcher: &Searcher, mat: &SinkMatch<'_>) -> Result<bool, Self::Error> {
        self.line = Some(mat.line_number().unwrap_or(1));
        Ok(false)
    }
}

/// 有序、不可变的功能集合
///
/// 构造时检查标识并编译全部模式，任何错误都在遍历开始前暴露。
#[derive(Debug, Clone)]
pub struct FeatureSet {
    features: Vec<Feature>,
}

impl FeatureSet {
    pub fn new(specs: impl IntoIterator<Item = FeatureSpec>) -> Result<Self, ScanError> {
        let mut seen = HashSet::new();
        let mut features = Vec::new();

        for spec in specs {
            if spec.id.trim().is_empty() {
                return Err(ScanError::EmptyFeatureId);
            }
            if !seen.insert(spec.id.clone()) {
                return Err(ScanError::DuplicateFeature(spec.id));
            }

            let matcher = spec.compile()?;
            features.push(Feature {
                id: spec.id,
                matcher,
            });
        }

        if features.is_empty() {
            return Err(ScanError::NoFeatures);
        }

        Ok(Self { features })
    }

    pub fn builtin() -> Result<Self, ScanError> {
        Self::new(builtin_specs())
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(Feature::id)
    }
}
