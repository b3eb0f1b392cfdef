//! Allow/deny regex filters.

use crate::error::CrawlError;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Serialized form of a pattern filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PatternSpec {
    /// Regexes a name must match; anchored at the start
    pub allow: Vec<String>,
    /// Regexes excluding a name; deny wins over allow
    pub deny: Vec<String>,
    /// Match case-insensitively (the default)
    pub ignore_case: bool,
}

impl Default for PatternSpec {
    fn default() -> Self {
        Self {
            allow: vec![".*".to_string()],
            deny: Vec::new(),
            ignore_case: true,
        }
    }
}

/// Compiled allow/deny filter.
///
/// Regexes are anchored at the start of the candidate, so `sales` admits
/// `sales.orders` but `orders` does not. Deny wins over allow.
///
/// # Example
/// ```rust
/// use lakescout_core::config::AllowDenyPattern;
///
/// let pattern = AllowDenyPattern::new(vec!["sales\\..*".into()], vec![".*\\.tmp_.*".into()]).unwrap();
/// assert!(pattern.allowed("sales.orders"));
/// assert!(!pattern.allowed("sales.tmp_scratch"));
/// assert!(!pattern.allowed("hr.people"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "PatternSpec", into = "PatternSpec")]
pub struct AllowDenyPattern {
    spec: PatternSpec,
    allow: Vec<Regex>,
    deny: Vec<Regex>,
}

impl Default for AllowDenyPattern {
    fn default() -> Self {
        Self::allow_all()
    }
}

impl PartialEq for AllowDenyPattern {
    fn eq(&self, other: &Self) -> bool {
        self.spec == other.spec
    }
}

fn compile(patterns: &[String], ignore_case: bool) -> crate::Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| {
            RegexBuilder::new(&format!("^(?:{p})"))
                .case_insensitive(ignore_case)
                .build()
                .map_err(|e| CrawlError::configuration(format!("Invalid pattern '{}': {}", p, e)))
        })
        .collect()
}

impl AllowDenyPattern {
    /// Builds a case-insensitive filter.
    pub fn new(allow: Vec<String>, deny: Vec<String>) -> crate::Result<Self> {
        Self::try_from(PatternSpec {
            allow,
            deny,
            ignore_case: true,
        })
    }

    /// Filter admitting every name.
    pub fn allow_all() -> Self {
        Self {
            spec: PatternSpec::default(),
            allow: Regex::new("^(?:.*)").into_iter().collect(),
            deny: Vec::new(),
        }
    }

    /// Filter admitting only names matching one of `allow`.
    pub fn allow_only(allow: Vec<String>) -> crate::Result<Self> {
        Self::new(allow, Vec::new())
    }

    /// Filter admitting everything except names matching one of `deny`.
    pub fn deny_only(deny: Vec<String>) -> crate::Result<Self> {
        Self::new(vec![".*".to_string()], deny)
    }

    /// Whether `name` matches an allow regex and no deny regex.
    pub fn allowed(&self, name: &str) -> bool {
        if self.deny.iter().any(|r| r.is_match(name)) {
            return false;
        }
        self.allow.iter().any(|r| r.is_match(name))
    }

    /// Source regexes this filter was compiled from.
    pub fn spec(&self) -> &PatternSpec {
        &self.spec
    }
}

impl TryFrom<PatternSpec> for AllowDenyPattern {
    type Error = CrawlError;

    fn try_from(spec: PatternSpec) -> crate::Result<Self> {
        let allow = compile(&spec.allow, spec.ignore_case)?;
        let deny = compile(&spec.deny, spec.ignore_case)?;
        Ok(Self { spec, allow, deny })
    }
}

impl From<AllowDenyPattern> for PatternSpec {
    fn from(pattern: AllowDenyPattern) -> Self {
        pattern.spec
    }
}
