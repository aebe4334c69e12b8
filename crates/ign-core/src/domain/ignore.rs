//! Ignore rules shared by hashing, scanning and generation.
//!
//! A path is excluded when any rule matches the whole relative path, a single
//! segment of it, or any ancestor prefix. Matching a directory therefore
//! prunes everything beneath it.

use glob::Pattern;

/// Name of the template manifest at the template root.
pub const TEMPLATE_MANIFEST_FILE: &str = "ign.json";

/// Version-control directory excluded at every depth.
pub const VCS_DIR: &str = ".git";

#[derive(Debug, Clone)]
enum Rule {
    Glob(Pattern),
    /// Patterns that are not valid glob syntax are compared verbatim.
    Literal(String),
}

impl Rule {
    fn compile(raw: &str) -> Self {
        match Pattern::new(raw) {
            Ok(p) => Self::Glob(p),
            Err(_) => Self::Literal(raw.to_string()),
        }
    }

    fn matches(&self, candidate: &str) -> bool {
        match self {
            Self::Glob(p) => p.matches(candidate),
            Self::Literal(s) => s == candidate,
        }
    }
}

/// Compiled list of ignore patterns.
#[derive(Debug, Clone, Default)]
pub struct IgnoreMatcher {
    patterns: Vec<String>,
    rules: Vec<Rule>,
}

impl IgnoreMatcher {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns: Vec<String> = patterns
            .into_iter()
            .map(|p| p.as_ref().trim().trim_matches('/').to_string())
            .filter(|p| !p.is_empty())
            .collect();
        let rules = patterns.iter().map(|p| Rule::compile(p)).collect();
        Self { patterns, rules }
    }

    /// Matcher with no rules; still honors the reserved exclusions.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether `relative_path` is excluded by a user rule.
    pub fn matches(&self, relative_path: &str) -> bool {
        if self.rules.is_empty() {
            return false;
        }

        let normalized = relative_path.replace('\\', "/");
        let segments: Vec<&str> = normalized
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .collect();

        let mut prefix = String::with_capacity(normalized.len());
        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                prefix.push('/');
            }
            prefix.push_str(segment);

            if self
                .rules
                .iter()
                .any(|r| r.matches(segment) || r.matches(&prefix))
            {
                return true;
            }
        }
        false
    }

    /// Whether the path is always excluded: `.git` at any depth and the
    /// template manifest at the root.
    pub fn is_reserved(relative_path: &str) -> bool {
        let normalized = relative_path.replace('\\', "/");
        let trimmed = normalized.trim_start_matches("./");
        trimmed == TEMPLATE_MANIFEST_FILE || trimmed.split('/').any(|s| s == VCS_DIR)
    }

    /// Combined check used by tree walkers.
    pub fn excludes(&self, relative_path: &str) -> bool {
        Self::is_reserved(relative_path) || self.matches(relative_path)
    }
}

/// One-shot form of [`IgnoreMatcher::matches`].
pub fn matches<S: AsRef<str>>(relative_path: &str, patterns: &[S]) -> bool {
    IgnoreMatcher::new(patterns).matches(relative_path)
}
