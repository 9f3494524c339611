//! Pattern Classifier
//!
//! Ant-style globs that mark task paths as hidden from evaluation or protected
//! from student edits.
//!
//! - `**` matches zero or more whole path segments
//! - `*` matches any run of characters inside one segment
//! - `?` matches exactly one character inside one segment
//!
//! Matching is case-sensitive. Patterns and paths are compared in normalized
//! form, so `/src/` and `src` are the same pattern.

use crate::error::PatternError;
use crate::path;
use serde::{Deserialize, Serialize};

const GLOBSTAR: &str = "**";

/// Validated, ordered list of glob patterns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct PatternList {
    patterns: Vec<String>,
}

impl PatternList {
    /// Validate and normalize `patterns`. The first invalid entry rejects the list.
    pub fn new<I, S>(patterns: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .enumerate()
            .map(|(position, raw)| validate(position, raw.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.patterns
    }
}

impl TryFrom<Vec<String>> for PatternList {
    type Error = PatternError;

    fn try_from(patterns: Vec<String>) -> Result<Self, Self::Error> {
        PatternList::new(patterns)
    }
}

impl From<PatternList> for Vec<String> {
    fn from(list: PatternList) -> Self {
        list.patterns
    }
}

fn validate(position: usize, raw: &str) -> Result<String, PatternError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PatternError::Empty(position));
    }
    let invalid = |reason: &str| PatternError::InvalidSyntax {
        pattern: raw.to_string(),
        reason: reason.to_string(),
    };
    if trimmed.chars().any(char::is_control) {
        return Err(invalid("control characters are not allowed"));
    }

    let normalized = path::normalize(trimmed);
    if normalized.is_empty() {
        return Err(invalid("pattern has no path segments"));
    }
    for segment in normalized.split('/') {
        if segment == ".." {
            return Err(invalid("'..' segments are not allowed"));
        }
        if segment != GLOBSTAR && segment.contains(GLOBSTAR) {
            return Err(invalid("'**' must be a whole path segment"));
        }
    }
    Ok(normalized)
}

/// One pattern segment, pre-split for matching.
#[derive(Debug, Clone)]
enum Segment {
    Globstar,
    Glob(Vec<char>),
}

/// Compiled form of a [`PatternList`]
#[derive(Debug, Clone, Default)]
pub struct PatternMatcher {
    patterns: Vec<Vec<Segment>>,
}

impl PatternMatcher {
    pub fn compile(list: &PatternList) -> Self {
        let patterns = list
            .iter()
            .map(|pattern| {
                pattern
                    .split('/')
                    .map(|segment| match segment {
                        GLOBSTAR => Segment::Globstar,
                        glob => Segment::Glob(glob.chars().collect()),
                    })
                    .collect()
            })
            .collect();
        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// True iff any pattern matches `file_path`.
    pub fn matches(&self, file_path: &str) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let normalized = path::normalize(file_path);
        let parts: Vec<Vec<char>> = normalized
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| s.chars().collect())
            .collect();
        self.patterns
            .iter()
            .any(|pattern| match_parts(&parts, pattern))
    }
}

/// Match path segments against pattern segments, expanding `**`.
fn match_parts(path: &[Vec<char>], pattern: &[Segment]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((Segment::Globstar, rest)) => {
            if rest.is_empty() {
                return true;
            }
            (0..=path.len()).any(|skip| match_parts(&path[skip..], rest))
        }
        Some((Segment::Glob(glob), rest)) => match path.split_first() {
            Some((segment, tail)) => match_segment(segment, glob) && match_parts(tail, rest),
            None => false,
        },
    }
}

/// Match one segment against a glob with `*` and `?`, backtracking on the last star.
fn match_segment(segment: &[char], glob: &[char]) -> bool {
    let (mut si, mut gi) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while si < segment.len() {
        match glob.get(gi) {
            Some('?') => {
                si += 1;
                gi += 1;
            }
            Some('*') => {
                star = Some((gi, si));
                gi += 1;
            }
            Some(c) if *c == segment[si] => {
                si += 1;
                gi += 1;
            }
            _ => match star {
                Some((star_gi, star_si)) => {
                    gi = star_gi + 1;
                    si = star_si + 1;
                    star = Some((star_gi, star_si + 1));
                }
                None => return false,
            },
        }
    }

    glob[gi..].iter().all(|c| *c == '*')
}

/// How a path is treated when building the evaluation view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Hidden,
    Protected,
    Visible,
}

/// Hidden and protected rules of one task
#[derive(Debug, Clone, Default)]
pub struct FilePolicy {
    hidden: PatternMatcher,
    protected: PatternMatcher,
}

impl FilePolicy {
    pub fn new(hidden: &PatternList, protected: &PatternList) -> Self {
        Self {
            hidden: PatternMatcher::compile(hidden),
            protected: PatternMatcher::compile(protected),
        }
    }

    /// Classify a path. Hidden takes precedence over protected.
    pub fn classify(&self, file_path: &str) -> Classification {
        if self.hidden.matches(file_path) {
            Classification::Hidden
        } else if self.protected.matches(file_path) {
            Classification::Protected
        } else {
            Classification::Visible
        }
    }

    pub fn has_protected(&self) -> bool {
        !self.protected.is_empty()
    }
}
