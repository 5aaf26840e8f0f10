//! Glob expansion over the local filesystem.
//!
//! Patterns use `*` (any run of characters), `?` (one character) and
//! `[seq]` / `[!seq]` character classes within a single path component. A
//! `**` component is the same as `*`; matching never crosses a `/`. The
//! leading components without wildcards name the directory the walk starts
//! from; each remaining component is matched against the entries at its
//! depth. Names starting with `.` only match a pattern component that itself
//! starts with `.`.

use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;
use wildmatch::WildMatch;

use crate::config::GlobOrder;
use crate::error::OpenError;

/// True when `text` contains a wildcard character or a class opener.
pub fn has_wildcards(text: &str) -> bool {
    text.contains(['*', '?', '['])
}

// =============================================================================
// Component Matching
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Literal(char),
    AnyChar,
    AnyRun,
    Class { negated: bool, ranges: Vec<(char, char)> },
}

impl Token {
    fn matches(&self, c: char) -> bool {
        match self {
            Token::Literal(l) => *l == c,
            Token::AnyChar => true,
            Token::AnyRun => false,
            Token::Class { negated, ranges } => {
                ranges.iter().any(|&(lo, hi)| lo <= c && c <= hi) != *negated
            }
        }
    }
}

/// Parse a component containing `[`. An unterminated `[` is a literal.
fn tokenize(component: &str) -> Vec<Token> {
    let chars: Vec<char> = component.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => {
                if tokens.last() != Some(&Token::AnyRun) {
                    tokens.push(Token::AnyRun);
                }
                i += 1;
            }
            '?' => {
                tokens.push(Token::AnyChar);
                i += 1;
            }
            '[' => match parse_class(&chars, i) {
                Some((token, next)) => {
                    tokens.push(token);
                    i = next;
                }
                None => {
                    tokens.push(Token::Literal('['));
                    i += 1;
                }
            },
            c => {
                tokens.push(Token::Literal(c));
                i += 1;
            }
        }
    }
    tokens
}

/// Parse the class opening at `chars[start]`, returning it and the index past
/// its closing `]`. A `]` right after the opener (or `!`) is a member.
fn parse_class(chars: &[char], start: usize) -> Option<(Token, usize)> {
    let mut i = start + 1;
    let negated = chars.get(i) == Some(&'!');
    if negated {
        i += 1;
    }
    let first = i;
    let mut ranges = Vec::new();
    while i < chars.len() {
        let c = chars[i];
        if c == ']' && i > first {
            return Some((Token::Class { negated, ranges }, i + 1));
        }
        if chars.get(i + 1) == Some(&'-') && chars.get(i + 2).is_some_and(|&h| h != ']') {
            ranges.push((c, chars[i + 2]));
            i += 3;
        } else {
            ranges.push((c, c));
            i += 1;
        }
    }
    None
}

fn match_tokens(tokens: &[Token], name: &[char]) -> bool {
    let (mut t, mut n) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;
    while n < name.len() {
        match tokens.get(t) {
            Some(Token::AnyRun) => {
                backtrack = Some((t, n));
                t += 1;
            }
            Some(token) if token.matches(name[n]) => {
                t += 1;
                n += 1;
            }
            _ => match backtrack {
                Some((star, start)) => {
                    t = star + 1;
                    n = start + 1;
                    backtrack = Some((star, start + 1));
                }
                None => return false,
            },
        }
    }
    tokens[t..].iter().all(|token| *token == Token::AnyRun)
}

/// Matcher for one path component.
#[derive(Debug)]
enum ComponentMatcher {
    Wild(WildMatch),
    Classes(Vec<Token>),
}

impl ComponentMatcher {
    fn new(component: &str) -> Self {
        if component.contains('[') {
            ComponentMatcher::Classes(tokenize(component))
        } else {
            ComponentMatcher::Wild(WildMatch::new(component))
        }
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            ComponentMatcher::Wild(pattern) => pattern.matches(name),
            ComponentMatcher::Classes(tokens) => {
                let name: Vec<char> = name.chars().collect();
                match_tokens(tokens, &name)
            }
        }
    }
}

// =============================================================================
// Patterns
// =============================================================================

/// A pattern split into a literal base directory and per-depth matchers.
#[derive(Debug)]
struct Pattern {
    base: PathBuf,
    implicit_base: bool,
    components: Vec<(bool, ComponentMatcher)>,
}

impl Pattern {
    fn parse(pattern: &str) -> Result<Self, OpenError> {
        let invalid = |reason: &str| OpenError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        if pattern.is_empty() {
            return Err(invalid("pattern is empty"));
        }

        let mut base = PathBuf::new();
        let mut components = Vec::new();
        for component in Path::new(pattern).components() {
            let text = component.as_os_str().to_string_lossy();
            if components.is_empty() && !has_wildcards(&text) {
                base.push(component);
                continue;
            }
            match component {
                Component::Normal(_) => {
                    components.push((text.starts_with('.'), ComponentMatcher::new(&text)));
                }
                _ => return Err(invalid("'.' and '..' may not follow a wildcard")),
            }
        }

        let implicit_base = base.as_os_str().is_empty();
        if implicit_base {
            base.push(".");
        }
        Ok(Self {
            base,
            implicit_base,
            components,
        })
    }

    fn matches(&self, depth: usize, name: &str) -> bool {
        let Some((allows_hidden, matcher)) = self.components.get(depth - 1) else {
            return false;
        };
        if name.starts_with('.') && !allows_hidden {
            return false;
        }
        matcher.matches(name)
    }
}

/// Expand `pattern` to the files it matches.
///
/// A pattern without wildcards matches itself when it names an existing
/// file. Directories are never returned. Unreadable directories are logged
/// and skipped.
///
/// # Errors
///
/// Returns `InvalidPattern` for an empty pattern and for `.` or `..` after a
/// wildcard component. Matching nothing is not an error here.
pub fn expand(pattern: &str, order: GlobOrder) -> Result<Vec<PathBuf>, OpenError> {
    let parsed = Pattern::parse(pattern)?;

    if parsed.components.is_empty() {
        let path = PathBuf::from(pattern);
        return Ok(if path.is_file() { vec![path] } else { Vec::new() });
    }
    if !parsed.base.is_dir() {
        debug!(pattern, base = %parsed.base.display(), "glob base is not a directory");
        return Ok(Vec::new());
    }

    // Every depth goes through the filter so directory components prune the walk
    let depth = parsed.components.len();
    let mut walker = WalkDir::new(&parsed.base).max_depth(depth).follow_links(true);
    if order == GlobOrder::Sorted {
        walker = walker.sort_by_file_name();
    }

    let mut matches = Vec::new();
    let entries = walker.into_iter().filter_entry(|entry| {
        entry.depth() == 0
            || entry
                .file_name()
                .to_str()
                .is_some_and(|name| parsed.matches(entry.depth(), name))
    });

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(pattern, error = %err, "skipping unreadable glob entry");
                continue;
            }
        };
        if entry.depth() != depth || !entry.file_type().is_file() {
            continue;
        }

        let path = if parsed.implicit_base {
            entry
                .path()
                .strip_prefix(&parsed.base)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| entry.path().to_path_buf())
        } else {
            entry.into_path()
        };
        matches.push(path);
    }

    debug!(pattern, matches = matches.len(), ?order, "expanded glob");
    Ok(matches)
}
