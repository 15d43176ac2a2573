use crate::model::Program;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://[^\s`'\x22)]+").expect("valid URL pattern"));

/// Line-addressable view over source files
pub trait LineSource {
    /// Lines of `path` (repo-relative), index 0 is line 1
    fn lines(&self, path: &str) -> Option<&[String]>;
}

/// In-memory line cache keyed by repo-relative path
#[derive(Debug, Clone, Default)]
pub struct SourceCache {
    files: HashMap<String, Vec<String>>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache every unit of a loaded program
    pub fn from_program(program: &Program) -> Self {
        let mut cache = Self::new();
        for unit in program.units() {
            cache.insert(unit.path.clone(), &unit.source);
        }
        cache
    }

    pub fn insert(&mut self, path: impl Into<String>, source: &str) {
        let lines = source
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect();
        self.files.insert(path.into(), lines);
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl LineSource for SourceCache {
    fn lines(&self, path: &str) -> Option<&[String]> {
        self.files.get(path).map(Vec::as_slice)
    }
}

/// Normalize an excerpt: LF newlines, no trailing whitespace, URLs redacted
pub fn normalize_code(code: &str) -> String {
    code.replace("\r\n", "\n")
        .replace('\r', "\n")
        .split('\n')
        .map(|line| URL_RE.replace_all(line.trim_end(), "/* redacted */"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalize_trims_and_redacts() {
        let code = "func F() {  \r\n\t// see https://example.com/docs?x=1 for details\r\n}\t";
        assert_eq!(
            normalize_code(code),
            "func F() {\n\t// see /* redacted */ for details\n}"
        );
    }

    #[test]
    fn normalize_handles_lone_carriage_returns() {
        assert_eq!(normalize_code("a\rb \r"), "a\nb\n");
    }

    #[test]
    fn cache_splits_lines() {
        let mut cache = SourceCache::new();
        cache.insert("a.go", "package a\r\n\nfunc A() {}\n");
        let lines = cache.lines("a.go").expect("cached");
        assert_eq!(lines[0], "package a");
        assert_eq!(lines[2], "func A() {}");
        assert!(cache.lines("b.go").is_none());
    }
}
