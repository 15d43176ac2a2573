use crate::error::{ProgramError, Result};
use crate::go::{build_program, is_build_ignored};
use crate::model::Program;
use ignore::WalkBuilder;
use std::path::{Component, Path, PathBuf};

/// Skip generated blobs and vendored dumps that slipped past directory filters
const MAX_FILE_SIZE_BYTES: u64 = 2 * 1024 * 1024;

const MANIFEST: &str = "go.mod";

/// Directory names never descended into
const IGNORED_DIRS: &[&str] = &["vendor", "testdata"];

/// Loads a whole program from a root directory.
///
/// `Ok(None)` means the root has no build manifest, which is a valid,
/// non-fatal outcome.
pub trait ProgramLoader {
    fn load(&self, root: &Path) -> Result<Option<Program>>;
}

/// Loader for Go modules (`go.mod` at the root)
#[derive(Debug, Clone)]
pub struct GoLoader {
    max_file_size: u64,
}

impl Default for GoLoader {
    fn default() -> Self {
        Self {
            max_file_size: MAX_FILE_SIZE_BYTES,
        }
    }
}

impl GoLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Build a program from in-memory `(path, source)` pairs
    pub fn from_sources(module_path: &str, files: &[(&str, &str)]) -> Result<Program> {
        let files = files
            .iter()
            .filter(|(path, source)| Self::is_buildable(path, source))
            .map(|(path, source)| (path.replace('\\', "/"), source.to_string()))
            .collect();
        build_program(PathBuf::new(), module_path, files)
    }

    /// Read the `module` directive of a manifest
    pub fn module_path(manifest: &Path) -> Result<String> {
        let content = std::fs::read_to_string(manifest)?;
        content
            .lines()
            .map(|line| line.split("//").next().unwrap_or("").trim())
            .find_map(|line| {
                line.strip_prefix("module")
                    .filter(|rest| rest.starts_with(char::is_whitespace))
            })
            .map(|rest| rest.trim().trim_matches('"').to_string())
            .filter(|module| !module.is_empty())
            .ok_or_else(|| ProgramError::InvalidManifest {
                path: manifest.to_path_buf(),
                reason: "missing module directive".to_string(),
            })
    }

    fn is_buildable(path: &str, source: &str) -> bool {
        path.ends_with(".go") && !path.ends_with("_test.go") && !is_build_ignored(source)
    }

    fn is_ignored_dir(name: &str) -> bool {
        IGNORED_DIRS.contains(&name) || name.starts_with('_') || name.starts_with('.')
    }

    fn relative_path(root: &Path, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(root).ok()?;
        let parts: Vec<_> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        Some(parts.join("/"))
    }

    /// Collect buildable Go files below `root` (.gitignore aware)
    fn scan(&self, root: &Path) -> Vec<(String, String)> {
        let walk_root = root.to_path_buf();
        let mut builder = WalkBuilder::new(root);
        builder
            .hidden(true)
            .git_ignore(true)
            .git_global(false)
            .git_exclude(true);
        builder.filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            if !is_dir || entry.path() == walk_root {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            if Self::is_ignored_dir(&name) {
                return false;
            }
            // nested module
            !entry.path().join(MANIFEST).is_file()
        });

        let mut files = Vec::new();
        for result in builder.build() {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Failed to read entry: {e}");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("go") {
                continue;
            }
            if let Ok(meta) = entry.metadata() {
                if meta.len() > self.max_file_size {
                    log::debug!(
                        "Skipping large file {} ({} bytes > {})",
                        path.display(),
                        meta.len(),
                        self.max_file_size
                    );
                    continue;
                }
            }
            let Some(relative) = Self::relative_path(root, path) else {
                continue;
            };
            let source = match std::fs::read_to_string(path) {
                Ok(source) => source,
                Err(e) => {
                    log::debug!("Skipping unreadable {}: {e}", path.display());
                    continue;
                }
            };
            if !Self::is_buildable(&relative, &source) {
                log::debug!("Skipping {relative}: test or build-ignored file");
                continue;
            }
            files.push((relative, source));
        }

        log::info!("Found {} Go source files", files.len());
        files
    }
}

impl ProgramLoader for GoLoader {
    fn load(&self, root: &Path) -> Result<Option<Program>> {
        if !root.is_dir() {
            return Err(ProgramError::InvalidRoot(root.display().to_string()));
        }
        let manifest = root.join(MANIFEST);
        if !manifest.is_file() {
            log::info!("No {MANIFEST} under {}, nothing to load", root.display());
            return Ok(None);
        }

        let module_path = Self::module_path(&manifest)?;
        let files = self.scan(root);
        build_program(root.to_path_buf(), &module_path, files).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_module_directive() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manifest = dir.path().join("go.mod");
        std::fs::write(&manifest, "// comment\nmodule example.com/app // trailing\n\ngo 1.22\n")
            .expect("write");
        assert_eq!(
            GoLoader::module_path(&manifest).expect("module"),
            "example.com/app"
        );
    }

    #[test]
    fn missing_module_directive_is_invalid() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manifest = dir.path().join("go.mod");
        std::fs::write(&manifest, "go 1.22\n").expect("write");
        assert!(matches!(
            GoLoader::module_path(&manifest),
            Err(ProgramError::InvalidManifest { .. })
        ));
    }

    #[test]
    fn test_files_are_not_buildable() {
        assert!(GoLoader::is_buildable("a/b.go", "package b"));
        assert!(!GoLoader::is_buildable("a/b_test.go", "package b"));
        assert!(!GoLoader::is_buildable("gen.go", "//go:build ignore\n\npackage main"));
        assert!(!GoLoader::is_buildable("README.md", ""));
    }
}
