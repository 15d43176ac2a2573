use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use xref_context::ContextRefConfig;
use xref_index::CounterpartRules;

/// Config file looked up in the scanned root when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = ".xref.toml";

pub const DEFAULT_MAX_CALLERS: usize = 10;
pub const DEFAULT_MAX_CALLEES: usize = 10;

/// Settings shared by every subcommand; flags override file values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XrefConfig {
    pub max_callers: usize,
    pub max_callees: usize,

    /// Emit unexported functions too
    pub include_private: bool,

    pub context_refs: ContextRefConfig,
}

impl Default for XrefConfig {
    fn default() -> Self {
        Self {
            max_callers: DEFAULT_MAX_CALLERS,
            max_callees: DEFAULT_MAX_CALLEES,
            include_private: false,
            context_refs: ContextRefConfig::default(),
        }
    }
}

impl XrefConfig {
    /// Read `explicit` if given (must exist), else `<root>/.xref.toml`
    /// when present, else defaults.
    pub fn load(explicit: Option<&Path>, root: &Path) -> Result<Self> {
        let path: PathBuf = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = root.join(DEFAULT_CONFIG_FILE);
                if !candidate.is_file() {
                    return Ok(Self::default());
                }
                candidate
            }
        };

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Turn the counterpart stage on, falling back to the common antonym
    /// set when no rules were configured
    pub fn enable_counterparts(&mut self) {
        self.context_refs.enable_counterparts = true;
        if self.context_refs.counterparts.is_empty() {
            self.context_refs.counterparts = CounterpartRules::common();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_in_root_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = XrefConfig::load(None, dir.path()).unwrap();
        assert_eq!(config, XrefConfig::default());
    }

    #[test]
    fn explicit_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(XrefConfig::load(Some(&missing), dir.path()).is_err());
    }

    #[test]
    fn reads_root_file_with_nested_tables() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            r#"
max_callers = 3

[context_refs]
max_refs = 4
enable_counterparts = true

[context_refs.counterparts]
load = ["store"]
"#,
        )
        .unwrap();

        let config = XrefConfig::load(None, dir.path()).unwrap();
        assert_eq!(config.max_callers, 3);
        assert_eq!(config.max_callees, DEFAULT_MAX_CALLEES);
        assert_eq!(config.context_refs.max_refs, 4);
        assert_eq!(config.context_refs.max_lines, 30);
        assert!(config.context_refs.counterparts.is_counterpart("LoadAll", "StoreAll"));
    }

    #[test]
    fn enabling_counterparts_keeps_configured_rules() {
        let mut config = XrefConfig::default();
        config.enable_counterparts();
        assert!(config.context_refs.enable_counterparts);
        assert!(config.context_refs.counterparts.is_counterpart("Open", "Close"));

        let mut custom = XrefConfig::default();
        custom.context_refs.counterparts = CounterpartRules::new().with_pair("load", ["store"]);
        custom.enable_counterparts();
        assert_eq!(custom.context_refs.counterparts.len(), 1);
    }
}
