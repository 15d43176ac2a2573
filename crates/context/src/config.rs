use serde::{Deserialize, Serialize};
use xref_index::CounterpartRules;

pub const DEFAULT_MAX_REFS: usize = 2;
pub const DEFAULT_MAX_LINES: usize = 30;
pub const HARD_CAP_MAX_REFS: usize = 8;
pub const HARD_CAP_MAX_LINES: usize = 120;

/// Configuration for context reference selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextRefConfig {
    /// Maximum references per function (0 = default)
    pub max_refs: usize,

    /// Maximum lines per excerpt (0 = default)
    pub max_lines: usize,

    /// Antonym rules for the counterpart stage
    pub counterparts: CounterpartRules,

    /// Run the counterpart stage
    pub enable_counterparts: bool,
}

impl Default for ContextRefConfig {
    fn default() -> Self {
        Self {
            max_refs: DEFAULT_MAX_REFS,
            max_lines: DEFAULT_MAX_LINES,
            counterparts: CounterpartRules::default(),
            enable_counterparts: false,
        }
    }
}

impl ContextRefConfig {
    /// Counterpart stage enabled with the common antonym set
    pub fn with_counterparts() -> Self {
        Self {
            counterparts: CounterpartRules::common(),
            enable_counterparts: true,
            ..Default::default()
        }
    }

    /// Fill zero values with defaults and clamp to the hard ceilings
    pub fn clamped(mut self) -> Self {
        self.max_refs = clamp_or_default(self.max_refs, DEFAULT_MAX_REFS, HARD_CAP_MAX_REFS);
        self.max_lines = clamp_or_default(self.max_lines, DEFAULT_MAX_LINES, HARD_CAP_MAX_LINES);
        self
    }
}

fn clamp_or_default(value: usize, default: usize, cap: usize) -> usize {
    if value == 0 {
        default
    } else {
        value.min(cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_means_default_and_large_values_clamp() {
        let config = ContextRefConfig {
            max_refs: 0,
            max_lines: 500,
            ..Default::default()
        }
        .clamped();
        assert_eq!(config.max_refs, DEFAULT_MAX_REFS);
        assert_eq!(config.max_lines, HARD_CAP_MAX_LINES);

        let config = ContextRefConfig {
            max_refs: 20,
            max_lines: 10,
            ..Default::default()
        }
        .clamped();
        assert_eq!(config.max_refs, HARD_CAP_MAX_REFS);
        assert_eq!(config.max_lines, 10);
    }

    #[test]
    fn counterparts_are_off_by_default() {
        let config = ContextRefConfig::default();
        assert!(!config.enable_counterparts);
        assert!(config.counterparts.is_empty());
        assert!(ContextRefConfig::with_counterparts().enable_counterparts);
    }
}
