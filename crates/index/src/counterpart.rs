use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Antonym rules for counterpart-method lookup.
///
/// Maps a name fragment to the fragments that pair with it
/// (`open -> [close]`). Matching is ASCII case-insensitive and works in
/// both directions, so `Close` finds `Open` through the same entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CounterpartRules {
    pairs: BTreeMap<String, Vec<String>>,
}

impl CounterpartRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Curated set of common API antonyms
    pub fn common() -> Self {
        const PAIRS: &[(&str, &[&str])] = &[
            ("open", &["close"]),
            ("start", &["stop", "end"]),
            ("begin", &["end", "finish"]),
            ("enable", &["disable"]),
            ("lock", &["unlock"]),
            ("add", &["remove", "delete", "del"]),
            ("append", &["remove", "truncate"]),
            ("push", &["pop"]),
            ("inc", &["dec"]),
            ("incr", &["decr"]),
            ("increase", &["decrease"]),
            ("show", &["hide"]),
            ("attach", &["detach"]),
            ("connect", &["disconnect"]),
            ("mount", &["unmount"]),
            ("enter", &["exit", "leave"]),
            ("up", &["down"]),
            ("next", &["prev", "previous"]),
            ("marshal", &["unmarshal"]),
            ("encode", &["decode"]),
            ("serialize", &["deserialize"]),
            ("sugar", &["desugar"]),
            ("with", &["without"]),
            ("get", &["set"]),
        ];

        PAIRS.iter().fold(Self::new(), |rules, (fragment, counterparts)| {
            rules.with_pair(*fragment, counterparts.iter().copied())
        })
    }

    /// Add (or extend) a rule
    pub fn with_pair<I, S>(mut self, fragment: impl Into<String>, counterparts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pairs
            .entry(fragment.into().to_ascii_lowercase())
            .or_default()
            .extend(counterparts.into_iter().map(|c| c.into().to_ascii_lowercase()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Lowercased fragments a counterpart of `method` may start with
    pub fn counterparts_of(&self, method: &str) -> Vec<String> {
        let mut want = Vec::new();
        for (fragment, counterparts) in &self.pairs {
            if starts_with_ignore_case(method, fragment) {
                want.extend(counterparts.iter().map(|c| c.to_ascii_lowercase()));
            }
            if counterparts
                .iter()
                .any(|c| starts_with_ignore_case(method, c))
            {
                want.push(fragment.to_ascii_lowercase());
            }
        }
        want.sort();
        want.dedup();
        want
    }

    /// Whether `candidate` is a counterpart of `method` under these rules
    pub fn is_counterpart(&self, method: &str, candidate: &str) -> bool {
        method != candidate
            && self
                .counterparts_of(method)
                .iter()
                .any(|fragment| starts_with_ignore_case(candidate, fragment))
    }
}

fn starts_with_ignore_case(name: &str, fragment: &str) -> bool {
    !fragment.is_empty()
        && name.len() >= fragment.len()
        && name.as_bytes()[..fragment.len()].eq_ignore_ascii_case(fragment.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_rules_match_nothing() {
        let rules = CounterpartRules::default();
        assert!(rules.counterparts_of("Open").is_empty());
        assert!(!rules.is_counterpart("Open", "Close"));
    }

    #[test]
    fn matches_both_directions_ignoring_case() {
        let rules = CounterpartRules::common();
        assert_eq!(rules.counterparts_of("OpenFile"), vec!["close".to_string()]);
        assert_eq!(rules.counterparts_of("Close"), vec!["open".to_string()]);
        assert!(rules.is_counterpart("Lock", "Unlock"));
        assert!(rules.is_counterpart("Unlock", "Lock"));
        assert!(rules.is_counterpart("AddItem", "RemoveItem"));
    }

    #[test]
    fn method_is_never_its_own_counterpart() {
        let rules = CounterpartRules::new().with_pair("get", ["getter"]);
        assert!(!rules.is_counterpart("Get", "Get"));
        assert!(rules.is_counterpart("Get", "Getter"));
    }

    #[test]
    fn deserializes_from_plain_table() {
        let rules: CounterpartRules =
            serde_json::from_str(r#"{"open": ["close", "shutdown"]}"#).expect("rules");
        assert_eq!(rules.counterparts_of("Shutdown"), vec!["open".to_string()]);
    }
}
