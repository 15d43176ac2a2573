use serde::{Deserialize, Serialize};

/// Why an excerpt was picked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefKind {
    ReceiverType,
    InterfaceMethod,
    CounterpartMethod,
    FactoryConstructor,
}

impl RefKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RefKind::ReceiverType => "receiver_type",
            RefKind::InterfaceMethod => "interface_method",
            RefKind::CounterpartMethod => "counterpart_method",
            RefKind::FactoryConstructor => "factory_constructor",
        }
    }

    /// Human-readable rationale attached to excerpts of this kind
    pub fn why(self) -> &'static str {
        match self {
            RefKind::ReceiverType => {
                "Receiver shape clarifies which fields/methods this method depends on."
            }
            RefKind::InterfaceMethod => "Shows the interface contract this method satisfies.",
            RefKind::CounterpartMethod => "A symmetric API clarifies paired usage and trade-offs.",
            RefKind::FactoryConstructor => {
                "Constructor shows how the central type is created/configured."
            }
        }
    }
}

/// Labeled source excerpt explaining a function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextRef {
    /// Repo-relative file path
    pub path: String,

    /// Line range (1-based, inclusive) after clipping
    pub start_line: usize,
    pub end_line: usize,

    /// Normalized excerpt text
    pub code: String,

    pub kind: RefKind,

    /// `T`, `I.M`, `T.Name` or a constructor name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,

    pub why: String,
}
