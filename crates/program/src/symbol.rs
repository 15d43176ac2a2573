//! Symbol labels shared by the index, the call graph and the CLI.
//!
//! Labels follow the receiver-qualified form `(T).M` / `(*T).M`, bare
//! `F` for free functions.

use crate::model::{FuncId, Program};
use serde::{Deserialize, Serialize};

/// Function as seen by the surrounding pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRecord {
    /// Repo-relative file path
    pub path: String,
    /// Bare function or method name
    pub name: String,
    /// Parenthesized receiver text, e.g. `(*T)` or `(T)`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recv: Option<String>,
}

impl FunctionRecord {
    pub fn new(path: impl Into<String>, name: impl Into<String>, recv: Option<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            recv,
        }
    }

    /// Receiver base type name: `(*T)` and `(T)` both give `T`
    pub fn recv_base_type(&self) -> Option<&str> {
        let recv = self.recv.as_deref()?.trim();
        let inner = recv.strip_prefix('(')?.strip_suffix(')')?.trim();
        let base = inner.trim_start_matches('*').trim();
        (!base.is_empty()).then_some(base)
    }

    /// Label in the call graph symbol form
    pub fn symbol(&self) -> String {
        match self.recv.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            Some(recv) => format!("{recv}.{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// Split a query symbol into (receiver hint, bare name).
///
/// `"(*T).M"` gives `("*T", "M")`, `"pkg.F"` gives `("", "F")`; anything
/// else is treated as a bare name.
pub fn parse_input_symbol(symbol: &str) -> (String, String) {
    let symbol = symbol.trim();
    if let Some(rest) = symbol.strip_prefix('(') {
        if let Some(close) = rest.find(").") {
            let recv = rest[..close].trim();
            let name = rest[close + 2..].trim();
            if !recv.is_empty() && !name.is_empty() {
                return (recv.to_string(), name.to_string());
            }
        }
        return (String::new(), symbol.to_string());
    }
    match symbol.rfind('.') {
        Some(dot) => (String::new(), symbol[dot + 1..].trim().to_string()),
        None => (String::new(), symbol.to_string()),
    }
}

/// Receiver label of a method: `T` or `*T`; `None` for other functions
pub fn recv_label(program: &Program, id: FuncId) -> Option<String> {
    let (recv, pointer) = program.func(id).receiver()?;
    let name = &program.named(recv).name;
    Some(if pointer {
        format!("*{name}")
    } else {
        name.clone()
    })
}

/// Display label of a function: `Name`, `(T).Name` or `(*T).Name`
pub fn func_label(program: &Program, id: FuncId) -> String {
    let name = &program.func(id).name;
    match recv_label(program, id) {
        Some(recv) => format!("({recv}).{name}"),
        None => name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parsed(s: &str) -> (String, String) {
        parse_input_symbol(s)
    }

    #[test]
    fn parses_receiver_qualified_symbols() {
        assert_eq!(parsed("(*Store).Get"), ("*Store".into(), "Get".into()));
        assert_eq!(parsed(" (Store).Get "), ("Store".into(), "Get".into()));
    }

    #[test]
    fn package_qualified_symbol_keeps_last_segment() {
        assert_eq!(parsed("store.NewStore"), (String::new(), "NewStore".into()));
        assert_eq!(parsed("Run"), (String::new(), "Run".into()));
    }

    #[test]
    fn malformed_symbol_is_a_bare_name() {
        assert_eq!(parsed("(Store"), (String::new(), "(Store".into()));
        assert_eq!(parsed("().Get"), (String::new(), "().Get".into()));
    }

    #[test]
    fn record_receiver_base_type() {
        let ptr = FunctionRecord::new("a.go", "Get", Some("(*Store)".into()));
        let val = FunctionRecord::new("a.go", "Len", Some("( Store )".into()));
        let free = FunctionRecord::new("a.go", "Run", None);
        assert_eq!(ptr.recv_base_type(), Some("Store"));
        assert_eq!(val.recv_base_type(), Some("Store"));
        assert_eq!(free.recv_base_type(), None);
        assert_eq!(ptr.symbol(), "(*Store).Get");
        assert_eq!(free.symbol(), "Run");
    }
}
