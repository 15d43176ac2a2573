use serde::{Deserialize, Serialize};
use xref_program::{FuncId, TypeId};

/// Named data-type declaration (anything that is not an interface)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDecl {
    /// Import path of the declaring package
    pub package: String,

    /// Repo-relative file path
    pub file: String,

    /// Line range (1-based, inclusive)
    pub start_line: usize,
    pub end_line: usize,

    pub name: String,

    /// Underlying shape is a struct
    pub is_struct: bool,
}

/// Method explicitly declared by an interface (never an embedded member)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IfaceMethod {
    pub name: String,
    pub start_line: usize,
    pub end_line: usize,

    /// Abstract method object, when the checker resolved it
    pub func: Option<FuncId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceDecl {
    pub package: String,
    pub file: String,
    pub start_line: usize,
    pub end_line: usize,
    pub name: String,

    /// Directly declared methods, in source order
    pub methods: Vec<IfaceMethod>,
}

impl InterfaceDecl {
    pub fn method(&self, name: &str) -> Option<&IfaceMethod> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn declares(&self, name: &str) -> bool {
        self.method(name).is_some()
    }
}

/// Function or method declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuncDecl {
    pub package: String,
    pub file: String,
    pub start_line: usize,
    pub end_line: usize,
    pub name: String,

    pub func: FuncId,

    /// Receiver named type with pointer stripped; `None` for free functions
    pub receiver: Option<TypeId>,

    /// Named component of each result type; unnamed results are dropped
    pub results: Vec<TypeId>,
}

impl FuncDecl {
    pub fn is_method(&self) -> bool {
        self.receiver.is_some()
    }
}

/// Receiver resolved for a method query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiverMatch<'a> {
    pub ty: TypeId,
    /// Import path of the receiver's package
    pub package: &'a str,
}
