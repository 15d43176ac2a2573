use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

arena_id!(
    /// Stable id of a package inside a [`Program`]
    PackageId
);
arena_id!(
    /// Stable id of a compilation unit (one source file)
    UnitId
);
arena_id!(
    /// Stable id of a named type declaration
    TypeId
);
arena_id!(
    /// Stable id of a function, method or interface method object
    FuncId
);

/// 1-based inclusive line range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LineSpan {
    pub start: usize,
    pub end: usize,
}

impl LineSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Position of an identifier, used as the key of the defined-object table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pos {
    pub unit: UnitId,
    pub offset: u32,
}

/// Identifier as it appears in the syntax tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub pos: Pos,
}

/// Object a package-level name (or a declaration identifier) resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Object {
    Type(TypeId),
    Func(FuncId),
}

// ---------------------------------------------------------------------------
// Syntax
// ---------------------------------------------------------------------------

/// Top-level declaration of a compilation unit, in source order
#[derive(Debug, Clone)]
pub enum Decl {
    Type(TypeSpec),
    Func(FuncSpec),
}

#[derive(Debug, Clone)]
pub struct TypeSpec {
    pub name: Ident,
    pub span: LineSpan,
    pub shape: TypeShape,
}

/// Syntactic shape of a type spec's right-hand side
#[derive(Debug, Clone)]
pub enum TypeShape {
    Struct,
    Interface(Vec<InterfaceMember>),
    Other,
}

#[derive(Debug, Clone)]
pub enum InterfaceMember {
    /// Explicitly declared method
    Method { name: Ident, span: LineSpan },
    /// Embedded interface or type constraint element
    Embedded { span: LineSpan },
}

#[derive(Debug, Clone)]
pub struct FuncSpec {
    pub name: Ident,
    pub span: LineSpan,
}

// ---------------------------------------------------------------------------
// Types and objects
// ---------------------------------------------------------------------------

/// Resolved type expression. Structural equality is type identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Named(TypeId),
    Pointer(Box<TypeRef>),
    Slice(Box<TypeRef>),
    Map(Box<TypeRef>, Box<TypeRef>),
    /// Named type declared outside the loaded program (e.g. the standard library)
    External { package: String, name: String },
    /// Builtin, type parameter, or a shape the checker keeps as normalized text
    Opaque(String),
}

impl TypeRef {
    /// Strip one level of pointer indirection
    pub fn deref(&self) -> &TypeRef {
        match self {
            TypeRef::Pointer(inner) => inner,
            other => other,
        }
    }

    /// Named type behind at most one pointer
    pub fn named(&self) -> Option<TypeId> {
        match self.deref() {
            TypeRef::Named(id) => Some(*id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Signature {
    pub params: Vec<TypeRef>,
    pub results: Vec<TypeRef>,
    pub variadic: bool,
}

impl Signature {
    /// Whether a call with `arity` arguments could target this signature
    pub fn accepts_arity(&self, arity: usize) -> bool {
        if self.variadic {
            arity + 1 >= self.params.len()
        } else {
            arity == self.params.len()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: Option<String>,
    pub ty: TypeRef,
    pub embedded: bool,
}

#[derive(Debug, Clone)]
pub enum Underlying {
    Struct(Vec<Field>),
    Interface {
        /// Explicitly declared methods (abstract function objects)
        methods: Vec<FuncId>,
        embeds: Vec<TypeRef>,
    },
    Other(TypeRef),
}

#[derive(Debug, Clone)]
pub struct NamedType {
    pub id: TypeId,
    pub package: PackageId,
    pub name: String,
    pub underlying: Underlying,
    /// Concrete methods declared with this type as receiver
    pub methods: Vec<FuncId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuncKind {
    Function,
    Method { recv: TypeId, pointer: bool },
    /// Method declared by an interface type
    Abstract { iface: TypeId },
}

#[derive(Debug, Clone)]
pub struct FuncObj {
    pub id: FuncId,
    pub package: PackageId,
    pub name: String,
    pub kind: FuncKind,
    pub signature: Signature,
    pub unit: UnitId,
    pub span: LineSpan,
}

impl FuncObj {
    /// Receiver named type and pointer flag, `None` for free functions
    pub fn receiver(&self) -> Option<(TypeId, bool)> {
        match self.kind {
            FuncKind::Method { recv, pointer } => Some((recv, pointer)),
            _ => None,
        }
    }

    pub fn is_concrete(&self) -> bool {
        !matches!(self.kind, FuncKind::Abstract { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallTarget {
    /// Call resolvable from syntax and types alone
    Static(FuncId),
    /// Method call through an interface value
    Interface { iface: TypeId, method: String },
    /// Method call on a receiver whose type the checker could not place
    Dynamic { method: String, arity: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub caller: FuncId,
    pub line: usize,
    pub target: CallTarget,
}

// ---------------------------------------------------------------------------
// Packages, units, program
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Package {
    pub id: PackageId,
    /// Import path (module path + directory)
    pub path: String,
    pub name: String,
    /// Directory relative to the program root ("" for the root)
    pub dir: String,
    pub units: Vec<UnitId>,
    pub(crate) scope: BTreeMap<String, Object>,
}

impl Package {
    /// Look up a package-level name
    pub fn lookup(&self, name: &str) -> Option<Object> {
        self.scope.get(name).copied()
    }
}

#[derive(Debug, Clone)]
pub struct Unit {
    pub id: UnitId,
    pub package: PackageId,
    /// Repo-relative, `/`-separated path
    pub path: String,
    pub decls: Vec<Decl>,
    pub source: String,
}

/// Whole type-checked program: arenas of packages, units, types and
/// functions plus the resolved call sites.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub(crate) root: PathBuf,
    pub(crate) module_path: String,
    pub(crate) packages: Vec<Package>,
    pub(crate) units: Vec<Unit>,
    pub(crate) types: Vec<NamedType>,
    pub(crate) funcs: Vec<FuncObj>,
    pub(crate) calls: Vec<CallSite>,
    pub(crate) defs: HashMap<Pos, Object>,
}

impl Program {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn module_path(&self) -> &str {
        &self.module_path
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn package(&self, id: PackageId) -> &Package {
        &self.packages[id.index()]
    }

    pub fn package_by_path(&self, path: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.path == path)
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn unit(&self, id: UnitId) -> &Unit {
        &self.units[id.index()]
    }

    pub fn types(&self) -> &[NamedType] {
        &self.types
    }

    pub fn named(&self, id: TypeId) -> &NamedType {
        &self.types[id.index()]
    }

    pub fn funcs(&self) -> &[FuncObj] {
        &self.funcs
    }

    pub fn func(&self, id: FuncId) -> &FuncObj {
        &self.funcs[id.index()]
    }

    pub fn calls(&self) -> &[CallSite] {
        &self.calls
    }

    /// Defined-object table lookup for a declaration identifier
    pub fn def(&self, ident: &Ident) -> Option<Object> {
        self.defs.get(&ident.pos).copied()
    }

    /// Import path of the package declaring `id`
    pub fn type_package_path(&self, id: TypeId) -> &str {
        &self.package(self.named(id).package).path
    }

    /// Repo-relative file a function is declared in
    pub fn func_path(&self, id: FuncId) -> &str {
        &self.unit(self.func(id).unit).path
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
