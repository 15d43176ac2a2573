use crate::counterpart::CounterpartRules;
use crate::types::{FuncDecl, IfaceMethod, InterfaceDecl, ReceiverMatch, TypeDecl};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use xref_program::{
    Decl, FuncSpec, InterfaceMember, Object, Program, ProgramLoader, TypeId, TypeShape, TypeSpec,
    Underlying,
};

/// Prefix a free function must carry to count as a constructor
const CONSTRUCTOR_PREFIX: &str = "New";

/// Read-only declaration tables built in one pass over a program.
///
/// Construction never fails: a missing or broken program yields empty
/// tables and every query answers "not found".
#[derive(Debug, Default)]
pub struct Index {
    program: Option<Arc<Program>>,

    // package path -> decls
    types_by_pkg: BTreeMap<String, Vec<TypeDecl>>,
    ifaces_by_pkg: BTreeMap<String, Vec<InterfaceDecl>>,
    funcs_by_pkg: BTreeMap<String, Vec<FuncDecl>>,

    // file path -> decls
    funcs_by_file: HashMap<String, Vec<FuncDecl>>,

    // (package path, name) -> type decl
    type_by_name: HashMap<(String, String), TypeDecl>,
}

impl Index {
    /// Index with empty tables
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the program at `root` and index it, degrading to an empty
    /// index when there is no manifest or loading fails.
    pub fn load(root: &Path, loader: &dyn ProgramLoader) -> Self {
        match loader.load(root) {
            Ok(Some(program)) => Self::build(Arc::new(program)),
            Ok(None) => {
                log::info!("No program under {}, using empty index", root.display());
                Self::empty()
            }
            Err(e) => {
                log::warn!("Failed to load program under {}: {e}", root.display());
                Self::empty()
            }
        }
    }

    /// Walk every unit once, in file then position order
    pub fn build(program: Arc<Program>) -> Self {
        let mut index = Self::empty();

        for unit in program.units() {
            let package = program.package(unit.package).path.as_str();
            for decl in &unit.decls {
                match decl {
                    Decl::Type(spec) => index.add_type(&program, package, &unit.path, spec),
                    Decl::Func(spec) => index.add_func(&program, package, &unit.path, spec),
                }
            }
        }

        log::info!(
            "Built declaration index: {} types, {} interfaces, {} functions",
            index.types_by_pkg.values().map(Vec::len).sum::<usize>(),
            index.ifaces_by_pkg.values().map(Vec::len).sum::<usize>(),
            index.funcs_by_pkg.values().map(Vec::len).sum::<usize>(),
        );

        index.program = Some(program);
        index
    }

    fn add_type(&mut self, program: &Program, package: &str, file: &str, spec: &TypeSpec) {
        let name = spec.name.name.clone();

        if let TypeShape::Interface(members) = &spec.shape {
            // re-resolve through the defined-object table for authoritative methods
            let declared = match program.def(&spec.name) {
                Some(Object::Type(id)) => match program.underlying(id) {
                    Underlying::Interface { methods, .. } => methods.clone(),
                    _ => Vec::new(),
                },
                _ => Vec::new(),
            };

            let methods = members
                .iter()
                .filter_map(|member| match member {
                    InterfaceMember::Method { name, span } => Some(IfaceMethod {
                        name: name.name.clone(),
                        start_line: span.start,
                        end_line: span.end,
                        func: declared
                            .iter()
                            .copied()
                            .find(|id| program.func(*id).name == name.name),
                    }),
                    InterfaceMember::Embedded { .. } => None,
                })
                .collect();

            self.ifaces_by_pkg
                .entry(package.to_string())
                .or_default()
                .push(InterfaceDecl {
                    package: package.to_string(),
                    file: file.to_string(),
                    start_line: spec.span.start,
                    end_line: spec.span.end,
                    name,
                    methods,
                });
            return;
        }

        let decl = TypeDecl {
            package: package.to_string(),
            file: file.to_string(),
            start_line: spec.span.start,
            end_line: spec.span.end,
            name: name.clone(),
            is_struct: matches!(spec.shape, TypeShape::Struct),
        };
        self.type_by_name
            .entry((package.to_string(), name))
            .or_insert_with(|| decl.clone());
        self.types_by_pkg
            .entry(package.to_string())
            .or_default()
            .push(decl);
    }

    fn add_func(&mut self, program: &Program, package: &str, file: &str, spec: &FuncSpec) {
        let Some(Object::Func(id)) = program.def(&spec.name) else {
            log::debug!("Unresolved function {} in {file}, skipping", spec.name.name);
            return;
        };
        let func = program.func(id);

        let decl = FuncDecl {
            package: package.to_string(),
            file: file.to_string(),
            start_line: spec.span.start,
            end_line: spec.span.end,
            name: spec.name.name.clone(),
            func: id,
            receiver: func.receiver().map(|(recv, _)| recv),
            results: func
                .signature
                .results
                .iter()
                .filter_map(|r| r.named())
                .collect(),
        };

        self.funcs_by_file
            .entry(file.to_string())
            .or_default()
            .push(decl.clone());
        self.funcs_by_pkg
            .entry(package.to_string())
            .or_default()
            .push(decl);
    }

    pub fn program(&self) -> Option<&Arc<Program>> {
        self.program.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.funcs_by_pkg.is_empty() && self.types_by_pkg.is_empty() && self.ifaces_by_pkg.is_empty()
    }

    /// (package path, name) of a named type
    fn qualified(&self, ty: TypeId) -> Option<(&str, &str)> {
        let program = self.program.as_deref()?;
        let named = program.types().get(ty.index())?;
        Some((program.type_package_path(ty), named.name.as_str()))
    }

    fn receiver_named(&self, decl: &FuncDecl) -> Option<&str> {
        self.qualified(decl.receiver?).map(|(_, name)| name)
    }

    pub fn type_decls(&self, package: &str) -> &[TypeDecl] {
        self.types_by_pkg.get(package).map_or(&[], Vec::as_slice)
    }

    pub fn interface_decls(&self, package: &str) -> &[InterfaceDecl] {
        self.ifaces_by_pkg.get(package).map_or(&[], Vec::as_slice)
    }

    pub fn func_decls(&self, package: &str) -> &[FuncDecl] {
        self.funcs_by_pkg.get(package).map_or(&[], Vec::as_slice)
    }

    pub fn func_decls_in_file(&self, file: &str) -> &[FuncDecl] {
        self.funcs_by_file.get(file).map_or(&[], Vec::as_slice)
    }

    /// Receiver of method `method` declared in `file`.
    ///
    /// `recv_hint` (receiver base name, e.g. `T`) disambiguates methods
    /// sharing a name. The file is searched first; a whole-program scan
    /// covers files the index saw under a different path.
    pub fn resolve_receiver_named(
        &self,
        file: &str,
        method: &str,
        recv_hint: Option<&str>,
    ) -> Option<ReceiverMatch<'_>> {
        let hint = recv_hint.filter(|h| !h.is_empty());
        let matches = |decl: &&FuncDecl| {
            decl.name == method
                && decl.receiver.is_some()
                && hint.map_or(true, |h| self.receiver_named(decl) == Some(h))
        };

        let found = self
            .func_decls_in_file(file)
            .iter()
            .find(matches)
            .or_else(|| self.funcs_by_pkg.values().flatten().find(matches));

        let ty = found?.receiver?;
        let (package, _) = self.qualified(ty)?;
        Some(ReceiverMatch { ty, package })
    }

    /// Declaration of a named (non-interface) type
    pub fn receiver_decl(&self, ty: TypeId) -> Option<&TypeDecl> {
        let (package, name) = self.qualified(ty)?;
        self.type_by_name
            .get(&(package.to_string(), name.to_string()))
    }

    /// Interfaces that declare `method` directly and are satisfied by
    /// `ty` or `*ty`. Same-package interfaces first, then by file and name.
    pub fn implemented_interfaces_declaring(&self, ty: TypeId, method: &str) -> Vec<&InterfaceDecl> {
        let Some(program) = self.program.as_deref() else {
            return Vec::new();
        };
        let Some((home, _)) = self.qualified(ty) else {
            return Vec::new();
        };

        let mut out: Vec<&InterfaceDecl> = self
            .ifaces_by_pkg
            .values()
            .flatten()
            .filter(|decl| decl.declares(method))
            .filter(|decl| {
                program
                    .lookup_interface(&decl.package, &decl.name)
                    .is_some_and(|iface| {
                        program.implements(ty, false, iface) || program.implements(ty, true, iface)
                    })
            })
            .collect();

        out.sort_by(|a, b| {
            (a.package != home)
                .cmp(&(b.package != home))
                .then_with(|| a.file.cmp(&b.file))
                .then_with(|| a.name.cmp(&b.name))
        });
        out
    }

    /// Free functions named `New…` in `ty`'s package returning `ty` or
    /// `*ty`, ordered by file then line
    pub fn constructors_for(&self, ty: TypeId) -> Vec<&FuncDecl> {
        let Some((package, _)) = self.qualified(ty) else {
            return Vec::new();
        };

        let mut out: Vec<&FuncDecl> = self
            .func_decls(package)
            .iter()
            .filter(|decl| !decl.is_method())
            .filter(|decl| decl.name.starts_with(CONSTRUCTOR_PREFIX))
            .filter(|decl| decl.results.contains(&ty))
            .collect();

        out.sort_by(|a, b| a.file.cmp(&b.file).then(a.start_line.cmp(&b.start_line)));
        out
    }

    /// Methods on the same receiver named as counterparts of `method`
    pub fn counterpart_methods_on(
        &self,
        ty: TypeId,
        method: &str,
        rules: &CounterpartRules,
    ) -> Vec<&FuncDecl> {
        if rules.is_empty() {
            return Vec::new();
        }
        let Some((package, _)) = self.qualified(ty) else {
            return Vec::new();
        };

        self.func_decls(package)
            .iter()
            .filter(|decl| decl.receiver == Some(ty))
            .filter(|decl| rules.is_counterpart(method, &decl.name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_index_answers_not_found() {
        let index = Index::empty();
        let ty = TypeId(0);
        assert!(index.is_empty());
        assert!(index.resolve_receiver_named("a.go", "Get", None).is_none());
        assert!(index.receiver_decl(ty).is_none());
        assert!(index.implemented_interfaces_declaring(ty, "Get").is_empty());
        assert!(index.constructors_for(ty).is_empty());
        assert!(index
            .counterpart_methods_on(ty, "Open", &CounterpartRules::common())
            .is_empty());
    }
}
