//! Best-effort Go type checker.
//!
//! Phases, all over the whole program:
//! 1. packages and units are laid out (one package per directory)
//! 2. package-level types and free functions are declared
//! 3. type declarations are resolved (struct fields, interface methods)
//! 4. methods are attached to receivers and signatures resolved
//! 5. bodies are typed with a stack of block scopes to classify calls

use super::parse::{
    BodyEvent, Expr, IfaceElem, Import, ParsedDecl, ParsedFile, ParsedSignature, TypeExpr,
};
use crate::model::{
    CallSite, CallTarget, Decl, Field, FuncId, FuncKind, FuncObj, FuncSpec, Ident,
    InterfaceMember, LineSpan, NamedType, Object, Package, PackageId, Pos, Program, Signature,
    TypeId, TypeRef, TypeShape, TypeSpec, Underlying, Unit, UnitId,
};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

/// Source file handed to the checker
#[derive(Debug, Clone)]
pub(crate) struct CheckInput {
    pub path: String,
    pub source: String,
    pub parsed: ParsedFile,
}

struct FileCtx {
    unit: UnitId,
    package: PackageId,
    imports: HashMap<String, String>,
}

impl FileCtx {
    /// `names` maps import paths of the program's own packages to their
    /// declared package names
    fn new(
        unit: UnitId,
        package: PackageId,
        imports: &[Import],
        names: &HashMap<String, String>,
    ) -> Self {
        let imports = imports
            .iter()
            .filter_map(|i| {
                let name = match (&i.alias, names.get(&i.path)) {
                    (None, Some(declared)) => Some(declared.clone()),
                    _ => i.local_name(),
                }?;
                Some((name, i.path.clone()))
            })
            .collect();
        Self {
            unit,
            package,
            imports,
        }
    }
}

pub(crate) fn check(root: PathBuf, module_path: &str, mut inputs: Vec<CheckInput>) -> Program {
    inputs.sort_by(|a, b| a.path.cmp(&b.path));

    let mut program = Program {
        root,
        module_path: module_path.to_string(),
        ..Program::default()
    };

    // Phase 1: packages and units
    let mut by_dir: BTreeMap<String, Vec<CheckInput>> = BTreeMap::new();
    for input in inputs {
        by_dir.entry(dir_of(&input.path)).or_default().push(input);
    }

    let mut package_ids: HashMap<String, PackageId> = HashMap::new();
    let mut laid_out: Vec<(UnitId, PackageId, ParsedFile)> = Vec::new();

    for (dir, group) in by_dir {
        let Some(name) = group.first().map(|f| f.parsed.package.clone()) else {
            continue;
        };
        let id = PackageId(program.packages.len() as u32);
        let path = if dir.is_empty() {
            module_path.to_string()
        } else {
            format!("{module_path}/{dir}")
        };
        package_ids.insert(path.clone(), id);
        program.packages.push(Package {
            id,
            path,
            name: name.clone(),
            dir,
            units: Vec::new(),
            scope: BTreeMap::new(),
        });

        for input in group {
            if input.parsed.package != name {
                log::debug!(
                    "Skipping {}: package {} differs from {}",
                    input.path,
                    input.parsed.package,
                    name
                );
                continue;
            }
            let unit = UnitId(program.units.len() as u32);
            program.packages[id.index()].units.push(unit);
            program.units.push(Unit {
                id: unit,
                package: id,
                path: input.path,
                decls: Vec::new(),
                source: input.source,
            });
            laid_out.push((unit, id, input.parsed));
        }
    }

    let names: HashMap<String, String> = program
        .packages
        .iter()
        .map(|p| (p.path.clone(), p.name.clone()))
        .collect();
    let files: Vec<(FileCtx, ParsedFile)> = laid_out
        .into_iter()
        .map(|(unit, id, parsed)| (FileCtx::new(unit, id, &parsed.imports, &names), parsed))
        .collect();

    let mut checker = Checker {
        program,
        package_ids,
    };

    // Phase 2: declare package-level objects
    let mut assigned: Vec<Vec<Option<Object>>> = Vec::with_capacity(files.len());
    for (ctx, parsed) in &files {
        assigned.push(checker.declare(ctx, parsed));
    }

    // Phase 3: resolve type declarations
    for ((ctx, parsed), objects) in files.iter().zip(&assigned) {
        for (decl, object) in parsed.decls.iter().zip(objects) {
            if let (ParsedDecl::Type(ty), Some(Object::Type(id))) = (decl, object) {
                checker.resolve_type_decl(ctx, *id, &ty.expr);
            }
        }
    }

    // Phase 4: methods and signatures
    for ((ctx, parsed), objects) in files.iter().zip(assigned.iter_mut()) {
        for (decl, object) in parsed.decls.iter().zip(objects.iter_mut()) {
            let ParsedDecl::Func(func) = decl else {
                continue;
            };
            let signature = checker.resolve_signature(ctx, &func.sig);
            match (object, &func.receiver) {
                (Some(Object::Func(id)), None) => {
                    checker.program.funcs[id.index()].signature = signature;
                }
                (slot @ None, Some(receiver)) => {
                    *slot = checker
                        .attach_method(ctx, func.name.clone(), func.name_offset, func.span, receiver, signature)
                        .map(Object::Func);
                }
                _ => {}
            }
        }
    }

    // Phase 5: bodies
    let mut calls = Vec::new();
    for ((ctx, parsed), objects) in files.iter().zip(&assigned) {
        for (decl, object) in parsed.decls.iter().zip(objects) {
            if let (ParsedDecl::Func(func), Some(Object::Func(id))) = (decl, object) {
                let mut body = BodyChecker::new(&checker, ctx, *id);
                body.bind_signature(func.receiver.as_ref(), &func.sig);
                body.run(&func.body, &mut calls);
            }
        }
    }

    let mut program = checker.program;
    program.calls = calls;
    log::info!(
        "Checked program {}: {} packages, {} files, {} types, {} functions, {} call sites",
        program.module_path,
        program.packages.len(),
        program.units.len(),
        program.types.len(),
        program.funcs.len(),
        program.calls.len()
    );
    program
}

fn dir_of(path: &str) -> String {
    match path.rfind('/') {
        Some(idx) => path[..idx].to_string(),
        None => String::new(),
    }
}

struct Checker {
    program: Program,
    package_ids: HashMap<String, PackageId>,
}

impl Checker {
    fn pos(ctx: &FileCtx, offset: u32) -> Pos {
        Pos {
            unit: ctx.unit,
            offset,
        }
    }

    fn declare(&mut self, ctx: &FileCtx, parsed: &ParsedFile) -> Vec<Option<Object>> {
        let mut objects = Vec::with_capacity(parsed.decls.len());
        let mut syntax = Vec::with_capacity(parsed.decls.len());

        for decl in &parsed.decls {
            match decl {
                ParsedDecl::Type(ty) => {
                    let id = TypeId(self.program.types.len() as u32);
                    self.program.types.push(NamedType {
                        id,
                        package: ctx.package,
                        name: ty.name.clone(),
                        underlying: Underlying::Other(TypeRef::Opaque(String::new())),
                        methods: Vec::new(),
                    });
                    let name = Ident {
                        name: ty.name.clone(),
                        pos: Self::pos(ctx, ty.name_offset),
                    };
                    self.define(ctx, &name, Object::Type(id), true);
                    syntax.push(Decl::Type(TypeSpec {
                        name,
                        span: ty.span,
                        shape: Self::shape(ctx, &ty.expr),
                    }));
                    objects.push(Some(Object::Type(id)));
                }
                ParsedDecl::Func(func) => {
                    let name = Ident {
                        name: func.name.clone(),
                        pos: Self::pos(ctx, func.name_offset),
                    };
                    syntax.push(Decl::Func(FuncSpec {
                        name: name.clone(),
                        span: func.span,
                    }));
                    if func.receiver.is_some() {
                        objects.push(None);
                        continue;
                    }
                    let id = self.new_func(ctx, &func.name, FuncKind::Function, func.span);
                    let in_scope = func.name != "init";
                    self.define(ctx, &name, Object::Func(id), in_scope);
                    objects.push(Some(Object::Func(id)));
                }
            }
        }

        self.program.units[ctx.unit.index()].decls = syntax;
        objects
    }

    fn shape(ctx: &FileCtx, expr: &TypeExpr) -> TypeShape {
        match expr {
            TypeExpr::Struct(_) => TypeShape::Struct,
            TypeExpr::Interface(elems) => TypeShape::Interface(
                elems
                    .iter()
                    .map(|elem| match elem {
                        IfaceElem::Method {
                            name, offset, span, ..
                        } => InterfaceMember::Method {
                            name: Ident {
                                name: name.clone(),
                                pos: Self::pos(ctx, *offset),
                            },
                            span: *span,
                        },
                        IfaceElem::Embedded { span, .. } => InterfaceMember::Embedded { span: *span },
                    })
                    .collect(),
            ),
            _ => TypeShape::Other,
        }
    }

    fn define(&mut self, ctx: &FileCtx, name: &Ident, object: Object, in_scope: bool) {
        self.program.defs.insert(name.pos, object);
        if in_scope && name.name != "_" {
            self.program.packages[ctx.package.index()]
                .scope
                .entry(name.name.clone())
                .or_insert(object);
        }
    }

    fn new_func(&mut self, ctx: &FileCtx, name: &str, kind: FuncKind, span: LineSpan) -> FuncId {
        let id = FuncId(self.program.funcs.len() as u32);
        self.program.funcs.push(FuncObj {
            id,
            package: ctx.package,
            name: name.to_string(),
            kind,
            signature: Signature::default(),
            unit: ctx.unit,
            span,
        });
        id
    }

    fn resolve_type_decl(&mut self, ctx: &FileCtx, id: TypeId, expr: &TypeExpr) {
        let underlying = match expr {
            TypeExpr::Struct(fields) => Underlying::Struct(
                fields
                    .iter()
                    .flat_map(|field| {
                        let ty = self.resolve(ctx, &field.ty);
                        let names = if field.embedded {
                            vec![embedded_name(&field.ty)]
                        } else {
                            field.names.iter().cloned().map(Some).collect()
                        };
                        names.into_iter().map(move |name| Field {
                            name,
                            ty: ty.clone(),
                            embedded: field.embedded,
                        })
                    })
                    .collect(),
            ),
            TypeExpr::Interface(elems) => {
                let mut methods = Vec::new();
                let mut embeds = Vec::new();
                for elem in elems {
                    match elem {
                        IfaceElem::Method {
                            name,
                            offset,
                            span,
                            sig,
                        } => {
                            let method = self.new_func(ctx, name, FuncKind::Abstract { iface: id }, *span);
                            self.program.funcs[method.index()].signature = self.resolve_signature(ctx, sig);
                            self.program
                                .defs
                                .insert(Self::pos(ctx, *offset), Object::Func(method));
                            methods.push(method);
                        }
                        IfaceElem::Embedded { ty, .. } => embeds.push(self.resolve(ctx, ty)),
                    }
                }
                Underlying::Interface { methods, embeds }
            }
            other => Underlying::Other(self.resolve(ctx, other)),
        };
        self.program.types[id.index()].underlying = underlying;
    }

    fn attach_method(
        &mut self,
        ctx: &FileCtx,
        name: String,
        offset: u32,
        span: LineSpan,
        receiver: &super::parse::Param,
        signature: Signature,
    ) -> Option<FuncId> {
        let (base, pointer) = match &receiver.ty {
            TypeExpr::Pointer(inner) => (inner.as_ref(), true),
            other => (other, false),
        };
        let TypeExpr::Name(base) = base else {
            log::debug!("Unsupported receiver type for method {name}");
            return None;
        };
        let Some(Object::Type(recv)) = self.program.packages[ctx.package.index()].lookup(base) else {
            log::debug!("Receiver {base} of method {name} not found, skipping");
            return None;
        };

        let id = self.new_func(ctx, &name, FuncKind::Method { recv, pointer }, span);
        self.program.funcs[id.index()].signature = signature;
        self.program.types[recv.index()].methods.push(id);
        self.program
            .defs
            .insert(Self::pos(ctx, offset), Object::Func(id));
        Some(id)
    }

    fn resolve_signature(&self, ctx: &FileCtx, sig: &ParsedSignature) -> Signature {
        let expand = |params: &[super::parse::Param]| -> Vec<TypeRef> {
            params
                .iter()
                .flat_map(|p| {
                    let ty = self.resolve(ctx, &p.ty);
                    let ty = if p.variadic {
                        TypeRef::Slice(Box::new(ty))
                    } else {
                        ty
                    };
                    std::iter::repeat(ty).take(p.names.len().max(1))
                })
                .collect()
        };
        Signature {
            params: expand(&sig.params),
            results: expand(&sig.results),
            variadic: sig.params.last().is_some_and(|p| p.variadic),
        }
    }

    fn resolve(&self, ctx: &FileCtx, expr: &TypeExpr) -> TypeRef {
        match expr {
            TypeExpr::Name(name) => {
                match self.program.packages[ctx.package.index()].lookup(name) {
                    Some(Object::Type(id)) => TypeRef::Named(id),
                    _ if name == "any" => TypeRef::Opaque("interface{}".to_string()),
                    _ => TypeRef::Opaque(name.clone()),
                }
            }
            TypeExpr::Qualified { package, name } => {
                let path = ctx
                    .imports
                    .get(package)
                    .cloned()
                    .unwrap_or_else(|| package.clone());
                let resolved = self
                    .package_ids
                    .get(&path)
                    .and_then(|id| self.program.packages[id.index()].lookup(name));
                match resolved {
                    Some(Object::Type(id)) => TypeRef::Named(id),
                    _ => TypeRef::External {
                        package: path,
                        name: name.clone(),
                    },
                }
            }
            TypeExpr::Pointer(inner) => TypeRef::Pointer(Box::new(self.resolve(ctx, inner))),
            TypeExpr::Slice(inner) => TypeRef::Slice(Box::new(self.resolve(ctx, inner))),
            TypeExpr::Map(key, value) => TypeRef::Map(
                Box::new(self.resolve(ctx, key)),
                Box::new(self.resolve(ctx, value)),
            ),
            TypeExpr::Struct(_) => TypeRef::Opaque("struct{}".to_string()),
            TypeExpr::Interface(elems) if elems.is_empty() => {
                TypeRef::Opaque("interface{}".to_string())
            }
            TypeExpr::Interface(_) => TypeRef::Opaque("interface{...}".to_string()),
            TypeExpr::Opaque(text) => TypeRef::Opaque(text.clone()),
        }
    }

    fn lookup_in(&self, package: PackageId, name: &str) -> Option<Object> {
        self.program.packages[package.index()].lookup(name)
    }

    fn lookup_import(&self, ctx: &FileCtx, alias: &str, name: &str) -> Option<Object> {
        let path = ctx.imports.get(alias)?;
        let id = self.package_ids.get(path)?;
        self.lookup_in(*id, name)
    }
}

fn embedded_name(expr: &TypeExpr) -> Option<String> {
    match expr {
        TypeExpr::Name(name) => Some(name.clone()),
        TypeExpr::Qualified { name, .. } => Some(name.clone()),
        TypeExpr::Pointer(inner) => embedded_name(inner),
        _ => None,
    }
}

/// One lexical block of locals; `None` marks a local whose type could not
/// be determined but which still shadows outer names.
type Scope = HashMap<String, Option<TypeRef>>;

struct BodyChecker<'c> {
    checker: &'c Checker,
    ctx: &'c FileCtx,
    caller: FuncId,
    scopes: Vec<Scope>,
}

impl<'c> BodyChecker<'c> {
    fn new(checker: &'c Checker, ctx: &'c FileCtx, caller: FuncId) -> Self {
        Self {
            checker,
            ctx,
            caller,
            scopes: vec![Scope::new()],
        }
    }

    fn program(&self) -> &Program {
        &self.checker.program
    }

    fn bind_signature(&mut self, receiver: Option<&super::parse::Param>, sig: &ParsedSignature) {
        for param in receiver.into_iter().chain(&sig.params).chain(&sig.results) {
            let ty = self.checker.resolve(self.ctx, &param.ty);
            let ty = if param.variadic {
                TypeRef::Slice(Box::new(ty))
            } else {
                ty
            };
            for name in &param.names {
                if name != "_" {
                    self.declare(name, Some(ty.clone()));
                }
            }
        }
    }

    fn run(&mut self, events: &[BodyEvent], out: &mut Vec<CallSite>) {
        for event in events {
            match event {
                BodyEvent::Enter => self.scopes.push(Scope::new()),
                BodyEvent::Exit => {
                    // the signature scope is never popped
                    if self.scopes.len() > 1 {
                        self.scopes.pop();
                    }
                }
                BodyEvent::Bind {
                    names,
                    values,
                    ty,
                    range,
                } => self.bind(names, values, ty.as_ref(), *range),
                BodyEvent::Call { expr, line } => {
                    let Expr::Call { func, args } = expr else {
                        continue;
                    };
                    if let Some(target) = self.resolve_call(func, *args) {
                        out.push(CallSite {
                            caller: self.caller,
                            line: *line,
                            target,
                        });
                    }
                }
            }
        }
    }

    fn bind(&mut self, names: &[String], values: &[Expr], ty: Option<&TypeExpr>, range: bool) {
        let types: Vec<Option<TypeRef>> = if let Some(ty) = ty {
            vec![Some(self.checker.resolve(self.ctx, ty)); names.len()]
        } else if range {
            match values.first().and_then(|v| self.type_of(v)) {
                Some(TypeRef::Slice(elem)) => {
                    vec![Some(TypeRef::Opaque("int".to_string())), Some(*elem)]
                }
                Some(TypeRef::Map(key, value)) => vec![Some(*key), Some(*value)],
                _ => Vec::new(),
            }
        } else if values.len() == names.len() {
            values.iter().map(|v| self.type_of(v)).collect()
        } else if let [Expr::Call { func, .. }] = values {
            self.callee_results(func)
                .map(|results| results.into_iter().map(Some).collect())
                .unwrap_or_default()
        } else if let [single] = values {
            vec![self.type_of(single)]
        } else {
            Vec::new()
        };

        for (i, name) in names.iter().enumerate() {
            if name == "_" {
                continue;
            }
            self.declare(name, types.get(i).cloned().flatten());
        }
    }

    fn declare(&mut self, name: &str, ty: Option<TypeRef>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), ty);
        }
    }

    /// Innermost binding of `name`
    fn local(&self, name: &str) -> Option<&Option<TypeRef>> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    fn is_local(&self, name: &str) -> bool {
        self.local(name).is_some()
    }

    /// Object named by a bare identifier or an `import.Name` selector
    fn package_object(&self, expr: &Expr) -> Option<Object> {
        match expr {
            Expr::Ident(name) if !self.is_local(name) => {
                self.checker.lookup_in(self.ctx.package, name)
            }
            Expr::Selector(operand, name) => match operand.as_ref() {
                Expr::Ident(alias) if !self.is_local(alias) => {
                    self.checker.lookup_import(self.ctx, alias, name)
                }
                _ => None,
            },
            Expr::Index(inner) => self.package_object(inner),
            _ => None,
        }
    }

    fn is_import(&self, expr: &Expr) -> bool {
        matches!(expr, Expr::Ident(alias) if !self.is_local(alias) && self.ctx.imports.contains_key(alias))
    }

    fn type_of(&self, expr: &Expr) -> Option<TypeRef> {
        match expr {
            Expr::Ident(name) => self.local(name).cloned().flatten(),
            Expr::Selector(operand, field) => {
                if self.is_import(operand) {
                    return None;
                }
                let base = self.type_of(operand)?;
                self.program().field_type(base.named()?, field)
            }
            Expr::Call { func, .. } => self.callee_results(func)?.into_iter().next(),
            Expr::Composite(ty) => Some(self.checker.resolve(self.ctx, ty)),
            Expr::AddrOf(inner) => self.type_of(inner).map(|t| TypeRef::Pointer(Box::new(t))),
            Expr::Deref(inner) => match self.type_of(inner)? {
                TypeRef::Pointer(t) => Some(*t),
                _ => None,
            },
            Expr::Assert(ty) => Some(self.checker.resolve(self.ctx, ty)),
            Expr::Index(inner) => match self.type_of(inner)? {
                TypeRef::Slice(elem) => Some(*elem),
                TypeRef::Map(_, value) => Some(*value),
                _ => None,
            },
            Expr::Other => None,
        }
    }

    fn callee_results(&self, func: &Expr) -> Option<Vec<TypeRef>> {
        match self.package_object(func) {
            Some(Object::Func(id)) => return Some(self.program().func(id).signature.results.clone()),
            Some(Object::Type(id)) => return Some(vec![TypeRef::Named(id)]),
            None => {}
        }
        let program = self.program();
        match self.resolve_call(func, 0)? {
            CallTarget::Static(id) => Some(program.func(id).signature.results.clone()),
            CallTarget::Interface { iface, method } => {
                let methods = program.interface_method_set(iface)?;
                let id = methods.get(&method)?;
                Some(program.func(*id).signature.results.clone())
            }
            CallTarget::Dynamic { .. } => None,
        }
    }

    fn resolve_call(&self, func: &Expr, args: usize) -> Option<CallTarget> {
        if let Some(object) = self.package_object(func) {
            return match object {
                Object::Func(id) => Some(CallTarget::Static(id)),
                // conversion
                Object::Type(_) => None,
            };
        }

        let Expr::Selector(operand, method) = func else {
            return None;
        };
        if self.is_import(operand) {
            // function from a package outside the program
            return None;
        }

        let dynamic = || CallTarget::Dynamic {
            method: method.clone(),
            arity: args,
        };
        let Some(recv) = self.type_of(operand).and_then(|t| t.named()) else {
            return Some(dynamic());
        };

        let program = self.program();
        if program.is_interface(recv) {
            return match program.interface_method_set(recv) {
                Some(methods) if methods.contains_key(method) => Some(CallTarget::Interface {
                    iface: recv,
                    method: method.clone(),
                }),
                Some(_) => None,
                None => Some(dynamic()),
            };
        }

        match program.lookup_method(recv, method) {
            Some(id) => match program.func(id).kind {
                FuncKind::Abstract { iface } => Some(CallTarget::Interface {
                    iface,
                    method: method.clone(),
                }),
                _ => Some(CallTarget::Static(id)),
            },
            // call through a func-typed field
            None if program.field_type(recv, method).is_some() => None,
            None => Some(dynamic()),
        }
    }
}
