//! Tree-sitter front-end: turns Go source into an owned, lifetime-free
//! syntax summary that the checker resolves.

use crate::error::{ProgramError, Result};
use crate::model::LineSpan;
use tree_sitter::{Node, Parser};

#[derive(Debug, Clone)]
pub(crate) struct ParsedFile {
    pub package: String,
    pub imports: Vec<Import>,
    pub decls: Vec<ParsedDecl>,
}

#[derive(Debug, Clone)]
pub(crate) struct Import {
    pub alias: Option<String>,
    pub path: String,
}

impl Import {
    /// Name the import is referred to by inside the file, if any. Without
    /// an alias the name is guessed from the path; the checker replaces the
    /// guess with the declared name for packages of the program itself.
    pub fn local_name(&self) -> Option<String> {
        match self.alias.as_deref() {
            Some("_") | Some(".") => None,
            Some(alias) => Some(alias.to_string()),
            None => {
                let mut segments = self.path.rsplit('/');
                let mut last = segments.next()?;
                if is_major_version(last) {
                    last = segments.next()?;
                }
                let last = last.split('.').next().unwrap_or(last);
                Some(last.trim_start_matches("go-").replace('-', "_"))
            }
        }
    }
}

/// Nodes that open a Go lexical block (explicit or implicit)
fn opens_scope(kind: &str) -> bool {
    matches!(
        kind,
        "block"
            | "if_statement"
            | "for_statement"
            | "expression_switch_statement"
            | "type_switch_statement"
            | "select_statement"
            | "expression_case"
            | "type_case"
            | "default_case"
            | "communication_case"
            | "func_literal"
    )
}

fn is_major_version(segment: &str) -> bool {
    segment.len() > 1
        && segment.starts_with('v')
        && segment[1..].chars().all(|c| c.is_ascii_digit())
}

#[derive(Debug, Clone)]
pub(crate) enum ParsedDecl {
    Type(ParsedType),
    Func(ParsedFunc),
}

#[derive(Debug, Clone)]
pub(crate) struct ParsedType {
    pub name: String,
    pub name_offset: u32,
    pub span: LineSpan,
    pub expr: TypeExpr,
}

#[derive(Debug, Clone)]
pub(crate) enum TypeExpr {
    Name(String),
    Qualified { package: String, name: String },
    Pointer(Box<TypeExpr>),
    Slice(Box<TypeExpr>),
    Map(Box<TypeExpr>, Box<TypeExpr>),
    Struct(Vec<ParsedField>),
    Interface(Vec<IfaceElem>),
    Opaque(String),
}

#[derive(Debug, Clone)]
pub(crate) struct ParsedField {
    pub names: Vec<String>,
    pub ty: TypeExpr,
    pub embedded: bool,
}

#[derive(Debug, Clone)]
pub(crate) enum IfaceElem {
    Method {
        name: String,
        offset: u32,
        span: LineSpan,
        sig: ParsedSignature,
    },
    Embedded {
        ty: TypeExpr,
        span: LineSpan,
    },
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ParsedSignature {
    pub params: Vec<Param>,
    pub results: Vec<Param>,
}

#[derive(Debug, Clone)]
pub(crate) struct Param {
    pub names: Vec<String>,
    pub ty: TypeExpr,
    pub variadic: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct ParsedFunc {
    pub name: String,
    pub name_offset: u32,
    pub span: LineSpan,
    pub receiver: Option<Param>,
    pub sig: ParsedSignature,
    pub body: Vec<BodyEvent>,
}

/// Body facts in source order: new local bindings, call expressions and
/// lexical scope boundaries
#[derive(Debug, Clone)]
pub(crate) enum BodyEvent {
    Enter,
    Exit,
    Bind {
        names: Vec<String>,
        values: Vec<Expr>,
        ty: Option<TypeExpr>,
        range: bool,
    },
    Call {
        expr: Expr,
        line: usize,
    },
}

#[derive(Debug, Clone)]
pub(crate) enum Expr {
    Ident(String),
    Selector(Box<Expr>, String),
    Call { func: Box<Expr>, args: usize },
    Composite(TypeExpr),
    AddrOf(Box<Expr>),
    Deref(Box<Expr>),
    Assert(TypeExpr),
    Index(Box<Expr>),
    Other,
}

/// Whether a file opts out of every build via a `go:build ignore` constraint
pub(crate) fn is_build_ignored(source: &str) -> bool {
    for line in source.lines() {
        let line = line.trim();
        if line.starts_with("package ") {
            break;
        }
        let constraint = line
            .strip_prefix("//go:build")
            .or_else(|| line.strip_prefix("// +build"));
        if let Some(expr) = constraint {
            let expr = expr.trim();
            if expr == "ignore" || expr.starts_with("ignore ") {
                return true;
            }
        }
    }
    false
}

/// Go source parser
pub(crate) struct GoParser {
    parser: Parser,
}

impl GoParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let language: tree_sitter::Language = tree_sitter_go::LANGUAGE.into();
        parser
            .set_language(&language)
            .map_err(|e| ProgramError::tree_sitter(format!("Failed to set language: {e}")))?;
        Ok(Self { parser })
    }

    pub fn parse(&mut self, path: &str, source: &str) -> Result<ParsedFile> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| ProgramError::parse(path, "Failed to parse source code"))?;
        let root = tree.root_node();
        if root.has_error() {
            log::debug!("Syntax errors in {path}, continuing with partial tree");
        }

        let walker = Walker { src: source };
        let mut file = ParsedFile {
            package: String::new(),
            imports: Vec::new(),
            decls: Vec::new(),
        };

        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            match child.kind() {
                "package_clause" => {
                    if let Some(name) = child.named_child(0) {
                        file.package = walker.text(name).to_string();
                    }
                }
                "import_declaration" => walker.imports(child, &mut file.imports),
                "type_declaration" => walker.type_declaration(child, &mut file.decls),
                "function_declaration" | "method_declaration" => {
                    if let Some(func) = walker.function(child) {
                        file.decls.push(ParsedDecl::Func(func));
                    }
                }
                _ => {}
            }
        }

        if file.package.is_empty() {
            return Err(ProgramError::parse(path, "missing package clause"));
        }
        Ok(file)
    }
}

struct Walker<'s> {
    src: &'s str,
}

impl<'s> Walker<'s> {
    fn text(&self, node: Node) -> &'s str {
        node.utf8_text(self.src.as_bytes()).unwrap_or("")
    }

    fn span(node: Node) -> LineSpan {
        LineSpan::new(node.start_position().row + 1, node.end_position().row + 1)
    }

    fn imports(&self, node: Node, out: &mut Vec<Import>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "import_spec" => {
                    let Some(path) = child.child_by_field_name("path") else {
                        continue;
                    };
                    let path = self.text(path).trim_matches(|c| c == '"' || c == '`');
                    out.push(Import {
                        alias: child
                            .child_by_field_name("name")
                            .map(|n| self.text(n).to_string()),
                        path: path.to_string(),
                    });
                }
                "import_spec_list" => self.imports(child, out),
                _ => {}
            }
        }
    }

    fn type_declaration(&self, node: Node, out: &mut Vec<ParsedDecl>) {
        let mut cursor = node.walk();
        for spec in node.named_children(&mut cursor) {
            if !matches!(spec.kind(), "type_spec" | "type_alias") {
                continue;
            }
            let (Some(name), Some(ty)) = (
                spec.child_by_field_name("name"),
                spec.child_by_field_name("type"),
            ) else {
                continue;
            };
            out.push(ParsedDecl::Type(ParsedType {
                name: self.text(name).to_string(),
                name_offset: name.start_byte() as u32,
                span: Self::span(spec),
                expr: self.type_expr(ty),
            }));
        }
    }

    fn function(&self, node: Node) -> Option<ParsedFunc> {
        let name = node.child_by_field_name("name")?;
        let receiver = node
            .child_by_field_name("receiver")
            .and_then(|list| self.params(list).into_iter().next());
        let body = node
            .child_by_field_name("body")
            .map(|body| {
                let mut events = Vec::new();
                self.body(body, &mut events);
                events
            })
            .unwrap_or_default();

        Some(ParsedFunc {
            name: self.text(name).to_string(),
            name_offset: name.start_byte() as u32,
            span: Self::span(node),
            receiver,
            sig: self.signature(node),
            body,
        })
    }

    fn signature(&self, node: Node) -> ParsedSignature {
        let params = node
            .child_by_field_name("parameters")
            .map(|list| self.params(list))
            .unwrap_or_default();
        let results = match node.child_by_field_name("result") {
            Some(result) if result.kind() == "parameter_list" => self.params(result),
            Some(result) => vec![Param {
                names: Vec::new(),
                ty: self.type_expr(result),
                variadic: false,
            }],
            None => Vec::new(),
        };
        ParsedSignature { params, results }
    }

    fn params(&self, list: Node) -> Vec<Param> {
        let mut out = Vec::new();
        let mut cursor = list.walk();
        for decl in list.named_children(&mut cursor) {
            let variadic = match decl.kind() {
                "parameter_declaration" => false,
                "variadic_parameter_declaration" => true,
                _ => continue,
            };
            let Some(ty) = decl.child_by_field_name("type") else {
                continue;
            };
            let mut names_cursor = decl.walk();
            let names = decl
                .children_by_field_name("name", &mut names_cursor)
                .map(|n| self.text(n).to_string())
                .collect();
            out.push(Param {
                names,
                ty: self.type_expr(ty),
                variadic,
            });
        }
        out
    }

    fn type_expr(&self, node: Node) -> TypeExpr {
        match node.kind() {
            "type_identifier" | "identifier" => TypeExpr::Name(self.text(node).to_string()),
            "qualified_type" => match (
                node.child_by_field_name("package"),
                node.child_by_field_name("name"),
            ) {
                (Some(package), Some(name)) => TypeExpr::Qualified {
                    package: self.text(package).to_string(),
                    name: self.text(name).to_string(),
                },
                _ => self.opaque(node),
            },
            "pointer_type" => match node.named_child(0) {
                Some(inner) => TypeExpr::Pointer(Box::new(self.type_expr(inner))),
                None => self.opaque(node),
            },
            "slice_type" => match node.child_by_field_name("element") {
                Some(elem) => TypeExpr::Slice(Box::new(self.type_expr(elem))),
                None => self.opaque(node),
            },
            "map_type" => match (
                node.child_by_field_name("key"),
                node.child_by_field_name("value"),
            ) {
                (Some(key), Some(value)) => TypeExpr::Map(
                    Box::new(self.type_expr(key)),
                    Box::new(self.type_expr(value)),
                ),
                _ => self.opaque(node),
            },
            "generic_type" => match node.child_by_field_name("type") {
                Some(base) => self.type_expr(base),
                None => self.opaque(node),
            },
            "parenthesized_type" => match node.named_child(0) {
                Some(inner) => self.type_expr(inner),
                None => self.opaque(node),
            },
            "struct_type" => TypeExpr::Struct(self.struct_fields(node)),
            "interface_type" => TypeExpr::Interface(self.interface_elems(node)),
            _ => self.opaque(node),
        }
    }

    fn opaque(&self, node: Node) -> TypeExpr {
        TypeExpr::Opaque(self.text(node).split_whitespace().collect())
    }

    fn struct_fields(&self, node: Node) -> Vec<ParsedField> {
        let mut out = Vec::new();
        let mut cursor = node.walk();
        for list in node.named_children(&mut cursor) {
            if list.kind() != "field_declaration_list" {
                continue;
            }
            let mut field_cursor = list.walk();
            for decl in list.named_children(&mut field_cursor) {
                if decl.kind() != "field_declaration" {
                    continue;
                }
                let Some(ty) = decl.child_by_field_name("type") else {
                    continue;
                };
                let mut names_cursor = decl.walk();
                let names: Vec<String> = decl
                    .children_by_field_name("name", &mut names_cursor)
                    .map(|n| self.text(n).to_string())
                    .collect();
                let embedded = names.is_empty();
                let mut ty = self.type_expr(ty);
                if embedded && self.has_star(decl) && !matches!(ty, TypeExpr::Pointer(_)) {
                    ty = TypeExpr::Pointer(Box::new(ty));
                }
                out.push(ParsedField {
                    names,
                    ty,
                    embedded,
                });
            }
        }
        out
    }

    fn has_star(&self, decl: Node) -> bool {
        let mut cursor = decl.walk();
        let found = decl.children(&mut cursor).any(|c| c.kind() == "*");
        found
    }

    fn interface_elems(&self, node: Node) -> Vec<IfaceElem> {
        let mut out = Vec::new();
        let mut cursor = node.walk();
        for elem in node.named_children(&mut cursor) {
            match elem.kind() {
                "method_elem" | "method_spec" => {
                    let Some(name) = elem.child_by_field_name("name") else {
                        continue;
                    };
                    out.push(IfaceElem::Method {
                        name: self.text(name).to_string(),
                        offset: name.start_byte() as u32,
                        span: Self::span(elem),
                        sig: self.signature(elem),
                    });
                }
                "comment" => {}
                _ => {
                    let target = if elem.kind() == "type_elem" && elem.named_child_count() == 1 {
                        elem.named_child(0).unwrap_or(elem)
                    } else {
                        elem
                    };
                    out.push(IfaceElem::Embedded {
                        ty: self.type_expr(target),
                        span: Self::span(elem),
                    });
                }
            }
        }
        out
    }

    // ------------------------------------------------------------------
    // Function bodies
    // ------------------------------------------------------------------

    fn body(&self, node: Node, out: &mut Vec<BodyEvent>) {
        let scoped = opens_scope(node.kind());
        if scoped {
            out.push(BodyEvent::Enter);
        }
        self.body_node(node, out);
        if scoped {
            out.push(BodyEvent::Exit);
        }
    }

    fn body_node(&self, node: Node, out: &mut Vec<BodyEvent>) {
        match node.kind() {
            "short_var_declaration" => {
                if let Some(right) = node.child_by_field_name("right") {
                    self.body(right, out);
                }
                let names = node
                    .child_by_field_name("left")
                    .map(|left| self.expr_list_names(left))
                    .unwrap_or_default();
                let values = node
                    .child_by_field_name("right")
                    .map(|right| self.expr_list(right))
                    .unwrap_or_default();
                out.push(BodyEvent::Bind {
                    names,
                    values,
                    ty: None,
                    range: false,
                });
            }
            "var_spec" => {
                if let Some(value) = node.child_by_field_name("value") {
                    self.body(value, out);
                }
                let mut names_cursor = node.walk();
                let names = node
                    .children_by_field_name("name", &mut names_cursor)
                    .map(|n| self.text(n).to_string())
                    .collect();
                out.push(BodyEvent::Bind {
                    names,
                    values: node
                        .child_by_field_name("value")
                        .map(|v| self.expr_list(v))
                        .unwrap_or_default(),
                    ty: node.child_by_field_name("type").map(|t| self.type_expr(t)),
                    range: false,
                });
            }
            "range_clause" => {
                let Some(right) = node.child_by_field_name("right") else {
                    return;
                };
                self.body(right, out);
                if let Some(left) = node.child_by_field_name("left") {
                    out.push(BodyEvent::Bind {
                        names: self.expr_list_names(left),
                        values: vec![self.expr(right)],
                        ty: None,
                        range: true,
                    });
                }
            }
            "func_literal" => {
                if let Some(list) = node.child_by_field_name("parameters") {
                    for param in self.params(list) {
                        out.push(BodyEvent::Bind {
                            names: param.names,
                            values: Vec::new(),
                            ty: Some(param.ty),
                            range: false,
                        });
                    }
                }
                if let Some(body) = node.child_by_field_name("body") {
                    self.body(body, out);
                }
            }
            "call_expression" => {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    self.body(child, out);
                }
                out.push(BodyEvent::Call {
                    expr: self.expr(node),
                    line: node.start_position().row + 1,
                });
            }
            _ => {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    self.body(child, out);
                }
            }
        }
    }

    fn expr_list(&self, node: Node) -> Vec<Expr> {
        if node.kind() != "expression_list" {
            return vec![self.expr(node)];
        }
        let mut cursor = node.walk();
        let exprs = node
            .named_children(&mut cursor)
            .filter(|c| c.kind() != "comment")
            .map(|c| self.expr(c))
            .collect();
        exprs
    }

    fn expr_list_names(&self, node: Node) -> Vec<String> {
        self.expr_list(node)
            .into_iter()
            .map(|e| match e {
                Expr::Ident(name) => name,
                _ => "_".to_string(),
            })
            .collect()
    }

    fn expr(&self, node: Node) -> Expr {
        match node.kind() {
            "identifier" => Expr::Ident(self.text(node).to_string()),
            "selector_expression" => match (
                node.child_by_field_name("operand"),
                node.child_by_field_name("field"),
            ) {
                (Some(operand), Some(field)) => {
                    Expr::Selector(Box::new(self.expr(operand)), self.text(field).to_string())
                }
                _ => Expr::Other,
            },
            "call_expression" => {
                let Some(func) = node.child_by_field_name("function") else {
                    return Expr::Other;
                };
                let args = node
                    .child_by_field_name("arguments")
                    .map(|a| {
                        let mut cursor = a.walk();
                        let count = a
                            .named_children(&mut cursor)
                            .filter(|c| c.kind() != "comment")
                            .count();
                        count
                    })
                    .unwrap_or(0);
                Expr::Call {
                    func: Box::new(self.expr(func)),
                    args,
                }
            }
            "composite_literal" => match node.child_by_field_name("type") {
                Some(ty) => Expr::Composite(self.type_expr(ty)),
                None => Expr::Other,
            },
            "unary_expression" => {
                let operator = node
                    .child_by_field_name("operator")
                    .map(|op| self.text(op))
                    .unwrap_or("");
                let Some(operand) = node.child_by_field_name("operand") else {
                    return Expr::Other;
                };
                match operator {
                    "&" => Expr::AddrOf(Box::new(self.expr(operand))),
                    "*" => Expr::Deref(Box::new(self.expr(operand))),
                    _ => Expr::Other,
                }
            }
            "parenthesized_expression" => match node.named_child(0) {
                Some(inner) => self.expr(inner),
                None => Expr::Other,
            },
            "type_assertion_expression" => match node.child_by_field_name("type") {
                Some(ty) => Expr::Assert(self.type_expr(ty)),
                None => Expr::Other,
            },
            "index_expression" => match node.child_by_field_name("operand") {
                Some(operand) => Expr::Index(Box::new(self.expr(operand))),
                None => Expr::Other,
            },
            _ => Expr::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: &str = r#"
package store

import (
	"context"
	yaml "gopkg.in/yaml.v3"
	"example.com/app/internal/db"
)

type Store interface {
	Get(ctx context.Context, key string) ([]byte, error)
	db.Closer
}

type memStore struct {
	*db.Pool
	items map[string][]byte
}

func (m *memStore) Get(ctx context.Context, key string) ([]byte, error) {
	v := m.items[key]
	return v, nil
}
"#;

    fn parse(src: &str) -> ParsedFile {
        GoParser::new().unwrap().parse("store.go", src).unwrap()
    }

    #[test]
    fn parses_package_and_imports() {
        let file = parse(SRC);
        assert_eq!(file.package, "store");
        let names: Vec<_> = file.imports.iter().filter_map(|i| i.local_name()).collect();
        assert_eq!(names, vec!["context", "yaml", "db"]);
    }

    #[test]
    fn parses_interface_methods_and_embeds() {
        let file = parse(SRC);
        let ParsedDecl::Type(store) = &file.decls[0] else {
            panic!("expected type decl");
        };
        let TypeExpr::Interface(elems) = &store.expr else {
            panic!("expected interface");
        };
        assert_eq!(elems.len(), 2);
        assert!(matches!(&elems[0], IfaceElem::Method { name, .. } if name == "Get"));
        assert!(matches!(&elems[1], IfaceElem::Embedded { .. }));
    }

    #[test]
    fn embedded_pointer_field_keeps_indirection() {
        let file = parse(SRC);
        let ParsedDecl::Type(mem) = &file.decls[1] else {
            panic!("expected type decl");
        };
        let TypeExpr::Struct(fields) = &mem.expr else {
            panic!("expected struct");
        };
        assert!(fields[0].embedded);
        assert!(matches!(fields[0].ty, TypeExpr::Pointer(_)));
        assert_eq!(fields[1].names, vec!["items".to_string()]);
    }

    #[test]
    fn method_receiver_and_span() {
        let file = parse(SRC);
        let ParsedDecl::Func(get) = &file.decls[2] else {
            panic!("expected func decl");
        };
        assert_eq!(get.name, "Get");
        let recv = get.receiver.as_ref().expect("receiver");
        assert_eq!(recv.names, vec!["m".to_string()]);
        assert!(matches!(recv.ty, TypeExpr::Pointer(_)));
        assert_eq!(get.sig.results.len(), 2);
        assert_eq!(get.span.end - get.span.start, 3);
    }

    #[test]
    fn build_ignore_constraint_is_detected() {
        assert!(is_build_ignored("//go:build ignore\n\npackage main\n"));
        assert!(!is_build_ignored("//go:build linux\n\npackage main\n"));
        assert!(!is_build_ignored("package main\n// +build ignore\n"));
    }
}
