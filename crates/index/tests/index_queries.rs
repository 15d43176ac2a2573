use pretty_assertions::assert_eq;
use std::sync::Arc;
use xref_index::{CounterpartRules, Index, TypeDecl};
use xref_program::{GoLoader, Program, TypeId};

const WIDGET: &str = r#"package widget

import "example.com/app/ui"

// Widget is a drawable thing.
type Widget struct {
	name string
	view ui.View
}

func NewWidget() *Widget {
	return &Widget{}
}

func (w *Widget) Render() string { return w.name }

func (w *Widget) Open() error { return nil }

func (w *Widget) Close() error { return nil }

type Gadget struct{}

func (g Gadget) Render() string { return "gadget" }
"#;

const IFACE: &str = r#"package widget

type Renderer interface {
	Render() string
}

type Closer interface {
	Close() error
}

type ReadCloser interface {
	Read(p []byte) (int, error)
	Close() error
}

type ClosingRenderer interface {
	Closer
	Render() string
}
"#;

const BUILD: &str = r#"package widget

func NewWidgetNamed(name string) (*Widget, error) {
	return &Widget{name: name}, nil
}

func newHelper() *Widget { return nil }

func NewGadget() Gadget { return Gadget{} }

func (w *Widget) NewChild() *Widget { return &Widget{} }
"#;

const UI: &str = r#"package ui

type View interface {
	Render() string
}
"#;

fn index() -> Index {
    let program = GoLoader::from_sources(
        "example.com/app",
        &[
            ("widget/widget.go", WIDGET),
            ("widget/iface.go", IFACE),
            ("widget/build.go", BUILD),
            ("ui/ui.go", UI),
        ],
    )
    .expect("program");
    Index::build(Arc::new(program))
}

fn ty(index: &Index, name: &str) -> TypeId {
    let program: &Program = index.program().expect("program");
    program
        .types()
        .iter()
        .find(|t| t.name == name)
        .expect("type")
        .id
}

fn names<T>(items: &[&T], name: impl Fn(&T) -> &str) -> Vec<String> {
    items.iter().map(|item| name(item).to_string()).collect()
}

#[test]
fn receiver_decl_returns_exact_declaration() {
    let index = index();
    let widget = ty(&index, "Widget");

    assert_eq!(
        index.receiver_decl(widget),
        Some(&TypeDecl {
            package: "example.com/app/widget".to_string(),
            file: "widget/widget.go".to_string(),
            start_line: 6,
            end_line: 9,
            name: "Widget".to_string(),
            is_struct: true,
        })
    );

    // interfaces never get a TypeDecl
    let renderer = ty(&index, "Renderer");
    assert!(index.receiver_decl(renderer).is_none());
}

#[test]
fn resolves_receiver_with_and_without_hint() {
    let index = index();
    let widget = ty(&index, "Widget");
    let gadget = ty(&index, "Gadget");

    let first = index
        .resolve_receiver_named("widget/widget.go", "Render", None)
        .expect("receiver");
    assert_eq!(first.ty, widget);
    assert_eq!(first.package, "example.com/app/widget");

    let hinted = index
        .resolve_receiver_named("widget/widget.go", "Render", Some("Gadget"))
        .expect("receiver");
    assert_eq!(hinted.ty, gadget);

    // not declared in that file: whole-program fallback
    let fallback = index
        .resolve_receiver_named("widget/other.go", "Open", None)
        .expect("receiver");
    assert_eq!(fallback.ty, widget);

    assert!(index
        .resolve_receiver_named("widget/widget.go", "NewWidget", None)
        .is_none());
    assert!(index
        .resolve_receiver_named("widget/widget.go", "Render", Some("Missing"))
        .is_none());
}

#[test]
fn implemented_interfaces_are_structural_and_ordered() {
    let index = index();
    let widget = ty(&index, "Widget");
    let gadget = ty(&index, "Gadget");

    let found = index.implemented_interfaces_declaring(widget, "Render");
    assert_eq!(
        names(&found, |d| d.name.as_str()),
        vec!["ClosingRenderer", "Renderer", "View"]
    );

    // Gadget lacks Close, so ClosingRenderer must not appear
    let found = index.implemented_interfaces_declaring(gadget, "Render");
    assert_eq!(names(&found, |d| d.name.as_str()), vec!["Renderer", "View"]);

    // ReadCloser also needs Read; ClosingRenderer only embeds Close
    let found = index.implemented_interfaces_declaring(widget, "Close");
    assert_eq!(names(&found, |d| d.name.as_str()), vec!["Closer"]);
}

#[test]
fn per_package_and_per_file_tables() {
    let index = index();

    let types: Vec<_> = index
        .type_decls("example.com/app/widget")
        .iter()
        .map(|d| (d.name.as_str(), d.is_struct))
        .collect();
    assert_eq!(types, vec![("Widget", true), ("Gadget", true)]);
    assert!(index.type_decls("example.com/app/ui").is_empty());

    let methods: Vec<_> = index
        .func_decls_in_file("widget/build.go")
        .iter()
        .filter(|d| d.is_method())
        .map(|d| d.name.as_str())
        .collect();
    assert_eq!(methods, vec!["NewChild"]);
}

#[test]
fn interface_methods_exclude_embedded_members() {
    let index = index();
    let decl = index
        .interface_decls("example.com/app/widget")
        .iter()
        .find(|d| d.name == "ClosingRenderer")
        .expect("interface");

    let methods: Vec<_> = decl.methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(methods, vec!["Render"]);
    assert_eq!(decl.methods[0].start_line, 18);
    assert!(decl.methods[0].func.is_some());
}

#[test]
fn constructors_are_exported_free_functions_returning_the_type() {
    let index = index();
    let widget = ty(&index, "Widget");
    let gadget = ty(&index, "Gadget");

    let found = index.constructors_for(widget);
    assert_eq!(
        names(&found, |d| d.name.as_str()),
        vec!["NewWidgetNamed", "NewWidget"]
    );

    let found = index.constructors_for(gadget);
    assert_eq!(names(&found, |d| d.name.as_str()), vec!["NewGadget"]);
}

#[test]
fn single_constructor_scenario() {
    let program = GoLoader::from_sources(
        "example.com/w",
        &[(
            "w.go",
            "package w\n\ntype Widget struct{}\n\nfunc NewWidget() *Widget { return &Widget{} }\n",
        )],
    )
    .expect("program");
    let index = Index::build(Arc::new(program));
    let widget = ty(&index, "Widget");

    let found = index.constructors_for(widget);
    assert_eq!(names(&found, |d| d.name.as_str()), vec!["NewWidget"]);
}

#[test]
fn counterparts_follow_rules() {
    let index = index();
    let widget = ty(&index, "Widget");

    let found = index.counterpart_methods_on(widget, "Open", &CounterpartRules::common());
    assert_eq!(names(&found, |d| d.name.as_str()), vec!["Close"]);

    let found = index.counterpart_methods_on(widget, "Close", &CounterpartRules::common());
    assert_eq!(names(&found, |d| d.name.as_str()), vec!["Open"]);

    assert!(index
        .counterpart_methods_on(widget, "Open", &CounterpartRules::default())
        .is_empty());
}

#[test]
fn load_without_manifest_is_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("main.go"), "package main\n").expect("write");

    let index = Index::load(dir.path(), &GoLoader::new());
    assert!(index.is_empty());
    assert!(index.program().is_none());
}
