use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const LIB: &str = r#"package notes

type Book struct {
	pages []string
}

func NewBook() *Book {
	return &Book{}
}

func (b *Book) Open() error { return nil }

func (b *Book) Close() error { return nil }

func Read() {
	b := NewBook()
	b.Open()
	b.Close()
}
"#;

fn setup_module() -> tempfile::TempDir {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("go.mod"), "module example.com/notes\n").unwrap();
    fs::write(temp.path().join("notes.go"), LIB).unwrap();
    temp
}

#[allow(deprecated)]
fn xref(root: &Path, args: &[&str]) -> Vec<u8> {
    let output = Command::cargo_bin("xref")
        .expect("binary")
        .arg("--quiet")
        .args(args)
        .arg(root)
        .output()
        .expect("command run");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    output.stdout
}

fn symbols(value: &Value) -> Vec<String> {
    value
        .as_array()
        .expect("array")
        .iter()
        .map(|v| v["symbol"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn scan_emits_sorted_jsonl() {
    let temp = setup_module();
    let stdout = xref(temp.path(), &["scan"]);
    let lines: Vec<Value> = String::from_utf8(stdout)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();

    let names: Vec<&str> = lines.iter().map(|l| l["symbol"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["NewBook", "(*Book).Open", "(*Book).Close", "Read"]);
    assert_eq!(lines[3]["call_graph"]["precision"], "native");
    assert_eq!(
        symbols(&lines[3]["call_graph"]["callees"]),
        vec!["(*Book).Close", "(*Book).Open", "NewBook"]
    );
}

#[test]
fn scan_writes_out_file() {
    let temp = setup_module();
    let out = temp.path().join("records.jsonl");
    let stdout = xref(temp.path(), &["scan", "--out", out.to_str().unwrap()]);
    assert!(stdout.is_empty());
    assert_eq!(fs::read_to_string(out).unwrap().lines().count(), 4);
}

#[test]
fn callers_and_callees_print_edges() {
    let temp = setup_module();
    let callers: Value = serde_json::from_slice(&xref(
        temp.path(),
        &["callers", "--file", "notes.go", "--symbol", "(*Book).Open"],
    ))
    .unwrap();
    assert_eq!(symbols(&callers), vec!["Read"]);
    assert_eq!(callers[0]["path"], "notes.go");

    let callees: Value = serde_json::from_slice(&xref(
        temp.path(),
        &["callees", "--file", "notes.go", "--symbol", "Read", "--max", "1"],
    ))
    .unwrap();
    assert_eq!(callees.as_array().unwrap().len(), 1);
}

#[test]
fn refs_with_counterparts() {
    let temp = setup_module();
    let refs: Value = serde_json::from_slice(&xref(
        temp.path(),
        &[
            "refs",
            "--file",
            "notes.go",
            "--name",
            "Open",
            "--recv",
            "(*Book)",
            "--max-refs",
            "8",
            "--counterparts",
        ],
    ))
    .unwrap();

    let kinds: Vec<&str> = refs
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["kind"].as_str().unwrap())
        .collect();
    assert_eq!(
        kinds,
        vec!["receiver_type", "factory_constructor", "counterpart_method"]
    );
    assert_eq!(refs[2]["symbol"], "Book.Close");
}

#[test]
fn missing_manifest_yields_empty_output() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("main.go"), "package main\n\nfunc main() {}\n").unwrap();

    assert!(xref(temp.path(), &["scan"]).is_empty());
    let edges: Value = serde_json::from_slice(&xref(
        temp.path(),
        &["callers", "--file", "main.go", "--symbol", "main"],
    ))
    .unwrap();
    assert_eq!(edges, Value::Array(Vec::new()));
}

#[test]
#[allow(deprecated)]
fn explicit_config_must_exist() {
    let temp = setup_module();
    Command::cargo_bin("xref")
        .expect("binary")
        .args(["--config", "missing.toml", "scan"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicates::str::contains("Failed to read config"));
}
