//! Go language front-end: tree-sitter parsing and a best-effort checker

mod check;
mod parse;

use crate::error::Result;
use crate::model::Program;
use check::CheckInput;
use parse::GoParser;
use std::path::PathBuf;

pub(crate) use parse::is_build_ignored;

/// Parse and check a set of `(repo-relative path, source)` files.
///
/// Files that cannot be parsed (e.g. missing package clause) are skipped.
pub(crate) fn build_program(
    root: PathBuf,
    module_path: &str,
    files: Vec<(String, String)>,
) -> Result<Program> {
    let mut parser = GoParser::new()?;
    let mut inputs = Vec::with_capacity(files.len());

    for (path, source) in files {
        match parser.parse(&path, &source) {
            Ok(parsed) => inputs.push(CheckInput {
                path,
                source,
                parsed,
            }),
            Err(e) => log::debug!("Skipping {path}: {e}"),
        }
    }

    Ok(check::check(root, module_path, inputs))
}
