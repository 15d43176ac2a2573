use crate::config::XrefConfig;
use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;
use xref_context::{ContextRef, ContextSelector};
use xref_graph::{CallGraphEngine, Edge};
use xref_index::Index;
use xref_program::{recv_label, FunctionRecord, Program, SourceCache};

/// Call graph neighbors attached to a function
#[derive(Debug, Clone, Serialize)]
pub struct CallGraphInfo {
    pub callees: Vec<Edge>,
    pub callers: Vec<Edge>,
    pub precision: &'static str,
}

/// One emitted line of `xref scan`
#[derive(Debug, Clone, Serialize)]
pub struct FunctionEntry {
    pub path: String,
    pub symbol: String,
    pub start_line: usize,
    pub end_line: usize,
    pub call_graph: CallGraphInfo,
    pub context_refs: Vec<ContextRef>,
}

fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Describe every concrete function of `program`, ordered by
/// (path, start line). The program is shared by the index, the engine and
/// the source cache; nothing is loaded twice.
pub fn scan(program: Arc<Program>, config: &XrefConfig) -> Vec<FunctionEntry> {
    let engine = CallGraphEngine::new();
    engine.init_with_program(Arc::clone(&program));

    let source = SourceCache::from_program(&program);
    let index = Arc::new(Index::build(Arc::clone(&program)));
    let selector = ContextSelector::new(config.context_refs.clone(), index, source);

    let mut entries: Vec<FunctionEntry> = program
        .funcs()
        .iter()
        .filter(|func| func.is_concrete() && func.name != "_")
        .filter(|func| config.include_private || is_exported(&func.name))
        .map(|func| {
            let path = program.unit(func.unit).path.clone();
            let recv = recv_label(&program, func.id).map(|label| format!("({label})"));
            let record = FunctionRecord::new(path.clone(), func.name.clone(), recv);
            let symbol = record.symbol();

            FunctionEntry {
                call_graph: CallGraphInfo {
                    callees: engine.get_callees(&path, &symbol, config.max_callees),
                    callers: engine.get_callers(&path, &symbol, config.max_callers),
                    precision: "native",
                },
                context_refs: selector.select(&record),
                start_line: func.span.start,
                end_line: func.span.end,
                path,
                symbol,
            }
        })
        .collect();

    entries.sort_by(|a, b| a.path.cmp(&b.path).then(a.start_line.cmp(&b.start_line)));
    log::info!("Scanned {} functions", entries.len());
    entries
}

/// Write one JSON object per line
pub fn write_jsonl<W: Write>(entries: &[FunctionEntry], mut out: W) -> Result<()> {
    for entry in entries {
        serde_json::to_writer(&mut out, entry)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}
