use crate::config::ContextRefConfig;
use crate::types::{ContextRef, RefKind};
use std::collections::HashSet;
use std::sync::Arc;
use xref_index::{FuncDecl, Index};
use xref_program::{normalize_code, FunctionRecord, LineSource, TypeId};

/// Cut lines `start..=end` (1-based) out of a file, clipping the range to
/// `max_lines` lines and to the end of the file.
///
/// Returns the clipped end line and the normalized text; `None` when the
/// request is out of range.
pub fn slice_lines(
    lines: &[String],
    start: usize,
    end: usize,
    max_lines: usize,
) -> Option<(usize, String)> {
    if start < 1 || end < start || start > lines.len() || max_lines == 0 {
        return None;
    }
    let end = end.min(lines.len()).min(start + max_lines - 1);
    let code = lines[start - 1..end].join("\n");
    Some((end, normalize_code(&code)))
}

/// Picks the few excerpts that best explain a function: receiver shape,
/// satisfied interface contract, counterpart method, constructor
pub struct ContextSelector<S> {
    config: ContextRefConfig,
    index: Arc<Index>,
    source: S,
}

impl<S: LineSource> ContextSelector<S> {
    pub fn new(config: ContextRefConfig, index: Arc<Index>, source: S) -> Self {
        Self {
            config: config.clamped(),
            index,
            source,
        }
    }

    pub fn config(&self) -> &ContextRefConfig {
        &self.config
    }

    /// Ordered, deduplicated, capped references for one function.
    /// Free functions and unresolvable receivers yield nothing.
    pub fn select(&self, func: &FunctionRecord) -> Vec<ContextRef> {
        let Some(hint) = func.recv_base_type() else {
            return Vec::new();
        };
        let Some(receiver) = self
            .index
            .resolve_receiver_named(&func.path, &func.name, Some(hint))
        else {
            log::debug!("No receiver for {} in {}", func.symbol(), func.path);
            return Vec::new();
        };
        let recv = receiver.ty;

        let mut refs = Vec::new();
        refs.extend(self.receiver_type_ref(recv));
        refs.extend(self.interface_method_ref(recv, &func.name));
        if self.config.enable_counterparts {
            refs.extend(self.counterpart_method_ref(recv, &func.path, &func.name));
        }
        refs.extend(self.constructor_ref(recv));

        let mut refs = dedup_refs(refs);
        refs.sort_by(|a, b| a.path.cmp(&b.path).then(a.start_line.cmp(&b.start_line)));
        refs.truncate(self.config.max_refs);
        refs
    }

    fn type_name(&self, ty: TypeId) -> Option<String> {
        let program = self.index.program()?;
        Some(program.named(ty).name.clone())
    }

    fn receiver_type_ref(&self, recv: TypeId) -> Option<ContextRef> {
        let decl = self.index.receiver_decl(recv)?;
        self.slice(
            &decl.file,
            decl.start_line,
            decl.end_line,
            RefKind::ReceiverType,
            decl.name.clone(),
        )
    }

    fn interface_method_ref(&self, recv: TypeId, method: &str) -> Option<ContextRef> {
        // same package as the receiver first, then file, then name
        let ifaces = self.index.implemented_interfaces_declaring(recv, method);
        ifaces.into_iter().find_map(|iface| {
            let declared = iface.method(method)?;
            self.slice(
                &iface.file,
                declared.start_line,
                declared.end_line,
                RefKind::InterfaceMethod,
                format!("{}.{method}", iface.name),
            )
        })
    }

    fn counterpart_method_ref(&self, recv: TypeId, file: &str, method: &str) -> Option<ContextRef> {
        let mut found: Vec<&FuncDecl> =
            self.index
                .counterpart_methods_on(recv, method, &self.config.counterparts);
        found.sort_by(|a, b| {
            (a.file != file)
                .cmp(&(b.file != file))
                .then_with(|| a.file.cmp(&b.file))
                .then(a.start_line.cmp(&b.start_line))
        });

        let decl = found.first()?;
        let label = format!("{}.{}", self.type_name(recv)?, decl.name);
        self.slice(
            &decl.file,
            decl.start_line,
            decl.end_line,
            RefKind::CounterpartMethod,
            label,
        )
    }

    fn constructor_ref(&self, recv: TypeId) -> Option<ContextRef> {
        // already ordered by file, then line
        let decl = self.index.constructors_for(recv).into_iter().next()?;
        self.slice(
            &decl.file,
            decl.start_line,
            decl.end_line,
            RefKind::FactoryConstructor,
            decl.name.clone(),
        )
    }

    fn slice(
        &self,
        path: &str,
        start: usize,
        end: usize,
        kind: RefKind,
        symbol: String,
    ) -> Option<ContextRef> {
        let lines = self.source.lines(path)?;
        let (end, code) = slice_lines(lines, start, end, self.config.max_lines)?;
        Some(ContextRef {
            path: path.to_string(),
            start_line: start,
            end_line: end,
            code,
            kind,
            symbol: Some(symbol),
            why: kind.why().to_string(),
        })
    }
}

fn dedup_refs(refs: Vec<ContextRef>) -> Vec<ContextRef> {
    let mut seen = HashSet::new();
    refs.into_iter()
        .filter(|r| seen.insert((r.path.clone(), r.start_line, r.end_line)))
        .collect()
}
