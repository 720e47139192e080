use super::compile_error::CompileError;
use super::emit::{MethodEmission, emit_method};
use super::ir::BytecodeContainer;
use super::op::Instruction;
use crate::analyzer::{SymbolTable, analyze};
use crate::cfg::{CfgBuilder, EntryPoint, NameGen};
use crate::lang::Node;

#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Name of the entry method declared in the main class.
    pub entry_method: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            entry_method: "main".to_string(),
        }
    }
}

/// Everything produced by a successful compile.
#[derive(Debug)]
pub struct Compilation<'a> {
    pub symbols: SymbolTable<'a>,
    pub entry_points: Vec<EntryPoint<'a>>,
    pub bytecode: BytecodeContainer,
}

/// Drives the backend: analysis, graph construction and emission.
pub struct Compiler {
    config: CompilerConfig,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self::with_config(CompilerConfig::default())
    }

    pub fn with_config(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile a program tree. Nothing is generated unless analysis reports
    /// no diagnostics at all.
    pub fn compile<'a>(&self, program: &'a Node) -> Result<Compilation<'a>, CompileError> {
        let symbols = SymbolTable::build(program);

        let diagnostics = analyze(&symbols);
        if !diagnostics.is_empty() {
            tracing::info!(errors = diagnostics.len(), "semantic analysis failed");
            return Err(CompileError::Semantic(diagnostics));
        }
        tracing::info!("semantic analysis passed");

        let entry_points = CfgBuilder::new(&symbols, NameGen::new()).build_all(&self.config.entry_method)?;
        let bytecode = self.emit(&entry_points);

        Ok(Compilation {
            symbols,
            entry_points,
            bytecode,
        })
    }

    /// Flatten every method into one stream, patch the startup call and drop
    /// the instructions marked dead on the way.
    pub fn emit(&self, entry_points: &[EntryPoint<'_>]) -> BytecodeContainer {
        let mut out = BytecodeContainer::new();

        if !entry_points.iter().any(|e| e.is_entry) {
            tracing::warn!(entry = %self.config.entry_method, "no entry method in the main class");
        }

        for entry_point in entry_points {
            let emission = emit_method(&mut out, entry_point);
            if entry_point.is_entry {
                patch_startup(&mut out, &emission);
            }
        }

        let removed = out.remove_dead();
        tracing::info!(instructions = out.len(), removed, "bytecode emitted");
        out
    }
}

/// Address the entry method's first call to the class its receiver was
/// constructed from, and drop that construction.
///
/// Only the first call is patched; any other construction stays in the
/// stream as a heap opcode.
fn patch_startup(out: &mut BytecodeContainer, emission: &MethodEmission) {
    let Some(call) = emission.call_sites.first() else {
        return;
    };
    let Some(construction) = emission
        .constructions
        .iter()
        .rev()
        .find(|c| c.store_index < call.invoke && c.result == call.receiver)
    else {
        tracing::debug!(receiver = %call.receiver, "startup call has no constructed receiver");
        return;
    };

    if let Some(Instruction::InvokeVirtual(target)) = out.get_mut(call.invoke) {
        *target = format!("{}.{}", construction.class, call.method);
    }
    out.mark_dead(construction.new_index);
    out.mark_dead(construction.store_index);

    tracing::debug!(
        class = %construction.class,
        method = %call.method,
        "startup call patched"
    );
}
