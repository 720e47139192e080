use std::fs;
use std::path::Path;

use super::compile_error::CompileError;
use super::op::Instruction;

/// A generated instruction stream.
///
/// While methods are being emitted, positions of instructions that must not
/// reach the output are collected with [`mark_dead`](Self::mark_dead) and
/// removed in one pass by [`remove_dead`](Self::remove_dead).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BytecodeContainer {
    instructions: Vec<Instruction>,
    dead: Vec<usize>,
}

impl BytecodeContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instruction and return its position.
    pub fn push(&mut self, instruction: Instruction) -> usize {
        self.instructions.push(instruction);
        self.instructions.len() - 1
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Instruction> {
        self.instructions.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn mark_dead(&mut self, index: usize) {
        self.dead.push(index);
    }

    pub fn dead(&self) -> &[usize] {
        &self.dead
    }

    /// Delete every marked position, highest first so pending positions stay
    /// valid. Returns how many instructions were removed.
    pub fn remove_dead(&mut self) -> usize {
        let mut dead = std::mem::take(&mut self.dead);
        dead.sort_unstable_by(|a, b| b.cmp(a));
        dead.dedup();

        let mut removed = 0;
        for index in dead {
            if index < self.instructions.len() {
                self.instructions.remove(index);
                removed += 1;
            }
        }
        removed
    }

    // =========================================================================
    // Text form
    // =========================================================================

    /// One instruction per line.
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for instruction in &self.instructions {
            text.push_str(&instruction.to_string());
            text.push('\n');
        }
        text
    }

    /// Parse the text form. Blank lines are skipped.
    pub fn from_text(text: &str) -> Result<Self, CompileError> {
        let mut container = Self::new();
        for (number, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let instruction = Instruction::parse(line).map_err(|source| CompileError::Parse {
                line: number + 1,
                source,
            })?;
            container.push(instruction);
        }
        Ok(container)
    }

    pub fn write_to_file(&self, path: &Path) -> Result<(), CompileError> {
        fs::write(path, self.to_text()).map_err(|e| CompileError::io(path, e))?;
        tracing::info!(path = %path.display(), instructions = self.len(), "bytecode written");
        Ok(())
    }

    pub fn read_from_file(path: &Path) -> Result<Self, CompileError> {
        let text = fs::read_to_string(path).map_err(|e| CompileError::io(path, e))?;
        Self::from_text(&text)
    }
}
