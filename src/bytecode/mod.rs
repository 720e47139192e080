pub mod compile;
pub mod compile_error;
pub mod disasm;
pub mod emit;
pub mod ir;
pub mod op;

pub use compile::{Compilation, Compiler, CompilerConfig};
pub use compile_error::CompileError;
pub use disasm::disassemble;
pub use ir::BytecodeContainer;
pub use op::{Instruction, InstructionParseError};
