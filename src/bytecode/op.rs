use std::fmt;
use std::str::FromStr;

use thiserror::Error;

// =============================================================================
// INSTRUCTION - one line of the bytecode text format
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    // labels
    /// `Class.method:`
    MethodLabel(String),
    /// `L3:`
    BlockLabel(String),

    // locals and literals
    Iload(String),
    /// Kept as written; decoded when executed.
    Iconst(String),
    Istore(String),

    // integer / boolean arithmetic
    Iadd,
    Isub,
    Imul,
    Idiv,
    Inot,
    Iand,
    Ior,
    Ieq,
    Ilt,
    Igt,

    // control flow
    Goto(String),
    IfFalseGoto(String),
    /// Target is `Class.method`, or `this.method` for a call on self.
    InvokeVirtual(String),
    Ireturn,
    Print,
    Stop,

    // ==========================================================================
    // Heap opcodes: emitted for object and array expressions, not executed
    // ==========================================================================
    New(String),
    NewArray,
    ArrayLoad,
    ArrayStore,
    ArrayLength,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstructionParseError {
    #[error("empty instruction")]
    Empty,

    #[error("unknown opcode '{0}'")]
    UnknownOpcode(String),

    #[error("'{0}' requires an argument")]
    MissingArgument(&'static str),

    #[error("'{opcode}' takes no argument, found '{argument}'")]
    UnexpectedArgument { opcode: &'static str, argument: String },
}

impl Instruction {
    pub fn opcode(&self) -> &'static str {
        match self {
            Instruction::MethodLabel(_) | Instruction::BlockLabel(_) => "label",
            Instruction::Iload(_) => "iload",
            Instruction::Iconst(_) => "iconst",
            Instruction::Istore(_) => "istore",
            Instruction::Iadd => "iadd",
            Instruction::Isub => "isub",
            Instruction::Imul => "imul",
            Instruction::Idiv => "idiv",
            Instruction::Inot => "inot",
            Instruction::Iand => "iand",
            Instruction::Ior => "ior",
            Instruction::Ieq => "ieq",
            Instruction::Ilt => "ilt",
            Instruction::Igt => "igt",
            Instruction::Goto(_) => "goto",
            Instruction::IfFalseGoto(_) => "iffalse",
            Instruction::InvokeVirtual(_) => "invokevirtual",
            Instruction::Ireturn => "ireturn",
            Instruction::Print => "print",
            Instruction::Stop => "stop",
            Instruction::New(_) => "new",
            Instruction::NewArray => "newarray",
            Instruction::ArrayLoad => "iaload",
            Instruction::ArrayStore => "iastore",
            Instruction::ArrayLength => "arraylength",
        }
    }

    /// Name of a label line.
    pub fn label(&self) -> Option<&str> {
        match self {
            Instruction::MethodLabel(name) | Instruction::BlockLabel(name) => Some(name.as_str()),
            _ => None,
        }
    }

    /// Decode one line. Surrounding whitespace is ignored.
    pub fn parse(line: &str) -> Result<Self, InstructionParseError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(InstructionParseError::Empty);
        }

        if let Some(label) = line.strip_suffix(':')
            && !label.contains(char::is_whitespace)
        {
            return Ok(if label.contains('.') {
                Instruction::MethodLabel(label.to_string())
            } else {
                Instruction::BlockLabel(label.to_string())
            });
        }

        let (opcode, argument) = match line.split_once(' ') {
            Some((opcode, argument)) => (opcode, Some(argument.trim()).filter(|a| !a.is_empty())),
            None => (line, None),
        };

        let instruction = match opcode {
            "iload" => Instruction::Iload(required("iload", argument)?.to_string()),
            "iconst" => Instruction::Iconst(required("iconst", argument)?.to_string()),
            "istore" => Instruction::Istore(required("istore", argument)?.to_string()),
            "goto" => Instruction::Goto(target(required("goto", argument)?)),
            "iffalse" => {
                let argument = required("iffalse", argument)?;
                let label = argument
                    .strip_prefix("goto")
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .ok_or(InstructionParseError::MissingArgument("iffalse goto"))?;
                Instruction::IfFalseGoto(target(label))
            }
            "invokevirtual" => Instruction::InvokeVirtual(required("invokevirtual", argument)?.to_string()),
            "new" => Instruction::New(required("new", argument)?.to_string()),
            _ => {
                let instruction = match opcode {
                    "iadd" => Instruction::Iadd,
                    "isub" => Instruction::Isub,
                    "imul" => Instruction::Imul,
                    "idiv" => Instruction::Idiv,
                    "inot" => Instruction::Inot,
                    "iand" => Instruction::Iand,
                    "ior" => Instruction::Ior,
                    "ieq" => Instruction::Ieq,
                    "ilt" => Instruction::Ilt,
                    "igt" => Instruction::Igt,
                    "ireturn" => Instruction::Ireturn,
                    "print" => Instruction::Print,
                    "stop" => Instruction::Stop,
                    "newarray" => Instruction::NewArray,
                    "iaload" => Instruction::ArrayLoad,
                    "iastore" => Instruction::ArrayStore,
                    "arraylength" => Instruction::ArrayLength,
                    other => return Err(InstructionParseError::UnknownOpcode(other.to_string())),
                };
                if let Some(argument) = argument {
                    return Err(InstructionParseError::UnexpectedArgument {
                        opcode: instruction.opcode(),
                        argument: argument.to_string(),
                    });
                }
                instruction
            }
        };
        Ok(instruction)
    }
}

fn required<'l>(opcode: &'static str, argument: Option<&'l str>) -> Result<&'l str, InstructionParseError> {
    argument.ok_or(InstructionParseError::MissingArgument(opcode))
}

/// Jump targets may be written with the label's trailing colon.
fn target(label: &str) -> String {
    label.strip_suffix(':').unwrap_or(label).to_string()
}

impl FromStr for Instruction {
    type Err = InstructionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Instruction::parse(s)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::MethodLabel(name) | Instruction::BlockLabel(name) => write!(f, "{}:", name),
            Instruction::Iload(arg)
            | Instruction::Iconst(arg)
            | Instruction::Istore(arg)
            | Instruction::Goto(arg)
            | Instruction::InvokeVirtual(arg)
            | Instruction::New(arg) => write!(f, "{} {}", self.opcode(), arg),
            Instruction::IfFalseGoto(label) => write!(f, "iffalse goto {}", label),
            _ => f.write_str(self.opcode()),
        }
    }
}
