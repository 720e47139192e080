use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::op::InstructionParseError;
use crate::analyzer::Diagnostic;
use crate::lang::Node;

#[derive(Debug, Error)]
pub enum CompileError {
    /// Analysis reported problems; nothing was generated.
    #[error("semantic analysis failed with {} error(s)", .0.len())]
    Semantic(Vec<Diagnostic>),

    /// A tree shape the lowering cannot handle. Analysis rejects these first,
    /// so reaching one means the tree bypassed it.
    #[error("malformed {what} on line {line}")]
    Malformed { what: &'static str, line: usize },

    #[error("cannot access '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: InstructionParseError,
    },
}

impl CompileError {
    pub fn malformed(node: &Node, what: &'static str) -> Self {
        CompileError::Malformed { what, line: node.line }
    }

    pub fn io(path: &Path, source: io::Error) -> Self {
        CompileError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Diagnostics carried by a failed analysis.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            CompileError::Semantic(diagnostics) => diagnostics,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::NodeKind;

    #[test]
    fn test_messages() {
        let node = Node::new(NodeKind::While, "", 7);
        assert_eq!(
            CompileError::malformed(&node, "while loop").to_string(),
            "malformed while loop on line 7"
        );
        assert_eq!(
            CompileError::Semantic(Vec::new()).to_string(),
            "semantic analysis failed with 0 error(s)"
        );

        let err = CompileError::io(Path::new("out.bc"), io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(err.to_string(), "cannot access 'out.bc'");
        assert!(err.diagnostics().is_empty());
    }
}
