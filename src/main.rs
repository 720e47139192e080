use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use minijava::bytecode::{BytecodeContainer, CompileError, Compiler, CompilerConfig, disassemble};
use minijava::cfg::to_dot;
use minijava::lang::Node;
use minijava::runtime::{Interpreter, InterpreterConfig};

/// Compile a MiniJava syntax tree to stack bytecode and run it
#[derive(Parser)]
#[command(name = "minijava", version, long_about = None)]
struct Cli {
    /// AST JSON file (or bytecode file with --interpret)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Bytecode output path (default: INPUT with a .bc extension)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Interpret the bytecode after a successful compile
    #[arg(long)]
    run: bool,

    /// Treat INPUT as a bytecode file and only run it
    #[arg(long, conflicts_with_all = ["output", "run", "dot", "symbols"])]
    interpret: bool,

    /// Write the control-flow graphs as Graphviz DOT
    #[arg(long, value_name = "PATH")]
    dot: Option<PathBuf>,

    /// Print the symbol table tree
    #[arg(long)]
    symbols: bool,

    /// Print the indented bytecode listing
    #[arg(long)]
    listing: bool,

    /// Entry method name in the main class
    #[arg(long, value_name = "NAME", default_value = "main")]
    entry: String,

    /// Stop the interpreter after this many instructions
    #[arg(long, value_name = "N")]
    max_steps: Option<usize>,
}

fn main() -> ExitCode {
    // Initialize tracing if MINIJAVA_LOG is set
    if let Ok(filter) = EnvFilter::try_from_env("MINIJAVA_LOG") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(io::stderr)
            .init();
        tracing::debug!("tracing initialized");
    }

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(CompileError::Semantic(diagnostics)) = err.downcast_ref::<CompileError>() {
                for diagnostic in diagnostics {
                    eprintln!("error: {}", diagnostic);
                }
            }
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    if cli.interpret {
        let text = fs::read_to_string(&cli.input)
            .with_context(|| format!("failed to read '{}'", cli.input.display()))?;
        if cli.listing {
            print!("{}", disassemble(&BytecodeContainer::from_text(&text)?));
        }
        return interpret(cli, &text);
    }

    let source = fs::read_to_string(&cli.input)
        .with_context(|| format!("failed to read '{}'", cli.input.display()))?;
    let program = Node::from_json(&source)
        .with_context(|| format!("failed to parse syntax tree in '{}'", cli.input.display()))?;

    let compiler = Compiler::with_config(CompilerConfig {
        entry_method: cli.entry.clone(),
    });
    let compilation = compiler.compile(&program)?;

    if cli.symbols {
        print!("{}", compilation.symbols.render());
    }
    if let Some(path) = &cli.dot {
        fs::write(path, to_dot(&compilation.entry_points))
            .with_context(|| format!("failed to write '{}'", path.display()))?;
    }
    if cli.listing {
        print!("{}", disassemble(&compilation.bytecode));
    }

    let output = cli.output.clone().unwrap_or_else(|| default_output(&cli.input));
    compilation.bytecode.write_to_file(&output)?;

    if cli.run {
        interpret(cli, &compilation.bytecode.to_text())?;
    }
    Ok(())
}

fn interpret(cli: &Cli, text: &str) -> Result<()> {
    let config = InterpreterConfig {
        entry_method: cli.entry.clone(),
        max_steps: cli.max_steps,
    };
    let stdout = io::stdout();
    Interpreter::with_config(text, config).run(&mut stdout.lock())?;
    Ok(())
}

fn default_output(input: &Path) -> PathBuf {
    input.with_extension("bc")
}
