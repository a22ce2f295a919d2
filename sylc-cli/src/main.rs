use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

/// Which stage of the pipeline to print.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Emit the textual IR.
    Ir,
    /// Emit RV32 assembly.
    Asm,
}

#[derive(Parser)]
#[command(name = "sylc", version, about = "Compile SyL source to IR or RV32 assembly")]
struct Args {
    /// Output stage
    #[arg(value_enum)]
    mode: Mode,

    /// Source file to compile
    input: PathBuf,

    /// Where to write the output
    #[arg(short = 'o', long = "output")]
    output: PathBuf,
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;

    let result = match args.mode {
        Mode::Ir => sylc_compiler::compile_to_ir(&source).map(|program| program.to_text()),
        Mode::Asm => sylc_compiler::compile_to_riscv(&source),
    };

    let text = match result {
        Ok(text) => text,
        Err(err) => {
            eprintln!("{err}");
            return Ok(ExitCode::FAILURE);
        }
    };

    fs::write(&args.output, text)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    Ok(ExitCode::SUCCESS)
}
