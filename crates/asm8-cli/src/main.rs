//! `asm8`: assemble one or more source files into a flat ROM image.

mod hexdump;

use std::{fs, io, path::PathBuf, process::ExitCode};

use anyhow::{anyhow, bail, Context, Result};
use asm8::{AssemblyResult, Assembler};
use clap::Parser;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Input files to assemble, in order, as one program
    #[arg(value_name = "INPUT")]
    inputs: Vec<PathBuf>,

    /// Output file for the flat binary
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Size of the output binary; the image is padded up to it
    #[arg(short, long)]
    size: Option<usize>,

    /// Byte used for gaps between placed words
    #[arg(short, long, default_value = "0", value_parser = parse_byte)]
    fill: u8,

    /// Print the final assembly listing
    #[arg(short = 'v', long)]
    print_assembly: bool,

    /// Print a hexdump of the final binary (the default without `--output`)
    #[arg(short = 'x', long)]
    print_binary: bool,

    /// One of `TRACE`, `DEBUG`, `INFO`, `WARN`, or `ERROR`
    #[arg(short, long, default_value_t = Level::WARN)]
    log_level: Level,
}

fn parse_byte(s: &str) -> Result<u8, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse::<u8>(),
    };
    parsed.map_err(|e| format!("invalid byte `{s}`: {e}"))
}

fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(io::stderr)
        .init();

    if let Err(e) = main_real(args) {
        tracing::error!("{e:#}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn main_real(args: Args) -> Result<()> {
    let result = assemble_files(&args.inputs, args.print_assembly)?;

    if args.print_assembly {
        print!("{}", result.listing());
    }

    let binary = flatten(&result, args.fill, args.size)?;

    if let Some(path) = &args.output {
        fs::write(path, &binary)
            .with_context(|| format!("cannot write output file {}", path.display()))?;
        tracing::info!(bytes = binary.len(), path = %path.display(), "wrote binary");
    }

    if args.output.is_none() || args.print_binary {
        print!("{}", hexdump::hexdump(&binary));
    }
    Ok(())
}

/// Assembles `inputs` as one unit. Errors name the file of every location
/// they mention.
fn assemble_files(inputs: &[PathBuf], listing: bool) -> Result<AssemblyResult> {
    let names: Vec<String> = inputs.iter().map(|p| p.display().to_string()).collect();
    let mut asm = Assembler::new();
    if listing {
        asm.enable_listing();
    }
    for path in inputs {
        let source = fs::read_to_string(path)
            .with_context(|| format!("cannot read input file {}", path.display()))?;
        tracing::debug!(path = %path.display(), bytes = source.len(), "parsing");
        asm.emit(&source)
            .map_err(|e| anyhow!("{}", e.with_sources(&names)))?;
    }
    let result = asm
        .finish()
        .map_err(|e| anyhow!("{}", e.with_sources(&names)))?;
    tracing::info!(
        words = result.image().len(),
        labels = result.labels().len(),
        "assembled"
    );
    Ok(result)
}

/// Produces the flat binary, padded to `size` when one is given.
fn flatten(result: &AssemblyResult, fill: u8, size: Option<usize>) -> Result<Vec<u8>> {
    let mut binary = result.to_bytes(fill);
    if let Some(size) = size {
        if binary.len() > size {
            bail!(
                "binary size {} exceeds configured output size {size}",
                binary.len()
            );
        }
        binary.resize(size, fill);
    }
    Ok(binary)
}
