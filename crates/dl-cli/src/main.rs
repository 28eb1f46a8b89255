use anyhow::{bail, Context, Result};
use clap::Parser;
use dl_parse::Supervisor;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

/// Maximum source file size in bytes (1MB).
const MAX_SOURCE_SIZE: usize = 1_000_000;

#[derive(Parser, Debug)]
#[command(name = "dlc")]
#[command(about = "DL to C++ transpiler")]
struct Cli {
    /// Path to the root .dl source file
    file: PathBuf,

    /// Binary output path of the compile step
    #[arg(short = 'o', long = "output", default_value = "a.out")]
    output: PathBuf,

    /// Run the produced binary after compiling
    #[arg(short = 'r', long = "compile-and-run")]
    compile_and_run: bool,

    /// Write the transpiled source to stdout and skip the compile step
    #[arg(short = 'L', long = "output-to-stdout")]
    output_to_stdout: bool,

    /// Keep the intermediate .cpp file
    #[arg(short = 'I', long = "intermediates")]
    intermediates: bool,

    /// Dump lexed tokens to stderr
    #[arg(short = 'T', long = "tokens")]
    tokens: bool,

    /// Dump the parsed modules as JSON and skip the compile step
    #[arg(long = "ast")]
    ast: bool,
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let source = std::fs::read_to_string(&cli.file)
        .with_context(|| format!("could not read '{}'", cli.file.display()))?;
    if source.len() > MAX_SOURCE_SIZE {
        bail!(
            "source file exceeds {}MB limit ({} bytes)",
            MAX_SOURCE_SIZE / 1_000_000,
            source.len()
        );
    }

    // the sink keeps its own copy of the source for line/caret rendering
    let mut sup = Supervisor::new(source.clone(), cli.file.clone());

    let tokens = dl_parse::lex(&source, &mut sup);
    if sup.has_errors() {
        sup.dump_errors();
        return Ok(ExitCode::FAILURE);
    }
    if cli.tokens {
        for token in &tokens {
            eprintln!("{token:?}");
        }
    }

    let modules = dl_parse::parse(tokens, &mut sup);
    if sup.has_errors() {
        sup.dump_errors();
        return Ok(ExitCode::FAILURE);
    }

    if cli.ast {
        println!("{}", serde_json::to_string_pretty(&modules)?);
        return Ok(ExitCode::SUCCESS);
    }

    let transpiled = dl_emit::emit_modules(&modules);
    if cli.output_to_stdout {
        println!("{transpiled}");
        return Ok(ExitCode::SUCCESS);
    }

    let intermediate = cli.file.with_extension("cpp");
    std::fs::write(&intermediate, format!("{transpiled}\n"))
        .with_context(|| format!("could not write '{}'", intermediate.display()))?;

    let compile_status = Command::new("c++")
        .arg("-std=c++17")
        .arg(&intermediate)
        .arg("-o")
        .arg(&cli.output)
        .status()
        .context("failed to invoke the C++ compiler")?;
    if !cli.intermediates {
        let _ = std::fs::remove_file(&intermediate);
    }
    if !compile_status.success() {
        bail!("C++ compiler exited with {compile_status}");
    }

    if cli.compile_and_run {
        let run_status = Command::new(runnable(&cli.output))
            .status()
            .with_context(|| format!("failed to run '{}'", cli.output.display()))?;
        let code = run_status.code().unwrap_or(1);
        return Ok(ExitCode::from(code.clamp(0, u8::MAX as i32) as u8));
    }

    Ok(ExitCode::SUCCESS)
}

/// A bare file name would be looked up on PATH; anchor it to the current
/// directory instead.
fn runnable(output: &Path) -> PathBuf {
    if output.components().count() == 1 {
        Path::new(".").join(output)
    } else {
        output.to_path_buf()
    }
}
