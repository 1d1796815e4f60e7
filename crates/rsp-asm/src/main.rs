//! CLI entry point for the RSP assembler binary.

use std::env;
use std::ffi::OsString;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use log as _;
use rsp_asm::assembler::{assemble, AssembleResult};
use rsp_asm::errors::AssembleError;
use rsp_asm::test_runner::run_tests;
use rsp_core as _;
#[cfg(test)]
use rstest as _;
#[cfg(test)]
use tempfile as _;
use thiserror as _;

const USAGE_TEXT: &str = "\
Usage: rsp-asm <command> [options]

Commands:
  build <input> [-o <output>] [--verbose]  Assemble source to an IMEM image
  test  <input>                            Assemble and run rsptest blocks

Options:
  -o, --output <file>  Output file path (default: input stem + .bin)
  -v, --verbose        Print listing to stderr (build only)
  -h, --help           Show this help message

Examples:
  rsp-asm build kernel.rsp.md
  rsp-asm build kernel.s -o kernel.bin
  rsp-asm test kernel.rsp.md
";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Build(BuildArgs),
    Test(TestArgs),
}

#[derive(Debug, PartialEq, Eq)]
struct BuildArgs {
    input: PathBuf,
    output: Option<PathBuf>,
    verbose: bool,
}

#[derive(Debug, PartialEq, Eq)]
struct TestArgs {
    input: PathBuf,
}

#[derive(Debug)]
enum ParseResult {
    Command(Command),
    Help,
}

fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let first = args.next().ok_or_else(|| "missing command".to_string())?;

    if first == "--help" || first == "-h" {
        return Ok(ParseResult::Help);
    }

    match first.to_string_lossy().as_ref() {
        "build" => parse_build_args(args)
            .map(Command::Build)
            .map(ParseResult::Command),
        "test" => parse_test_args(args)
            .map(Command::Test)
            .map(ParseResult::Command),
        other => Err(format!("unknown command: {other}")),
    }
}

#[allow(clippy::while_let_on_iterator)]
fn parse_build_args(mut args: impl Iterator<Item = OsString>) -> Result<BuildArgs, String> {
    let mut input: Option<PathBuf> = None;
    let mut output: Option<PathBuf> = None;
    let mut verbose = false;

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }
        if arg == "--verbose" || arg == "-v" {
            verbose = true;
            continue;
        }
        if arg == "-o" || arg == "--output" {
            let value = args
                .next()
                .ok_or_else(|| "missing value for -o".to_string())?;
            output = Some(PathBuf::from(value));
            continue;
        }
        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }
        if input.is_some() {
            return Err("multiple input paths provided".to_string());
        }
        input = Some(PathBuf::from(arg));
    }

    let input = input.ok_or_else(|| "missing input path".to_string())?;
    Ok(BuildArgs {
        input,
        output,
        verbose,
    })
}

fn parse_test_args(args: impl Iterator<Item = OsString>) -> Result<TestArgs, String> {
    let mut input: Option<PathBuf> = None;

    for arg in args {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }
        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }
        if input.is_some() {
            return Err("multiple input paths provided".to_string());
        }
        input = Some(PathBuf::from(arg));
    }

    let input = input.ok_or_else(|| "missing input path".to_string())?;
    Ok(TestArgs { input })
}

/// `dir/kernel.rsp.md` and `dir/kernel.s` both become `dir/kernel.bin`.
fn default_output_path(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name
        .strip_suffix(".rsp.md")
        .or_else(|| name.rsplit_once('.').map(|(stem, _)| stem))
        .filter(|stem| !stem.is_empty())
        .unwrap_or(if name.is_empty() { "out" } else { &name });

    let parent = input.parent().unwrap_or_else(|| Path::new(""));
    parent.join(format!("{stem}.bin"))
}

fn run_build(args: BuildArgs) -> Result<(), i32> {
    let result = assemble(&args.input).map_err(|e| report_assemble_error(&e))?;

    for warning in &result.warnings {
        eprintln!("{warning}");
    }

    let output_path = args
        .output
        .unwrap_or_else(|| default_output_path(&args.input));

    if let Err(e) = fs::write(&output_path, &result.binary) {
        eprintln!("error: failed to write {}: {e}", output_path.display());
        return Err(1);
    }

    if args.verbose {
        print_listing(&result);
    }

    println!(
        "Assembled {} ({} bytes) -> {}",
        args.input.display(),
        result.binary.len(),
        output_path.display()
    );
    Ok(())
}

fn report_assemble_error(e: &AssembleError) -> i32 {
    eprintln!("{}", e.format_for_stderr());
    1
}

fn print_listing(result: &AssembleResult) {
    for entry in &result.listing {
        let hex_bytes = entry
            .bytes
            .chunks(4)
            .map(|chunk| {
                chunk.iter().fold(String::new(), |mut hex, b| {
                    let _ = write!(hex, "{b:02X}");
                    hex
                })
            })
            .collect::<Vec<_>>()
            .join(" ");
        eprintln!(
            "{:03X}: {hex_bytes:<17} {:>4} | {}",
            entry.address, entry.line, entry.source
        );
    }
}

fn run_test(args: &TestArgs) -> Result<(), i32> {
    let result = assemble(&args.input).map_err(|e| report_assemble_error(&e))?;

    for warning in &result.warnings {
        eprintln!("{warning}");
    }

    if result.test_blocks.is_empty() {
        println!("No test blocks found in {}", args.input.display());
        return Ok(());
    }

    let test_result = run_tests(&result.binary, &result.test_blocks);

    for block_result in &test_result.block_results {
        println!("{block_result}");
        for diagnostic in &block_result.diagnostics {
            println!("  note: {diagnostic}");
        }
        if !block_result.passed() {
            for ar in block_result.assertion_results.iter().filter(|ar| !ar.passed) {
                println!("{ar}");
            }
        }
    }

    let summary = test_result.summary();
    println!();
    println!("Test Summary: {summary} (total: {})", summary.total);

    if test_result.all_passed() {
        Ok(())
    } else {
        Err(1)
    }
}

fn main() {
    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Command(Command::Build(args))) => run_build(args).err().unwrap_or(0),
        Ok(ParseResult::Command(Command::Test(args))) => run_test(&args).err().unwrap_or(0),
        Err(error) => {
            if error.starts_with("Usage:") {
                println!("{error}");
            } else {
                eprintln!("error: {error}");
                eprintln!("{USAGE_TEXT}");
            }
            1
        }
    };

    std::process::exit(exit_code);
}
