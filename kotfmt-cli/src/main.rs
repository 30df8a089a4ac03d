//! Command-line driver for the kotfmt formatter.
//!
//! Usage:
//!   kotfmt `<paths>...`                 - Format files (directories recurse into *.kt)
//!   kotfmt --check `<paths>...`         - Report files that would change, write nothing
//!   kotfmt --stdin                      - Read one source from stdin, write to stdout
//!   kotfmt --dump-tokens `<paths>...`   - Print the annotated token stream as JSON
//!
//! Exit codes: 0 on success, 1 when `--check` found differences, 2 on
//! unrecoverable errors (bad flags, I/O, every input failing to parse).

use clap::{Arg, ArgAction, Command};
use kotfmt_core::{FileOutcome, Formatter, FormatterOptions};
use log::debug;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();
    let matches = Command::new("kotfmt")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Formats Kotlin-flavored source files to a maximum line length")
        .arg_required_else_help(true)
        .arg(
            Arg::new("paths")
                .help("Files to format, or directories to search for .kt files")
                .num_args(0..)
                .index(1),
        )
        .arg(
            Arg::new("max-line-length")
                .long("max-line-length")
                .value_name("N")
                .help("Maximum line length (default 100, or the kotfmt.toml value)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("Configuration file (default: kotfmt.toml beside the working directory)"),
        )
        .arg(
            Arg::new("stdin")
                .long("stdin")
                .help("Read source from stdin and write the result to stdout")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("check")
                .long("check")
                .help("Exit nonzero if any file would change; write nothing")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("diff")
                .long("diff")
                .help("With --check, print a unified diff of the pending changes")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dump-tokens")
                .long("dump-tokens")
                .help("Print the preprocessed token stream as JSON instead of formatting")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let formatter = match build_formatter(&matches) {
        Ok(formatter) => formatter,
        Err(message) => {
            eprintln!("kotfmt: configuration: {}", message);
            return ExitCode::from(2);
        }
    };

    if matches.get_flag("stdin") {
        return run_stdin(&formatter);
    }

    let paths: Vec<String> = matches
        .get_many::<String>("paths")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    if paths.is_empty() {
        eprintln!("kotfmt: no input files");
        return ExitCode::from(2);
    }
    let files = discover_files(&paths);
    if files.is_empty() {
        eprintln!("kotfmt: no .kt files found under the given paths");
        return ExitCode::from(2);
    }

    if matches.get_flag("dump-tokens") {
        return run_dump_tokens(&formatter, &files);
    }
    if matches.get_flag("check") {
        return run_check(&formatter, &files, matches.get_flag("diff"));
    }
    run_format(&formatter, &files)
}

/// Layer configuration: embedded defaults, optional kotfmt.toml, explicit
/// --config file, then flag overrides. Invalid values fail fast.
fn build_formatter(matches: &clap::ArgMatches) -> Result<Formatter, String> {
    let mut loader = kotfmt_config::Loader::new().with_optional_file("kotfmt.toml");
    if let Some(path) = matches.get_one::<String>("config") {
        loader = loader.with_file(path);
    }
    if let Some(raw) = matches.get_one::<String>("max-line-length") {
        let value: i64 = raw
            .parse()
            .map_err(|_| format!("--max-line-length: not a number: {}", raw))?;
        loader = loader
            .set_override("formatting.max-line-length", value)
            .map_err(|e| e.to_string())?;
    }
    let config = loader.build().map_err(|e| e.to_string())?;
    Ok(Formatter::new(FormatterOptions {
        max_line_length: config.formatting.max_line_length,
        standard_indent: config.formatting.standard_indent,
        continuation_indent: config.formatting.continuation_indent,
    }))
}

/// Expand paths: files are taken as-is, directories recurse into `.kt`.
fn discover_files(paths: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        let path = PathBuf::from(path);
        if path.is_dir() {
            for entry in walkdir::WalkDir::new(&path)
                .sort_by_file_name()
                .into_iter()
                .filter_map(Result::ok)
            {
                if entry.file_type().is_file()
                    && entry.path().extension().is_some_and(|e| e == "kt")
                {
                    files.push(entry.into_path());
                }
            }
        } else {
            files.push(path);
        }
    }
    files
}

fn run_stdin(formatter: &Formatter) -> ExitCode {
    let mut source = String::new();
    if let Err(err) = std::io::stdin().read_to_string(&mut source) {
        eprintln!("<stdin>: io: {}", err);
        return ExitCode::from(2);
    }
    match formatter.format(&source) {
        Ok(formatted) => {
            print!("{}", formatted);
            ExitCode::SUCCESS
        }
        Err(err) => {
            let line = err.line().unwrap_or(1);
            eprintln!("<stdin>:{}: {}: {}", line, err.kind(), err);
            ExitCode::from(2)
        }
    }
}

fn run_dump_tokens(formatter: &Formatter, files: &[PathBuf]) -> ExitCode {
    let mut failed = 0usize;
    for file in files {
        let source = match std::fs::read_to_string(file) {
            Ok(source) => source,
            Err(err) => {
                eprintln!("{}:1: io: {}", file.display(), err);
                failed += 1;
                continue;
            }
        };
        match formatter.preprocessed_tokens(&source) {
            Ok(tokens) => match serde_json::to_string_pretty(&tokens) {
                Ok(json) => println!("{}", json),
                Err(err) => {
                    eprintln!("{}:1: io: {}", file.display(), err);
                    failed += 1;
                }
            },
            Err(err) => {
                let line = err.line().unwrap_or(1);
                eprintln!("{}:{}: {}: {}", file.display(), line, err.kind(), err);
                failed += 1;
            }
        }
    }
    ExitCode::from(exit_for(files.len(), failed, false))
}

fn run_check(formatter: &Formatter, files: &[PathBuf], show_diff: bool) -> ExitCode {
    let mut failed = 0usize;
    let mut changed = 0usize;
    for file in files {
        let source = match std::fs::read_to_string(file) {
            Ok(source) => source,
            Err(err) => {
                eprintln!("{}:1: io: {}", file.display(), err);
                failed += 1;
                continue;
            }
        };
        match formatter.format(&source) {
            Ok(formatted) => {
                if formatted != source {
                    changed += 1;
                    println!("would reformat: {}", file.display());
                    if show_diff {
                        print_diff(&source, &formatted);
                    }
                }
            }
            Err(err) => {
                let line = err.line().unwrap_or(1);
                eprintln!("{}:{}: {}: {}", file.display(), line, err.kind(), err);
                failed += 1;
            }
        }
    }
    ExitCode::from(exit_for(files.len(), failed, changed > 0))
}

fn print_diff(original: &str, formatted: &str) {
    let diff = similar::TextDiff::from_lines(original, formatted);
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            similar::ChangeTag::Delete => "-",
            similar::ChangeTag::Insert => "+",
            similar::ChangeTag::Equal => " ",
        };
        print!("{}{}", sign, change);
    }
}

fn run_format(formatter: &Formatter, files: &[PathBuf]) -> ExitCode {
    let mut failed = 0usize;
    for file in files {
        match formatter.format_file(file) {
            Ok(FileOutcome::Rewritten) => debug!("rewrote {}", file.display()),
            Ok(FileOutcome::Unchanged) => debug!("unchanged {}", file.display()),
            Err(err) => {
                // Parse and scan failures were already reported by the
                // formatter in its own diagnostic shape.
                if err.line().is_none() {
                    eprintln!("{}:1: {}: {}", file.display(), err.kind(), err);
                }
                failed += 1;
            }
        }
    }
    ExitCode::from(exit_for(files.len(), failed, false))
}

/// Per-file failures are isolated; only a wholesale failure (or a --check
/// difference) changes the exit code.
fn exit_for(total: usize, failed: usize, check_changed: bool) -> u8 {
    if failed == total && total > 0 {
        2
    } else if check_changed {
        1
    } else {
        0
    }
}
