//! Formatter pipeline
//!
//! The facade over the four stages: parse (tree provider), scan
//! (registry + patterns), preprocess (lengths and promotions), print.
//! String-based formatting is the core operation; file-based methods are
//! thin wrappers that add atomic rewriting on top.
//!
//! A `Formatter` holds only its options. Every call builds the stage
//! objects fresh, so formatting one input can never leak state into the
//! next: formatting file A then file B yields the same B as formatting B
//! alone.

use crate::preprocess::TokenPreprocessor;
use crate::printing::{Printer, PrinterOptions};
use crate::scanning::{ScanError, TreeScanner};
use crate::tokens::Token;
use kotfmt_syntax::ParseError;
use log::debug;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Layout options for a [`Formatter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatterOptions {
    pub max_line_length: usize,
    pub standard_indent: usize,
    pub continuation_indent: usize,
}

impl Default for FormatterOptions {
    fn default() -> Self {
        FormatterOptions {
            max_line_length: 100,
            standard_indent: 4,
            continuation_indent: 8,
        }
    }
}

/// Formatting failure; see the crate error policy.
#[derive(Debug)]
pub enum FormatError {
    /// The tree provider rejected the input.
    Parse(ParseError),
    /// A scanner's automaton failed on a subtree. Not expected for inputs
    /// the provider accepts; reported as an internal error.
    Scan(ScanError),
    /// File access failed; the message carries the path.
    Io(String),
}

impl FormatError {
    /// Short error kind for `<file>:<line>: <kind>: <message>` diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            FormatError::Parse(_) => "parse",
            FormatError::Scan(_) => "internal",
            FormatError::Io(_) => "io",
        }
    }

    /// 1-based source line, when the failure has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            FormatError::Parse(err) => Some(err.line),
            FormatError::Scan(err) => Some(err.line()),
            FormatError::Io(_) => None,
        }
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::Parse(err) => write!(f, "{}", err.message),
            FormatError::Scan(err) => write!(f, "{}", err),
            FormatError::Io(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for FormatError {}

impl From<ParseError> for FormatError {
    fn from(err: ParseError) -> Self {
        FormatError::Parse(err)
    }
}

impl From<ScanError> for FormatError {
    fn from(err: ScanError) -> Self {
        FormatError::Scan(err)
    }
}

/// What `format_file` did to the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Unchanged,
    Rewritten,
}

/// The formatter. Construct one per configuration; calls are independent.
#[derive(Debug, Clone, Default)]
pub struct Formatter {
    options: FormatterOptions,
}

impl Formatter {
    pub fn new(options: FormatterOptions) -> Self {
        Formatter { options }
    }

    pub fn options(&self) -> FormatterOptions {
        self.options
    }

    /// Format source text: parse, scan, preprocess, print.
    pub fn format(&self, source: &str) -> Result<String, FormatError> {
        let tokens = self.preprocessed_tokens(source)?;
        let printer = Printer::new(PrinterOptions {
            max_line_length: self.options.max_line_length,
            standard_indent: self.options.standard_indent,
            continuation_indent: self.options.continuation_indent,
        });
        let mut text = printer.print(&tokens);
        if !text.ends_with('\n') {
            text.push('\n');
        }
        Ok(text)
    }

    /// The annotated token stream for `source`: scanned and preprocessed,
    /// ready for the printer. The CLI's token dump uses this.
    pub fn preprocessed_tokens(&self, source: &str) -> Result<Vec<Token>, FormatError> {
        let tree = kotfmt_syntax::parse(source)?;
        debug!("parsed tree with {} top-level children", tree.children.len());
        let scanner = TreeScanner::with_defaults();
        let tokens = scanner.scan_tree(&tree)?;
        debug!("scanned {} raw tokens", tokens.len());
        Ok(TokenPreprocessor::new().preprocess(tokens))
    }

    /// Whether formatting would change the file.
    pub fn check_file(&self, path: &Path) -> Result<bool, FormatError> {
        let source = read_source(path)?;
        let formatted = self.format_reporting(path, &source)?;
        Ok(formatted != source)
    }

    /// Format a file in place, atomically (temp file + rename alongside).
    ///
    /// On parse failure a diagnostic of the shape
    /// `<path> (line <N>): <message>` goes to standard error, the file is
    /// left untouched, and the error is returned so a driver can continue
    /// with its remaining inputs.
    pub fn format_file(&self, path: &Path) -> Result<FileOutcome, FormatError> {
        let source = read_source(path)?;
        let formatted = self.format_reporting(path, &source)?;
        if formatted == source {
            return Ok(FileOutcome::Unchanged);
        }
        let directory = path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp = tempfile::NamedTempFile::new_in(directory)
            .map_err(|e| FormatError::Io(format!("{}: {}", path.display(), e)))?;
        temp.write_all(formatted.as_bytes())
            .map_err(|e| FormatError::Io(format!("{}: {}", path.display(), e)))?;
        temp.persist(path)
            .map_err(|e| FormatError::Io(format!("{}: {}", path.display(), e)))?;
        Ok(FileOutcome::Rewritten)
    }

    fn format_reporting(&self, path: &Path, source: &str) -> Result<String, FormatError> {
        match self.format(source) {
            Ok(text) => Ok(text),
            Err(err) => {
                if let Some(line) = err.line() {
                    eprintln!("{} (line {}): {}", path.display(), line, err);
                }
                Err(err)
            }
        }
    }
}

fn read_source(path: &Path) -> Result<String, FormatError> {
    fs::read_to_string(path).map_err(|e| FormatError::Io(format!("{}: {}", path.display(), e)))
}
