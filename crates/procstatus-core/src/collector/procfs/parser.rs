//! Parsers for kernel virtual files.
//!
//! The `parse_*` functions and `rows` are pure and work on string input, so
//! they are easy to test. The `*FileParser` / `ScalarFileReader` types add the
//! `FileSystem` read on top and map I/O failures into [`CollectError`].
//!
//! Three shapes cover every file the service reads:
//! - key:value (`/proc/cpuinfo`, `/proc/meminfo`)
//! - whitespace columns with header lines (`/proc/partitions`, `/proc/net/dev`)
//! - a single scalar (`/proc/uptime`, `/proc/version`, RTC `since_epoch`)

use std::path::Path;

use crate::collector::error::CollectError;
use crate::collector::traits::FileSystem;

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("parse error: {message}")]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

/// Character set stripped from keys, values and tokens.
///
/// Kernel files only ever use ASCII whitespace, so this is deliberately
/// narrower than `char::is_whitespace`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Whitespace(&'static [char]);

/// Space, tab, newline, carriage return, form feed, vertical tab.
pub const KERNEL_WHITESPACE: Whitespace =
    Whitespace(&[' ', '\t', '\n', '\r', '\x0c', '\x0b']);

impl Whitespace {
    pub fn contains(&self, c: char) -> bool {
        self.0.contains(&c)
    }

    pub fn trim<'a>(&self, s: &'a str) -> &'a str {
        s.trim_matches(self.0)
    }

    /// Splits on runs of whitespace, never yielding empty tokens.
    pub fn tokens<'a>(self, s: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        s.split(move |c: char| self.contains(c))
            .filter(|t| !t.is_empty())
    }
}

impl Default for Whitespace {
    fn default() -> Self {
        KERNEL_WHITESPACE
    }
}

// ============================================================
// key:value files
// ============================================================

/// Ordered field name → raw value mapping from one key:value file.
///
/// A key appears once, at the position it was first seen. When the file
/// repeats a key (one block per CPU in `/proc/cpuinfo`) the last value wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    entries: Vec<(String, String)>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Returns the value for `key`; `None` means the field is absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

/// Parses key:value content.
///
/// Only the first `:` on a line separates name from value. Blank lines are
/// skipped; any other line without a colon fails the whole parse.
pub fn parse_key_value(content: &str, ws: Whitespace) -> Result<RawRecord, ParseError> {
    let mut record = RawRecord::new();

    for (idx, line) in content.lines().enumerate() {
        let line = ws.trim(line);
        if line.is_empty() {
            continue;
        }

        let (key, value) = line.split_once(':').ok_or_else(|| {
            ParseError::new(format!("line {}: missing ':' in {:?}", idx + 1, line))
        })?;

        record.insert(ws.trim(key), ws.trim(value));
    }

    Ok(record)
}

/// Reads a key:value file into a [`RawRecord`].
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyValueFileParser {
    ws: Whitespace,
}

impl KeyValueFileParser {
    pub fn new(ws: Whitespace) -> Self {
        Self { ws }
    }

    pub fn parse_file<F: FileSystem + ?Sized>(
        &self,
        fs: &F,
        path: &Path,
    ) -> Result<RawRecord, CollectError> {
        let content = fs
            .read_to_string(path)
            .map_err(|e| CollectError::io(path, e))?;
        Ok(parse_key_value(&content, self.ws)?)
    }
}

// ============================================================
// Columnar files
// ============================================================

/// Tokens of one data line of a columnar file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRow<'a> {
    tokens: Vec<&'a str>,
}

impl<'a> ColumnRow<'a> {
    pub fn get(&self, idx: usize) -> Option<&'a str> {
        self.tokens.get(idx).copied()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[&'a str] {
        &self.tokens
    }
}

/// Splits whitespace-delimited tables such as `/proc/partitions`.
///
/// The first `header_lines` lines are dropped unconditionally. Rows that are
/// empty, or whose token count differs from `columns` when set, are skipped.
#[derive(Debug, Clone, Copy)]
pub struct ColumnarFileParser {
    ws: Whitespace,
    header_lines: usize,
    columns: Option<usize>,
}

impl Default for ColumnarFileParser {
    fn default() -> Self {
        Self::new(KERNEL_WHITESPACE)
    }
}

impl ColumnarFileParser {
    /// Default number of header lines in `/proc/partitions` and `/proc/net/dev`.
    pub const DEFAULT_HEADER_LINES: usize = 2;

    pub fn new(ws: Whitespace) -> Self {
        Self {
            ws,
            header_lines: Self::DEFAULT_HEADER_LINES,
            columns: None,
        }
    }

    pub fn with_header_lines(mut self, header_lines: usize) -> Self {
        self.header_lines = header_lines;
        self
    }

    /// Only yield rows with exactly `columns` tokens.
    pub fn with_columns(mut self, columns: usize) -> Self {
        self.columns = Some(columns);
        self
    }

    /// Lazily yields the well-formed rows of `content`.
    pub fn rows<'a>(self, content: &'a str) -> impl Iterator<Item = ColumnRow<'a>> + 'a {
        let ws = self.ws;
        let columns = self.columns;
        content
            .lines()
            .skip(self.header_lines)
            .map(move |line| ColumnRow {
                tokens: ws.tokens(line).collect(),
            })
            .filter(move |row| match columns {
                Some(n) => row.len() == n,
                None => !row.is_empty(),
            })
    }

    /// Reads the file and returns its raw content, ready for [`Self::rows`].
    pub fn read_file<F: FileSystem + ?Sized>(
        &self,
        fs: &F,
        path: &Path,
    ) -> Result<String, CollectError> {
        fs.read_to_string(path)
            .map_err(|e| CollectError::io(path, e))
    }
}

// ============================================================
// Scalar files
// ============================================================

/// Parses trimmed content as a float.
pub fn parse_f64(content: &str, ws: Whitespace) -> Result<f64, ParseError> {
    let value = ws.trim(content);
    value
        .parse()
        .map_err(|_| ParseError::new(format!("not a number: {:?}", value)))
}

/// Returns the first whitespace-separated token.
pub fn parse_first_token(content: &str, ws: Whitespace) -> Result<&str, ParseError> {
    ws.tokens(content)
        .next()
        .ok_or_else(|| ParseError::new("empty file"))
}

/// Parses the leading integer of a `"<n> kB"` style value.
pub fn parse_leading_u64(value: &str, ws: Whitespace) -> Result<u64, ParseError> {
    let token = parse_first_token(value, ws)?;
    token
        .parse()
        .map_err(|_| ParseError::new(format!("not an integer: {:?}", token)))
}

/// Reads single-value files.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarFileReader {
    ws: Whitespace,
}

impl ScalarFileReader {
    pub fn new(ws: Whitespace) -> Self {
        Self { ws }
    }

    /// Whole content, untouched.
    pub fn read_raw<F: FileSystem + ?Sized>(
        &self,
        fs: &F,
        path: &Path,
    ) -> Result<String, CollectError> {
        fs.read_to_string(path)
            .map_err(|e| CollectError::io(path, e))
    }

    /// Whole content, trimmed.
    pub fn read_text<F: FileSystem + ?Sized>(
        &self,
        fs: &F,
        path: &Path,
    ) -> Result<String, CollectError> {
        let content = self.read_raw(fs, path)?;
        Ok(self.ws.trim(&content).to_string())
    }

    pub fn read_first_token<F: FileSystem + ?Sized>(
        &self,
        fs: &F,
        path: &Path,
    ) -> Result<String, CollectError> {
        let content = self.read_raw(fs, path)?;
        Ok(parse_first_token(&content, self.ws)?.to_string())
    }

    pub fn read_f64<F: FileSystem + ?Sized>(
        &self,
        fs: &F,
        path: &Path,
    ) -> Result<f64, CollectError> {
        let content = self.read_raw(fs, path)?;
        Ok(parse_f64(&content, self.ws)?)
    }
}
