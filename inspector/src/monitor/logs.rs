//! analyze_log_file — scan the tail of a log file for error lines

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::config::LogsConfig;

#[derive(Deserialize)]
struct Input {
    log_path: String,
    #[serde(default)]
    max_lines: Option<usize>,
    #[serde(default)]
    error_keywords: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct LogAnalysisResult {
    pub exists: bool,
    pub error_count: usize,
    pub error_lines: Vec<String>,
    pub error: Option<String>,
}

impl LogAnalysisResult {
    fn failed(exists: bool, error: String) -> Self {
        Self {
            exists,
            error_count: 0,
            error_lines: Vec::new(),
            error: Some(error),
        }
    }
}

pub fn execute(input: &[u8], settings: &LogsConfig) -> Result<Vec<u8>> {
    let input: Input = serde_json::from_slice(input).context("Invalid JSON input")?;

    let max_lines = input.max_lines.unwrap_or(settings.max_lines);
    let keywords = input
        .error_keywords
        .unwrap_or_else(|| settings.error_keywords.clone());

    let result = analyze(Path::new(&input.log_path), max_lines, &keywords);
    serde_json::to_vec(&result).context("Failed to serialize output")
}

/// Analyze the last `max_lines` lines of `path`. Never fails: a missing file
/// or a read error is reported in the result.
pub fn analyze(path: &Path, max_lines: usize, keywords: &[String]) -> LogAnalysisResult {
    if !path.exists() {
        return LogAnalysisResult::failed(
            false,
            format!("Log file not found: {}", path.display()),
        );
    }

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("Failed to read {}: {e}", path.display());
            return LogAnalysisResult::failed(true, format!("Error reading log file: {e}"));
        }
    };

    let content = decode_permissive(&bytes);
    let lines = split_lines(&content);
    let tail = &lines[lines.len().saturating_sub(max_lines)..];

    let error_lines = match_error_lines(tail, keywords);

    LogAnalysisResult {
        exists: true,
        error_count: error_lines.len(),
        error_lines,
        error: None,
    }
}

/// Split on `\n`, `\r\n` and a lone `\r`. A trailing terminator does not
/// start an extra line.
fn split_lines(content: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = content;
    while let Some(idx) = rest.find(|c: char| c == '\n' || c == '\r') {
        lines.push(&rest[..idx]);
        let skip = if rest[idx..].starts_with("\r\n") { 2 } else { 1 };
        rest = &rest[idx + skip..];
    }
    if !rest.is_empty() {
        lines.push(rest);
    }
    lines
}

/// Trimmed lines containing any keyword, case-insensitively, in input order
fn match_error_lines(lines: &[&str], keywords: &[String]) -> Vec<String> {
    let keywords: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();

    lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| {
            let lowered = line.to_lowercase();
            keywords.iter().any(|k| lowered.contains(k.as_str()))
        })
        .map(str::to_string)
        .collect()
}

/// Decode UTF-8, silently dropping invalid byte sequences
fn decode_permissive(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}
