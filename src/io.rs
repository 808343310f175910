use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::memory::Word;
use crate::vm::{VmError, VmManager};

/// One line of a trace file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceOp {
    Read { address: u64 },
    Write { address: u64, value: Word },
}

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Vm(#[from] VmError),
}

/// Parse a trace: one operation per line, `r <addr>` or `w <addr> <value>`.
/// Blank lines and lines starting with `#` are skipped.
pub fn parse_trace(content: &str) -> Result<Vec<TraceOp>, TraceError> {
    let mut ops = Vec::new();
    for (i, raw) in content.lines().enumerate() {
        let line = i + 1;
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let mut tokens = text.split_whitespace();
        let op = tokens.next();
        let parsed = match op {
            Some("r") => TraceOp::Read {
                address: parse_field(tokens.next(), "address", line)?,
            },
            Some("w") => TraceOp::Write {
                address: parse_field(tokens.next(), "address", line)?,
                value: parse_field(tokens.next(), "value", line)?,
            },
            _ => {
                return Err(TraceError::Parse {
                    line,
                    message: format!("expected 'r' or 'w', got {:?}", op.unwrap_or("")),
                })
            }
        };
        if let Some(extra) = tokens.next() {
            return Err(TraceError::Parse {
                line,
                message: format!("unexpected trailing token {extra:?}"),
            });
        }
        ops.push(parsed);
    }
    Ok(ops)
}

fn parse_field<T: std::str::FromStr>(
    token: Option<&str>,
    what: &str,
    line: usize,
) -> Result<T, TraceError> {
    let token = token.ok_or_else(|| TraceError::Parse {
        line,
        message: format!("missing {what}"),
    })?;
    token.parse().map_err(|_| TraceError::Parse {
        line,
        message: format!("invalid {what}: {token:?}"),
    })
}

/// Read and parse a trace file.
pub fn load_trace<P: AsRef<Path>>(path: P) -> Result<Vec<TraceOp>, TraceError> {
    let content = fs::read_to_string(path.as_ref()).map_err(|source| TraceError::Io {
        path: path.as_ref().to_path_buf(),
        source,
    })?;
    parse_trace(&content)
}

/// Run a trace against `vm`, collecting the result of every read.
pub fn run_trace(vm: &mut VmManager, ops: &[TraceOp]) -> Result<Vec<Word>, TraceError> {
    let mut results = Vec::new();
    for op in ops {
        match *op {
            TraceOp::Read { address } => results.push(vm.read(address)?),
            TraceOp::Write { address, value } => vm.write(address, value)?,
        }
    }
    Ok(results)
}

/// Write read results, one per line.
pub fn write_results<P: AsRef<Path>>(path: P, results: &[Word]) -> Result<(), TraceError> {
    let mut content: String = results
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join("\n");
    content.push('\n');
    fs::write(path.as_ref(), content).map_err(|source| TraceError::Io {
        path: path.as_ref().to_path_buf(),
        source,
    })
}
