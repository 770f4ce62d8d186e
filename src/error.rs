// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Error types shared across the query/parse pipeline.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// An external query command could not be started or exited non-zero.
    #[error("`{command}` failed: {reason}{}", fmt_stderr(.stderr))]
    Execution {
        command: String,
        reason: String,
        stderr: String,
    },

    /// A line of query output does not match the expected field layout.
    #[error("{query} output, line {lineno}: {reason}: {line:?}")]
    Format {
        query: &'static str,
        lineno: usize,
        line: String,
        reason: String,
    },

    /// An auxiliary node-attribute file could not be read.
    #[error("cannot read {}: {reason}", .path.display())]
    ConfigRead { path: PathBuf, reason: String },
}

impl Error {
    pub(crate) fn format(
        query: &'static str,
        lineno: usize,
        line: &str,
        reason: impl Into<String>,
    ) -> Self {
        Error::Format {
            query,
            lineno,
            line: line.to_string(),
            reason: reason.into(),
        }
    }
}

fn fmt_stderr(stderr: &str) -> String {
    if stderr.trim().is_empty() {
        String::new()
    } else {
        format!("\n{}", stderr.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_error_includes_stderr() {
        let err = Error::Execution {
            command: "sinfo -N".to_string(),
            reason: "exited with status 1".to_string(),
            stderr: "slurm_load_node: Unable to contact slurm controller\n".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("`sinfo -N` failed"));
        assert!(msg.contains("Unable to contact slurm controller"));
    }

    #[test]
    fn test_format_error_names_source_line() {
        let err = Error::format("sinfo", 3, "gpu01|x|y", "expected 6 fields, got 3");
        let msg = err.to_string();
        assert!(msg.contains("line 3"));
        assert!(msg.contains("gpu01|x|y"));
    }
}
