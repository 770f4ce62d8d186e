// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

//! External command execution: run scheduler queries and capture their output.

use std::process::{Command, Stdio};

use crate::error::{Error, Result};

/// Captured output of a finished query command.
#[derive(Debug, Clone)]
pub struct Output {
    pub stdout: String,
    pub stderr: String,
}

/// Run an external command, capturing stdout and stderr in full.
///
/// The child gets no stdin. A command that cannot be spawned or exits
/// non-zero is an error carrying the captured stderr, so the caller can
/// surface scheduler diagnostics.
pub fn run(program: &str, args: &[&str]) -> Result<Output> {
    let command_line = display_command(program, args);
    tracing::debug!("running `{}`", command_line);

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| Error::Execution {
            command: command_line.clone(),
            reason: e.to_string(),
            stderr: String::new(),
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        let reason = match output.status.code() {
            Some(code) => format!("exited with status {}", code),
            None => "terminated by signal".to_string(),
        };
        return Err(Error::Execution {
            command: command_line,
            reason,
            stderr,
        });
    }

    Ok(Output { stdout, stderr })
}

fn display_command(program: &str, args: &[&str]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}
