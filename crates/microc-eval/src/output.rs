//! The line-oriented channel `printf` writes to.

use std::io::Write;

/// Where `printf` output goes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Output {
    /// Write each line to the process's stdout.
    #[default]
    Stdout,
    /// Keep lines in memory, for tests and embedding hosts.
    Captured(Vec<String>),
}

impl Output {
    pub fn captured() -> Self {
        Output::Captured(Vec::new())
    }

    pub fn write_line(&mut self, line: String) {
        match self {
            Output::Stdout => {
                let mut out = std::io::stdout().lock();
                // A closed stdout must not abort the program being run.
                if let Err(err) = writeln!(out, "{line}") {
                    tracing::warn!(%err, "failed to write printf output");
                }
            }
            Output::Captured(lines) => lines.push(line),
        }
    }

    /// Captured lines; empty when writing to stdout.
    pub fn lines(&self) -> &[String] {
        match self {
            Output::Stdout => &[],
            Output::Captured(lines) => lines,
        }
    }

    /// Take the captured lines, leaving the buffer empty.
    pub fn take(&mut self) -> Vec<String> {
        match self {
            Output::Stdout => Vec::new(),
            Output::Captured(lines) => std::mem::take(lines),
        }
    }
}
