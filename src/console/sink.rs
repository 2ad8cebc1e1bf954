//! Console sinks. Results are written as pretty JSON, errors as plain text.

use serde::Serialize;
use serde_json::Value;
use std::collections::VecDeque;
use std::fmt;
use std::io::Write;
use std::sync::Mutex;

/// Destination for rendered results.
pub trait ConsoleSink: Send + Sync {
    /// Emit one finished entry.
    fn write_line(&self, line: String);

    fn render(&self, value: &Value) {
        self.write_line(pretty(value));
    }

    /// Render any serializable value.
    fn log<T: Serialize>(&self, value: &T)
    where
        Self: Sized,
    {
        match serde_json::to_value(value) {
            Ok(value) => self.render(&value),
            Err(e) => self.write_line(format!("unrenderable output: {}", e)),
        }
    }

    /// Render a value, or the display string of an error.
    fn log_result<T: Serialize, E: fmt::Display>(&self, result: &Result<T, E>)
    where
        Self: Sized,
    {
        match result {
            Ok(value) => self.log(value),
            Err(e) => self.write_line(e.to_string()),
        }
    }
}

/// Pretty JSON; strings keep their quotes.
fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Writes each entry to stdout.
#[derive(Debug, Default)]
pub struct StdoutConsole;

impl ConsoleSink for StdoutConsole {
    fn write_line(&self, line: String) {
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", line) {
            tracing::warn!(error = %e, "Cannot write to stdout");
        }
    }
}

/// Keeps the most recent entries in memory.
#[derive(Debug)]
pub struct BufferConsole {
    entries: Mutex<VecDeque<String>>,
    capacity: usize,
}

impl BufferConsole {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Entries, oldest first.
    pub fn entries(&self) -> Vec<String> {
        match self.entries.lock() {
            Ok(entries) => entries.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
        }
    }

    pub fn last(&self) -> Option<String> {
        match self.entries.lock() {
            Ok(entries) => entries.back().cloned(),
            Err(poisoned) => poisoned.into_inner().back().cloned(),
        }
    }
}

impl ConsoleSink for BufferConsole {
    fn write_line(&self, line: String) {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{WalletError, WalletResult};

    #[test]
    fn test_buffer_keeps_last_entries() {
        let console = BufferConsole::new(2);
        console.log(&1);
        console.log(&"two");
        console.log(&serde_json::json!({"three": 3}));

        let entries = console.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], "\"two\"");
        assert_eq!(console.last().unwrap(), "{\n  \"three\": 3\n}");
    }

    #[test]
    fn test_errors_render_as_text() {
        let console = BufferConsole::new(4);
        let result: WalletResult<u64> = Err(WalletError::NotConnected);
        console.log_result(&result);
        assert_eq!(console.last().unwrap(), "provider not initialized yet");
    }

    #[test]
    fn test_string_results_are_quoted() {
        let console = BufferConsole::new(4);
        let result: WalletResult<String> = Ok("0x7a69".to_string());
        console.log_result(&result);
        assert_eq!(console.last().unwrap(), "\"0x7a69\"");
    }
}
