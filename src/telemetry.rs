//! Event log and local error telemetry
//!
//! Two sinks:
//! - [`EventLog`], the editor's in-memory rolling log, capped in bytes by
//!   `log_maxsize` from the config. Oldest entries are dropped first.
//! - [`ErrorCollector`], an opt-in JSONL file of CLI failures
//!   (`pfx --collect-errors <file>`). Privacy-safe: no file contents, only
//!   error kinds and messages.

use crate::schema::SchemaError;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Severity of an [`EventLog`] entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl LogLevel {
    fn tag(&self) -> &'static str {
        match self {
            LogLevel::Info => "[I]",
            LogLevel::Warning => "[W]",
            LogLevel::Error => "[E]",
        }
    }
}

/// One line of the event log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    /// Bytes this entry takes in the rendered log
    fn size(&self) -> usize {
        self.level.tag().len() + 1 + self.message.len() + 1
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.level.tag(), self.message)
    }
}

/// Rolling in-memory log with a byte budget
#[derive(Debug, Clone, Serialize)]
pub struct EventLog {
    entries: VecDeque<LogEntry>,
    size: usize,
    capacity: usize,
}

impl EventLog {
    /// A log holding at most `capacity` bytes of rendered text
    pub fn new(capacity: usize) -> Self {
        Self { entries: VecDeque::new(), size: 0, capacity }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Rendered size of the retained entries
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Append a message, evicting old entries to stay within capacity.
    ///
    /// A message that alone exceeds the capacity is truncated.
    pub fn push(&mut self, level: LogLevel, message: impl Into<String>) {
        let mut entry = LogEntry { level, message: message.into() };
        let overhead = entry.size() - entry.message.len();
        let room = self.capacity.saturating_sub(overhead);
        if entry.message.len() > room {
            let mut cut = room;
            while !entry.message.is_char_boundary(cut) {
                cut -= 1;
            }
            entry.message.truncate(cut);
        }

        let needed = entry.size();
        while self.size + needed > self.capacity {
            match self.entries.pop_front() {
                Some(old) => self.size -= old.size(),
                None => break,
            }
        }
        if needed <= self.capacity {
            self.size += needed;
            self.entries.push_back(entry);
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Info, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Error, message);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.size = 0;
    }

    /// The whole log as text, one entry per line
    pub fn text(&self) -> String {
        let mut out = String::with_capacity(self.size);
        for entry in &self.entries {
            out.push_str(&entry.to_string());
            out.push('\n');
        }
        out
    }
}

/// An error entry for the telemetry file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEntry {
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
    /// The subcommand that was running (e.g., "fmt", "validate", "plot")
    pub command: String,
    /// The file being processed (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Kind of error (e.g., "syntax_error", "missing_field", "io_error")
    pub error_type: String,
    /// Error message
    pub context: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ErrorEntry {
    /// Create a new error entry with the current timestamp
    pub fn new(
        command: impl Into<String>,
        error_type: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: chrono_now(),
            command: command.into(),
            file: None,
            error_type: error_type.into(),
            context: context.into(),
            suggestion: None,
        }
    }

    /// Entry for a failed project or config read, with a fix hint
    pub fn from_schema_error(command: impl Into<String>, err: &SchemaError) -> Self {
        let (error_type, suggestion) = match err {
            SchemaError::Syntax(_) => ("syntax_error", None),
            SchemaError::Field(_) => ("field_error", None),
            SchemaError::UnsupportedVersion { .. } => {
                ("unsupported_version", Some("Update pfx to read files from newer editors"))
            }
            SchemaError::NoParticleSystems => {
                ("no_particle_systems", Some("Add at least one entry to particle_systems"))
            }
            SchemaError::InvalidValue { .. } => ("invalid_value", None),
        };
        let entry = Self::new(command, error_type, err.to_string());
        match suggestion {
            Some(s) => entry.with_suggestion(s),
            None => entry,
        }
    }

    /// Set the file that was being processed
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Set a suggested fix
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Get current timestamp in ISO 8601 format
fn chrono_now() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let duration = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    let secs = duration.as_secs();

    let days = secs / 86400;
    let time_secs = secs % 86400;
    let hours = time_secs / 3600;
    let mins = (time_secs % 3600) / 60;
    let secs = time_secs % 60;

    let (year, month, day) = civil_from_days(days as i64);
    format!("{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z", year, month, day, hours, mins, secs)
}

/// Days since 1970-01-01 to a proleptic Gregorian date
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

/// Error collector that writes to a JSONL file
pub struct ErrorCollector {
    path: std::path::PathBuf,
    enabled: bool,
}

impl ErrorCollector {
    pub fn new(path: impl AsRef<Path>, enabled: bool) -> Self {
        Self { path: path.as_ref().to_path_buf(), enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Append an entry as one JSON line
    pub fn log(&self, entry: &ErrorEntry) -> std::io::Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;

        let mut writer = BufWriter::new(file);
        let json = serde_json::to_string(entry).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        writeln!(writer, "{}", json)?;
        writer.flush()?;

        Ok(())
    }
}

// Global error collector (thread-local to avoid synchronization)
thread_local! {
    static COLLECTOR: std::cell::RefCell<Option<ErrorCollector>> = const { std::cell::RefCell::new(None) };
}

/// Initialize the global error collector
pub fn init_collector(path: impl AsRef<Path>, enabled: bool) {
    COLLECTOR.with(|c| {
        *c.borrow_mut() = Some(ErrorCollector::new(path, enabled));
    });
}

/// Log an error using the global collector
pub fn log_error(entry: &ErrorEntry) {
    COLLECTOR.with(|c| {
        if let Some(ref collector) = *c.borrow() {
            let _ = collector.log(entry);
        }
    });
}

/// Check if the global collector is enabled
pub fn is_collection_enabled() -> bool {
    COLLECTOR.with(|c| c.borrow().as_ref().map(|c| c.is_enabled()).unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_event_log_rendering() {
        let mut log = EventLog::new(4096);
        log.info("Loaded project file \"fire.lua\"");
        log.warning("Cannot load texture \"smoke.png\"");
        assert_eq!(log.len(), 2);
        assert_eq!(
            log.text(),
            "[I] Loaded project file \"fire.lua\"\n[W] Cannot load texture \"smoke.png\"\n"
        );
        assert_eq!(log.size(), log.text().len());
    }

    #[test]
    fn test_event_log_drops_oldest() {
        // Each entry is "[I] msgN\n" = 9 bytes
        let mut log = EventLog::new(20);
        log.info("msg1");
        log.info("msg2");
        log.info("msg3");
        let messages: Vec<_> = log.entries().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, ["msg2", "msg3"]);
        assert!(log.size() <= log.capacity());
    }

    #[test]
    fn test_event_log_truncates_oversized_entry() {
        let mut log = EventLog::new(10);
        log.info("short");
        log.error("a message far longer than the log");
        assert_eq!(log.len(), 1);
        assert_eq!(log.size(), 10);
        assert_eq!(log.text(), "[E] a mes\n");

        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.size(), 0);
    }

    #[test]
    fn test_event_log_zero_capacity() {
        let mut log = EventLog::new(0);
        log.info("anything");
        assert!(log.is_empty());
    }

    #[test]
    fn test_error_entry_builders() {
        let entry = ErrorEntry::new("fmt", "io_error", "Permission denied")
            .with_file("fire.lua")
            .with_suggestion("Check file permissions");
        assert_eq!(entry.command, "fmt");
        assert_eq!(entry.file, Some("fire.lua".to_string()));
        assert_eq!(entry.suggestion, Some("Check file permissions".to_string()));
    }

    #[test]
    fn test_error_entry_from_schema_error() {
        let err = SchemaError::UnsupportedVersion { kind: "project", found: 9, max: 5 };
        let entry = ErrorEntry::from_schema_error("validate", &err);
        assert_eq!(entry.error_type, "unsupported_version");
        assert!(entry.suggestion.is_some());
        assert_eq!(entry.context, err.to_string());
    }

    #[test]
    fn test_error_collector_disabled() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("errors.jsonl");

        let collector = ErrorCollector::new(&path, false);
        collector.log(&ErrorEntry::new("fmt", "syntax_error", "line 1")).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_error_collector_appends_lines() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("errors.jsonl");

        let collector = ErrorCollector::new(&path, true);
        collector.log(&ErrorEntry::new("fmt", "syntax_error", "line 3").with_file("a.lua")).unwrap();
        collector.log(&ErrorEntry::new("validate", "field_error", "missing field 'x'")).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: ErrorEntry = serde_json::from_str(lines[0]).unwrap();
        let second: ErrorEntry = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(first.file, Some("a.lua".to_string()));
        assert_eq!(second.command, "validate");
        assert!(second.file.is_none());
    }

    #[test]
    #[serial]
    fn test_global_collector() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("errors.jsonl");

        init_collector(&path, true);
        assert!(is_collection_enabled());
        log_error(&ErrorEntry::new("plot", "invalid_args", "no such system"));
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 1);

        init_collector(&path, false);
        assert!(!is_collection_enabled());
    }

    #[test]
    fn test_chrono_now_format() {
        let timestamp = chrono_now();
        assert_eq!(timestamp.len(), 20);
        assert!(timestamp.contains('T'));
        assert!(timestamp.ends_with('Z'));
    }

    #[test]
    fn test_civil_from_days() {
        assert_eq!(civil_from_days(0), (1970, 1, 1));
        assert_eq!(civil_from_days(11_016), (2000, 2, 29));
        assert_eq!(civil_from_days(20_745), (2026, 10, 19));
    }
}
