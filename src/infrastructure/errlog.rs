//! Persistent error log
//!
//! Errors raised during a run are collected with their call site and
//! key/value context, then appended to `errors.log` in the config directory.

use std::collections::BTreeMap;
use std::fmt::{Display, Write as _};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::panic::Location;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use tracing::debug;

/// File name of the error log inside the config directory.
pub const LOG_FILE_NAME: &str = "errors.log";

/// Log files above this size are truncated before the next write.
pub const MAX_LOG_SIZE: u64 = 5 * 1024 * 1024;

const SEPARATOR: &str = "------------------------------";

/// One recorded error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub time: DateTime<Utc>,
    pub error: String,
    pub caller: String,
    pub context: BTreeMap<String, String>,
}

/// Collects errors during a run.
#[derive(Debug, Default)]
pub struct ErrorLog {
    entries: Mutex<Vec<LogEntry>>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error with no extra context.
    #[track_caller]
    pub fn add(&self, err: &(impl Display + ?Sized)) {
        self.push(err.to_string(), Location::caller(), BTreeMap::new());
    }

    /// Record an error with key/value context (service id, version, ...).
    #[track_caller]
    pub fn add_with_context(&self, err: &(impl Display + ?Sized), context: &[(&str, String)]) {
        let context = context
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        self.push(err.to_string(), Location::caller(), context);
    }

    fn push(&self, error: String, caller: &Location<'_>, context: BTreeMap<String, String>) {
        let entry = LogEntry {
            time: Utc::now(),
            error: filter_token(&error),
            caller: format!("{}:{}", caller.file(), caller.line()),
            context,
        };
        debug!(error = %entry.error, caller = %entry.caller, "recorded error");
        self.lock().push(entry);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LogEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Render the collected entries for the command line `args`.
    pub fn render(&self, args: &[String]) -> String {
        let mut out = String::new();
        let command = filter_token(&args.join(" "));
        let _ = writeln!(out, "COMMAND:\nfastly {command}\n");
        for entry in self.lock().iter() {
            let _ = writeln!(
                out,
                "TIMESTAMP:\n{}\n",
                entry.time.to_rfc3339_opts(SecondsFormat::Secs, true)
            );
            let _ = writeln!(out, "ERROR:\n{}\n", entry.error);
            let _ = writeln!(out, "CALLER:\n{}\n", entry.caller);
            if !entry.context.is_empty() {
                let _ = writeln!(out, "CONTEXT:");
                for (key, value) in &entry.context {
                    let _ = writeln!(out, "{key}: {}", filter_token(value));
                }
                out.push('\n');
            }
        }
        let _ = writeln!(out, "{SEPARATOR}");
        out
    }

    /// Append the collected entries to `path`, truncating an oversized log first.
    pub fn persist(&self, path: &Path, args: &[String]) -> io::Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let oversized = std::fs::metadata(path)
            .map(|m| m.len() > MAX_LOG_SIZE)
            .unwrap_or(false);

        let mut options = OpenOptions::new();
        options.create(true).write(true);
        if oversized {
            debug!("truncating oversized error log {}", path.display());
            options.truncate(true);
        } else {
            options.append(true);
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(path)?;
        file.write_all(self.render(args).as_bytes())
    }
}

/// Redact API tokens from text destined for the log.
pub fn filter_token(input: &str) -> String {
    static TOKEN_HEADER: OnceLock<Regex> = OnceLock::new();
    static TOKEN_FLAG: OnceLock<Regex> = OnceLock::new();

    let header = TOKEN_HEADER.get_or_init(|| {
        Regex::new(r"Token ([\w-]+)").unwrap_or_else(|e| panic!("invalid token regex: {e}"))
    });
    let flag = TOKEN_FLAG.get_or_init(|| {
        Regex::new(r#"(-t|--token)(\s*=?\s*['"]?)([\w-]+)(['"]?)"#)
            .unwrap_or_else(|e| panic!("invalid token flag regex: {e}"))
    });

    let redacted = header.replace_all(input, "Token REDACTED");
    flag.replace_all(&redacted, "${1}${2}REDACTED${4}")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case("Token abc-123 is invalid", "Token REDACTED is invalid")]
    #[case("service list --token abc123", "service list --token REDACTED")]
    #[case("service list -t abc123", "service list -t REDACTED")]
    #[case("service list --token='abc123'", "service list --token='REDACTED'")]
    #[case("service list --json", "service list --json")]
    fn given_text_with_token_when_filtering_then_token_is_redacted(
        #[case] input: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(filter_token(input), expected);
    }

    #[test]
    fn given_error_with_context_when_rendering_then_includes_all_sections() {
        let log = ErrorLog::new();
        log.add_with_context(
            &"500 - Internal Server Error",
            &[("Service ID", "123".to_string()), ("Version", "4".to_string())],
        );

        let rendered = log.render(&["backend".into(), "list".into(), "--token".into(), "secret".into()]);

        assert!(rendered.starts_with("COMMAND:\nfastly backend list --token REDACTED\n"));
        assert!(rendered.contains("ERROR:\n500 - Internal Server Error\n"));
        assert!(rendered.contains("CALLER:\nsrc/infrastructure/errlog.rs:"));
        assert!(rendered.contains("CONTEXT:\nService ID: 123\nVersion: 4\n"));
        assert!(rendered.trim_end().ends_with(SEPARATOR));
    }

    #[test]
    fn given_existing_log_when_persisting_then_appends() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(LOG_FILE_NAME);
        std::fs::write(&path, "previous run\n").unwrap();
        let log = ErrorLog::new();
        log.add(&"boom");

        log.persist(&path, &["whoami".to_string()]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("previous run\n"));
        assert!(content.contains("ERROR:\nboom"));
    }

    #[test]
    fn given_oversized_log_when_persisting_then_truncates_first() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(LOG_FILE_NAME);
        std::fs::write(&path, vec![b'x'; (MAX_LOG_SIZE + 1) as usize]).unwrap();
        let log = ErrorLog::new();
        log.add(&"boom");

        log.persist(&path, &[]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("COMMAND:"));
        assert!((content.len() as u64) < MAX_LOG_SIZE);
    }

    #[test]
    fn given_no_errors_when_persisting_then_no_file_is_created() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(LOG_FILE_NAME);

        ErrorLog::new().persist(&path, &[]).unwrap();

        assert!(!path.exists());
    }
}
