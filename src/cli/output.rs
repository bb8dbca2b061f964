//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically. Everything
//! writes to a caller supplied writer so commands can be tested.

use std::fmt::Display;
use std::io::{self, Write};

use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

/// Print success status (green "SUCCESS:" prefix)
pub fn success(out: &mut dyn Write, msg: &(impl Display + ?Sized)) -> io::Result<()> {
    writeln!(out, "{} {}", "SUCCESS:".green().bold(), msg)
}

/// Print warning (yellow "WARNING:" prefix)
pub fn warning(out: &mut dyn Write, msg: &(impl Display + ?Sized)) -> io::Result<()> {
    writeln!(out, "{} {}", "WARNING:".yellow().bold(), msg)
}

/// Print informational note (cyan "INFO:" prefix)
pub fn info(out: &mut dyn Write, msg: &(impl Display + ?Sized)) -> io::Result<()> {
    writeln!(out, "{} {}", "INFO:".cyan().bold(), msg)
}

/// Print error with optional remediation, used by `main` for stderr.
pub fn error(out: &mut dyn Write, msg: &(impl Display + ?Sized), remediation: Option<&str>) -> io::Result<()> {
    writeln!(out, "{} {}", "ERROR:".red().bold(), msg)?;
    if let Some(help) = remediation {
        writeln!(out)?;
        writeln!(out, "{}", help)?;
    }
    Ok(())
}

/// Print plain output (no color)
pub fn plain(out: &mut dyn Write, msg: &(impl Display + ?Sized)) -> io::Result<()> {
    writeln!(out, "{}", msg)
}

/// Pretty printed JSON followed by a newline.
pub fn json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).map_err(io::Error::other)?;
    writeln!(out)
}

/// Spinner on stderr for slow network calls; hidden when `quiet`.
pub fn spinner(message: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Key/value lines of a verbose description block.
pub struct Block<'a> {
    out: &'a mut dyn Write,
    indent: usize,
}

impl<'a> Block<'a> {
    pub fn new(out: &'a mut dyn Write) -> Self {
        Self { out, indent: 0 }
    }

    pub fn indented(out: &'a mut dyn Write, indent: usize) -> Self {
        Self { out, indent }
    }

    pub fn field(&mut self, key: &str, value: impl Display) -> io::Result<&mut Self> {
        writeln!(self.out, "{}{}: {}", "\t".repeat(self.indent), key, value)?;
        Ok(self)
    }

    /// Print the field only when a value is present.
    pub fn optional<T: Display>(&mut self, key: &str, value: &Option<T>) -> io::Result<&mut Self> {
        match value {
            Some(v) => self.field(key, v),
            None => Ok(self),
        }
    }

    /// Header line for a nested group of fields.
    pub fn section(&mut self, key: &str) -> io::Result<&mut Self> {
        writeln!(self.out, "{}{}:", "\t".repeat(self.indent), key)?;
        Ok(self)
    }

    pub fn nested(&mut self) -> Block<'_> {
        Block::indented(&mut *self.out, self.indent + 1)
    }
}

/// Column aligned table; columns are separated by two spaces.
#[derive(Debug, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn row<I, S>(&mut self, cells: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.rows
            .push(cells.into_iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self, out: &mut dyn Write) -> io::Result<()> {
        let columns = self.headers.len();
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate().take(columns) {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let line = |cells: &[String]| -> String {
            let mut line = String::new();
            for (i, cell) in cells.iter().enumerate().take(columns) {
                if i + 1 == columns {
                    line.push_str(cell);
                } else {
                    line.push_str(&format!("{:<width$}  ", cell, width = widths[i]));
                }
            }
            line.trim_end().to_string()
        };

        writeln!(out, "{}", line(&self.headers))?;
        for row in &self.rows {
            writeln!(out, "{}", line(row))?;
        }
        Ok(())
    }
}

/// Render an optional value for a table cell.
pub fn cell<T: Display>(value: &Option<T>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_rows_when_rendering_table_then_columns_align_with_two_spaces() {
        let mut table = Table::new(["SERVICE", "VERSION", "NAME"]);
        table.row(["123", "1", "origin"]);
        table.row(["4567", "12", "b"]);
        let mut out = Vec::new();

        table.render(&mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "SERVICE  VERSION  NAME\n123      1        origin\n4567     12       b\n"
        );
    }

    #[test]
    fn given_no_rows_when_rendering_table_then_only_header_is_printed() {
        let table = Table::new(["ID", "Name"]);
        let mut out = Vec::new();

        table.render(&mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "ID  Name\n");
    }

    #[test]
    fn given_nested_block_when_printing_then_fields_are_tab_indented() {
        let mut out = Vec::new();
        {
            let mut block = Block::new(&mut out);
            block.field("ID", "someID").unwrap();
            block.section("Thresholds").unwrap();
            block.nested().field("Immediate", false).unwrap();
        }

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "ID: someID\nThresholds:\n\tImmediate: false\n"
        );
    }
}
