//! Append-only file sink.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Appends one message value per line to a log file.
///
/// Every append is written and flushed before the next message is taken, so a
/// shutdown mid-stream never truncates a line. The sink does not deduplicate;
/// at-least-once delivery may produce repeated lines.
#[derive(Debug)]
pub struct FileSink {
    file: File,
}

impl FileSink {
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file })
    }

    pub fn append(&mut self, value: &str) -> std::io::Result<()> {
        let mut line = String::with_capacity(value.len() + 1);
        line.push_str(value);
        line.push('\n');

        self.file.write_all(line.as_bytes())?;
        self.file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_one_line_per_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.log");

        let mut sink = FileSink::open(&path).unwrap();
        sink.append(r#"{"action":"CREATE_TASK"}"#).unwrap();
        sink.append(r#"{"action":"COMPLETE_TASK"}"#).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "{\"action\":\"CREATE_TASK\"}\n{\"action\":\"COMPLETE_TASK\"}\n"
        );
    }

    #[test]
    fn reopening_appends_instead_of_truncating() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.log");

        FileSink::open(&path).unwrap().append("first").unwrap();
        FileSink::open(&path).unwrap().append("second").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "first\nsecond\n");
    }
}
