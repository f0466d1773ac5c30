//! JSONL reading operations.
//!
//! This module provides async functionality for reading JSONL files line-by-line
//! with efficient buffering and line number tracking for error reporting.

use crate::{Error, Result, Warning};
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Async reader for JSONL (JSON Lines) data.
///
/// `JsonlReader` wraps an async reader and provides buffered reading of JSONL
/// formatted data. It tracks line numbers to provide useful context in error
/// messages when parsing fails. Whitespace-only lines are skipped.
///
/// # Examples
///
/// ```no_run
/// use constellation_jsonl::JsonlReader;
/// use tokio::fs::File;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let file = File::open("graph.jsonl").await?;
/// let mut reader = JsonlReader::new(file);
/// while let Some(value) = reader.read_line::<serde_json::Value>().await? {
///     println!("{value}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct JsonlReader<R> {
    /// Buffered reader wrapping the underlying async reader.
    reader: BufReader<R>,
    /// Current line number (1-based, 0 before any lines are read).
    line_number: usize,
    /// Reusable line buffer.
    buffer: Vec<u8>,
}

impl<R: AsyncRead + Unpin> JsonlReader<R> {
    /// Creates a new `JsonlReader` wrapping the given async reader.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line_number: 0,
            buffer: Vec::new(),
        }
    }

    /// Creates a new `JsonlReader` with a custom buffer capacity.
    #[must_use]
    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self {
            reader: BufReader::with_capacity(capacity, reader),
            line_number: 0,
            buffer: Vec::new(),
        }
    }

    /// Returns the 1-based number of the last line read, or 0 before any read.
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Reads the next non-blank raw line.
    ///
    /// Returns `Ok(None)` at end of input. A line that is not valid UTF-8 is
    /// reported as [`Error::InvalidFormat`].
    async fn next_raw_line(&mut self) -> Result<Option<String>> {
        loop {
            self.buffer.clear();
            let read = self.reader.read_until(b'\n', &mut self.buffer).await?;
            if read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let line = std::str::from_utf8(&self.buffer).map_err(|e| Error::InvalidFormat {
                line_number: self.line_number,
                reason: format!("invalid UTF-8: {e}"),
            })?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            return Ok(Some(trimmed.to_string()));
        }
    }

    /// Reads and deserializes the next record.
    ///
    /// # Errors
    ///
    /// Fails on the first I/O error, invalid UTF-8 line, or line that does not
    /// deserialize into `T`.
    pub async fn read_line<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        match self.next_raw_line().await? {
            Some(line) => Ok(Some(serde_json::from_str(&line)?)),
            None => Ok(None),
        }
    }

    /// Reads every remaining record, skipping damaged lines.
    ///
    /// Lines that are not valid UTF-8 or do not deserialize into `T` are
    /// skipped and reported as warnings. Only I/O errors abort the read.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the underlying reader fails.
    pub async fn read_resilient<T: DeserializeOwned>(mut self) -> Result<(Vec<T>, Vec<Warning>)> {
        let mut values = Vec::new();
        let mut warnings = Vec::new();

        loop {
            let line = match self.next_raw_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(Error::InvalidFormat {
                    line_number,
                    reason,
                }) => {
                    warnings.push(Warning::SkippedLine {
                        line_number,
                        reason,
                    });
                    continue;
                }
                Err(e) => return Err(e),
            };

            match serde_json::from_str::<T>(&line) {
                Ok(value) => values.push(value),
                Err(e) => {
                    tracing::debug!(line = self.line_number, error = %e, "Skipping malformed JSONL line");
                    warnings.push(Warning::MalformedJson {
                        line_number: self.line_number,
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok((values, warnings))
    }

    /// Consumes the reader, returning the underlying buffered reader.
    #[must_use]
    pub fn into_inner(self) -> BufReader<R> {
        self.reader
    }
}

/// Reads a whole JSONL file, skipping damaged lines.
///
/// See [`JsonlReader::read_resilient`] for the skipping rules.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be opened or read.
pub async fn read_jsonl_resilient<T, P>(path: P) -> Result<(Vec<T>, Vec<Warning>)>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref()).await?;
    JsonlReader::new(file).read_resilient().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Cursor;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Row {
        id: u32,
    }

    #[test]
    fn new_reader_starts_at_line_zero() {
        let reader = JsonlReader::new(Cursor::new(b""));
        assert_eq!(reader.line_number(), 0);
    }

    #[test]
    fn with_capacity_creates_reader() {
        let reader = JsonlReader::with_capacity(Cursor::new(b"{}"), 8192);
        assert_eq!(reader.line_number(), 0);
    }

    #[tokio::test]
    async fn read_line_skips_blank_lines_and_counts_them() {
        let mut reader = JsonlReader::new(Cursor::new(b"\n{\"id\":1}\n   \n{\"id\":2}\n".to_vec()));

        assert_eq!(reader.read_line::<Row>().await.unwrap(), Some(Row { id: 1 }));
        assert_eq!(reader.line_number(), 2);
        assert_eq!(reader.read_line::<Row>().await.unwrap(), Some(Row { id: 2 }));
        assert_eq!(reader.line_number(), 4);
        assert_eq!(reader.read_line::<Row>().await.unwrap(), None);
    }

    #[tokio::test]
    async fn read_line_fails_on_malformed_json() {
        let mut reader = JsonlReader::new(Cursor::new(b"{not json}\n".to_vec()));
        assert!(matches!(
            reader.read_line::<Row>().await,
            Err(Error::Json(_))
        ));
    }

    #[tokio::test]
    async fn read_resilient_reports_invalid_utf8_as_skipped_line() {
        let mut data = b"{\"id\":1}\n".to_vec();
        data.extend_from_slice(&[0xff, 0xfe, b'\n']);
        data.extend_from_slice(b"{\"id\":3}\n");

        let (rows, warnings) = JsonlReader::new(Cursor::new(data))
            .read_resilient::<Row>()
            .await
            .unwrap();

        assert_eq!(rows, vec![Row { id: 1 }, Row { id: 3 }]);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind(), "skipped_line");
        assert_eq!(warnings[0].line_number(), 2);
    }
}
