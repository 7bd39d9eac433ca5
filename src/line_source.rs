use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use anyhow::Context;

pub(crate) const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];
pub(crate) const STREAM_NAME: &str = "<stream>";
const MAX_DIAGNOSTIC_CHARS: usize = 128;

/// Physical lines of a UTF-8 source with the byte order mark removed and blank lines skipped.
pub(crate) struct LineSource {
    name: String,
    reader: Box<dyn BufRead + Send>,
    line_number: usize,
    lines: usize,
    last_line: Option<String>,
}

impl LineSource {
    pub(crate) fn open(path: &Path) -> Result<LineSource, anyhow::Error> {
        let file = File::open(path).with_context(|| format!("path: {}", path.display()))?;
        LineSource::new(Box::new(BufReader::new(file)), path.display().to_string())
            .with_context(|| format!("path: {}", path.display()))
    }

    pub(crate) fn from_reader<R: Read + Send + 'static>(reader: R) -> Result<LineSource, anyhow::Error> {
        LineSource::new(Box::new(BufReader::new(reader)), STREAM_NAME.to_string())
    }

    fn new(mut reader: Box<dyn BufRead + Send>, name: String) -> Result<LineSource, anyhow::Error> {
        strip_bom(reader.as_mut())?;
        Ok(
            LineSource {
                name,
                reader,
                line_number: 0,
                lines: 0,
                last_line: None,
            }
        )
    }

    /// Read the next non blank line without its terminator.
    pub(crate) fn next_line(&mut self) -> io::Result<Option<&str>> {
        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;
            trim_line_terminator(&mut line);
            if line.is_empty() {
                continue;
            }
            self.lines += 1;
            self.last_line = Some(line);
            return Ok(self.last_line.as_deref());
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// 1-based number of the last physical line read, blank lines included.
    pub(crate) fn line_number(&self) -> usize {
        self.line_number
    }

    /// Non blank lines read so far.
    pub(crate) fn lines(&self) -> usize {
        self.lines
    }

    pub(crate) fn last_line(&self) -> Option<&str> {
        self.last_line.as_deref()
    }

    pub(crate) fn diagnostic_line(&self) -> String {
        match &self.last_line {
            None => String::new(),
            Some(line) => truncate(line, MAX_DIAGNOSTIC_CHARS),
        }
    }
}

fn strip_bom(reader: &mut dyn BufRead) -> io::Result<()> {
    let bom_length = {
        let buf = reader.fill_buf()?;
        if buf.starts_with(UTF8_BOM) {
            UTF8_BOM.len()
        } else if buf.starts_with(UTF16_LE_BOM) || buf.starts_with(UTF16_BE_BOM) {
            return Err(
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    "UTF-16 byte order mark found, only UTF-8 input is supported",
                )
            );
        } else {
            0
        }
    };
    reader.consume(bom_length);
    Ok(())
}

fn trim_line_terminator(line: &mut String) {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
}

fn truncate(line: &str, max_chars: usize) -> String {
    match line.char_indices().nth(max_chars) {
        None => line.to_string(),
        Some((end, _)) => format!("{}...", &line[..end]),
    }
}
