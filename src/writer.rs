use std::fs;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};

use crate::codec;
use crate::line_source::{STREAM_NAME, UTF8_BOM};
use crate::record::Record;
use crate::value::Value;

enum Target {
    Path(PathBuf),
    Stream(Option<Box<dyn Write + Send>>),
}

/// Writes rows of delimited text.
///
/// A file target is created, along with missing parent directories, on the first write, so a
/// writer that never writes leaves nothing behind. Dropping the writer flushes it, [CsvWriter::close]
/// does the same and reports failures.
///
/// # Examples
/// ```
/// use delimited_sort::record::Record;
/// use delimited_sort::writer::CsvWriter;
///
/// fn write_people(path: &std::path::Path) -> Result<(), anyhow::Error> {
///     let mut writer = CsvWriter::create(path, ",");
///     writer.write_record(&Record::new().with("name", "Tom Hanks").with("age", 59))?;
///     writer.write_record(&Record::new().with("name", "Meg Ryan").with("age", 54))?;
///     writer.close()
/// }
/// ```
pub struct CsvWriter {
    target: Target,
    out: Option<BufWriter<Box<dyn Write + Send>>>,
    closed: bool,
    separator: String,
    bom: bool,
    line_terminator: String,
    column_headers: Option<Vec<String>>,
    rows: usize,
}

impl CsvWriter {
    /// Write to `path`. The file is created on the first write.
    pub fn create<P: AsRef<Path>>(path: P, separator: &str) -> CsvWriter {
        CsvWriter::new(Target::Path(path.as_ref().to_path_buf()), separator)
    }

    pub fn from_writer<W: Write + Send + 'static>(writer: W, separator: &str) -> CsvWriter {
        CsvWriter::new(Target::Stream(Some(Box::new(writer))), separator)
    }

    fn new(target: Target, separator: &str) -> CsvWriter {
        CsvWriter {
            target,
            out: None,
            closed: false,
            separator: separator.to_string(),
            bom: false,
            line_terminator: "\n".to_string(),
            column_headers: None,
            rows: 0,
        }
    }

    /// Start the output with a UTF-8 byte order mark. The default is false.
    pub fn with_bom(mut self, bom: bool) -> CsvWriter {
        self.bom = bom;
        self
    }

    /// Set the line terminator. The default is "\n".
    pub fn with_line_terminator(mut self, line_terminator: &str) -> CsvWriter {
        self.line_terminator = line_terminator.to_string();
        self
    }

    /// Set the column order used by [CsvWriter::write_record].
    pub fn with_column_headers(mut self, column_headers: Vec<String>) -> CsvWriter {
        self.column_headers = Some(column_headers);
        self
    }

    /// Write a row of present fields.
    pub fn write_row<S: AsRef<str>>(&mut self, row: &[S]) -> Result<(), anyhow::Error> {
        let fields: Vec<Option<&str>> = row.iter().map(|field| Some(field.as_ref())).collect();
        self.write_fields(&fields)
    }

    /// Write a row in which `None` fields are written as null.
    pub fn write_fields<S: AsRef<str>>(&mut self, fields: &[Option<S>]) -> Result<(), anyhow::Error> {
        let mut line = codec::format_line(fields, &self.separator);
        line.push_str(&self.line_terminator);
        let written = self.output()?.write_all(line.as_bytes());
        written.with_context(|| format!("write to {}", self.name()))?;
        self.rows += 1;
        Ok(())
    }

    /// Write a row of values. [Value::Null] is written as null.
    pub fn write_values(&mut self, values: &[Value]) -> Result<(), anyhow::Error> {
        let fields: Vec<Option<String>> = values.iter().map(Value::as_field).collect();
        self.write_fields(&fields)
    }

    /// Write the values of `record` in the order of `columns`. The first call fixes the column
    /// order for later calls; no header row is written. Missing columns are written as null.
    pub fn write_record_with_columns<S: AsRef<str>>(&mut self, record: &Record, columns: &[S]) -> Result<(), anyhow::Error> {
        if self.column_headers.is_none() {
            self.column_headers = Some(columns.iter().map(|c| c.as_ref().to_string()).collect());
        }
        self.write_projected(record)
    }

    /// Write the values of `record` in the column order captured from the first record written,
    /// preceded by a header row when nothing was written yet.
    pub fn write_record(&mut self, record: &Record) -> Result<(), anyhow::Error> {
        if self.column_headers.is_none() {
            self.column_headers = Some(record.columns().map(str::to_string).collect());
        }
        if self.rows == 0 {
            let header = self.column_headers.clone().unwrap_or_default();
            self.write_row(&header)?;
        }
        self.write_projected(record)
    }

    fn write_projected(&mut self, record: &Record) -> Result<(), anyhow::Error> {
        let fields: Vec<Option<String>> = self.column_headers
            .iter()
            .flatten()
            .map(|column| record.get(column).and_then(Value::as_field))
            .collect();
        self.write_fields(&fields)
    }

    pub fn flush(&mut self) -> Result<(), anyhow::Error> {
        if let Some(out) = self.out.as_mut() {
            let flushed = out.flush();
            flushed.with_context(|| format!("flush {}", self.name()))?;
        }
        Ok(())
    }

    /// Flush and release the output.
    pub fn close(&mut self) -> Result<(), anyhow::Error> {
        self.flush()?;
        self.out = None;
        self.closed = true;
        Ok(())
    }

    /// Lines written so far, header rows included.
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn column_headers(&self) -> Option<&[String]> {
        self.column_headers.as_deref()
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.target {
            Target::Path(path) => Some(path.as_path()),
            Target::Stream(_) => None,
        }
    }

    fn name(&self) -> String {
        match &self.target {
            Target::Path(path) => path.display().to_string(),
            Target::Stream(_) => STREAM_NAME.to_string(),
        }
    }

    fn output(&mut self) -> Result<&mut BufWriter<Box<dyn Write + Send>>, anyhow::Error> {
        if self.out.is_none() {
            let out = self.open()?;
            self.out = Some(out);
        }
        let name = self.name();
        self.out.as_mut().ok_or_else(|| anyhow!("writer for {} is closed", name))
    }

    fn open(&mut self) -> Result<BufWriter<Box<dyn Write + Send>>, anyhow::Error> {
        if self.closed {
            return Err(anyhow!("writer for {} is closed", self.name()));
        }
        let sink: Box<dyn Write + Send> = match &mut self.target {
            Target::Path(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        fs::create_dir_all(parent)
                            .with_context(|| format!("create directory {}", parent.display()))?;
                    }
                }
                let file = File::create(path.as_path()).with_context(|| format!("path: {}", path.display()))?;
                Box::new(file)
            }
            Target::Stream(stream) => stream
                .take()
                .ok_or_else(|| anyhow!("output stream was already released"))?,
        };
        let mut out = BufWriter::new(sink);
        if self.bom {
            out.write_all(UTF8_BOM)?;
        }
        Ok(out)
    }
}
