use std::io::{self, Read};
use std::ops::ControlFlow;
use std::path::Path;

use crate::codec;
use crate::error::{HaltPipeline, ParseFault};
use crate::line_source::LineSource;

/// Receives the rows of a delimited source driven by [CsvReader::parse].
pub trait RowHandler {
    /// Called once with the first non blank line unless the reader was given its column headers.
    fn process_header(&mut self, header: &[String]) -> Result<(), anyhow::Error>;

    /// Called for every data row. Return `ControlFlow::Break(())` to stop reading early.
    fn process_row(&mut self, header: &[String], row: Vec<String>) -> Result<ControlFlow<()>, anyhow::Error>;

    /// Called after reading ends, whether it completed, was stopped or failed.
    fn after_processing(&mut self) {}
}

/// Push mode reader. Parses a delimited source and hands every row to a [RowHandler].
///
/// # Examples
/// ```
/// use std::io::Cursor;
/// use std::ops::ControlFlow;
/// use delimited_sort::reader::{CsvReader, RowHandler};
///
/// struct Names(Vec<String>);
///
/// impl RowHandler for Names {
///     fn process_header(&mut self, _header: &[String]) -> Result<(), anyhow::Error> {
///         Ok(())
///     }
///
///     fn process_row(&mut self, _header: &[String], row: Vec<String>) -> Result<ControlFlow<()>, anyhow::Error> {
///         self.0.push(row[0].clone());
///         Ok(ControlFlow::Continue(()))
///     }
/// }
///
/// let mut names = Names(Vec::new());
/// let reader = CsvReader::from_reader(Cursor::new("name,age\nTom,59\nMeg,54\n"), ",").unwrap();
/// assert_eq!(reader.parse(&mut names).unwrap(), 2);
/// assert_eq!(names.0, vec!["Tom", "Meg"]);
/// ```
pub struct CsvReader {
    source: LineSource,
    separator: String,
    escaped: bool,
    column_headers: Option<Vec<String>>,
}

impl CsvReader {
    pub fn open<P: AsRef<Path>>(path: P, separator: &str) -> Result<CsvReader, anyhow::Error> {
        Ok(CsvReader::new(LineSource::open(path.as_ref())?, separator))
    }

    /// Read from an in-memory or otherwise unnamed source.
    pub fn from_reader<R: Read + Send + 'static>(reader: R, separator: &str) -> Result<CsvReader, anyhow::Error> {
        Ok(CsvReader::new(LineSource::from_reader(reader)?, separator))
    }

    fn new(source: LineSource, separator: &str) -> CsvReader {
        CsvReader {
            source,
            separator: separator.to_string(),
            escaped: true,
            column_headers: None,
        }
    }

    /// Interpret quotes and escapes. The default is true.
    pub fn escaped(mut self, escaped: bool) -> CsvReader {
        self.escaped = escaped;
        self
    }

    /// Use the given headers and treat the first line as data.
    pub fn with_column_headers(mut self, column_headers: Vec<String>) -> CsvReader {
        self.column_headers = Some(column_headers);
        self
    }

    pub fn column_headers(&self) -> Option<&[String]> {
        self.column_headers.as_deref()
    }

    /// Drive `handler` over the whole source and return the number of data rows consumed,
    /// counting the row that stopped the iteration.
    ///
    /// Errors raised by the handler are wrapped with a [ParseFault] naming the source and line,
    /// except [HaltPipeline] which is returned as is.
    pub fn parse<H: RowHandler>(mut self, handler: &mut H) -> Result<usize, anyhow::Error> {
        let result = self.drive(handler);
        handler.after_processing();
        result
    }

    fn drive<H: RowHandler>(&mut self, handler: &mut H) -> Result<usize, anyhow::Error> {
        if self.column_headers.is_none() {
            let header = match self.read_row() {
                Ok(Some(header)) => header,
                Ok(None) => return Ok(0),
                Err(e) => return Err(self.fault(e.into(), true, true)),
            };
            if let Err(e) = handler.process_header(&header) {
                return Err(self.fault(e, true, false));
            }
            self.column_headers = Some(header);
        }

        let header = self.column_headers.take().unwrap_or_default();
        let mut rows = 0;
        let result = loop {
            let row = match self.read_row() {
                Ok(Some(row)) => row,
                Ok(None) => break Ok(rows),
                Err(e) => break Err(self.fault(e.into(), false, true)),
            };
            rows += 1;
            match handler.process_row(&header, row) {
                Ok(ControlFlow::Continue(())) => {}
                Ok(ControlFlow::Break(())) => break Ok(rows),
                Err(e) => break Err(self.fault(e, false, false)),
            }
        };
        self.column_headers = Some(header);
        log::debug!("Read {} rows from {}", rows, self.source.name());
        result
    }

    fn read_row(&mut self) -> io::Result<Option<Vec<String>>> {
        let separator = &self.separator;
        let escaped = self.escaped;
        Ok(self.source.next_line()?.map(|line| codec::parse_line(line, separator, escaped)))
    }

    /// A failed read has not counted the line it was reading.
    fn fault(&self, error: anyhow::Error, header: bool, read: bool) -> anyhow::Error {
        if error.is::<HaltPipeline>() {
            return error;
        }
        let source_name = self.source.name().to_string();
        let line = if read {
            self.source.line_number() + 1
        } else {
            self.source.line_number()
        };
        let text = self.source.diagnostic_line();
        let fault = if header {
            ParseFault::Header { source_name, line, text }
        } else {
            ParseFault::Row { source_name, line, text }
        };
        error.context(fault)
    }
}
