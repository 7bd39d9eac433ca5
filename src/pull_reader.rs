use std::io::Read;
use std::path::Path;

use anyhow::anyhow;
use indexmap::IndexMap;

use crate::codec;
use crate::error::ParseFault;
use crate::line_source::LineSource;

/// Pull mode reader. Every call to [PullReader::next_row] yields the next row of the source.
///
/// The first call consumes the header line when header capture is enabled, which is the
/// default. The reader holds the source open until [PullReader::close] is called or the reader
/// is dropped.
///
/// # Examples
/// ```
/// use std::io::Cursor;
/// use delimited_sort::pull_reader::PullReader;
///
/// let mut reader = PullReader::from_reader(Cursor::new("a|b\n1|2\n"), "|").unwrap();
/// assert_eq!(reader.next_row().unwrap(), Some(vec!["1".to_string(), "2".to_string()]));
/// assert_eq!(reader.column_headers(), Some(&["a".to_string(), "b".to_string()][..]));
/// assert_eq!(reader.next_row().unwrap(), None);
/// reader.close();
/// ```
pub struct PullReader {
    source: Option<LineSource>,
    name: String,
    separator: String,
    escaped: bool,
    header_first_line: bool,
    column_headers: Option<Vec<String>>,
}

impl PullReader {
    pub fn open<P: AsRef<Path>>(path: P, separator: &str) -> Result<PullReader, anyhow::Error> {
        Ok(PullReader::new(LineSource::open(path.as_ref())?, separator))
    }

    pub fn from_reader<R: Read + Send + 'static>(reader: R, separator: &str) -> Result<PullReader, anyhow::Error> {
        Ok(PullReader::new(LineSource::from_reader(reader)?, separator))
    }

    fn new(source: LineSource, separator: &str) -> PullReader {
        PullReader {
            name: source.name().to_string(),
            source: Some(source),
            separator: separator.to_string(),
            escaped: true,
            header_first_line: true,
            column_headers: None,
        }
    }

    /// Interpret quotes and escapes. The default is true.
    pub fn escaped(mut self, escaped: bool) -> PullReader {
        self.escaped = escaped;
        self
    }

    /// Treat the first non blank line as the header. The default is true.
    pub fn with_header(mut self, header_first_line: bool) -> PullReader {
        self.header_first_line = header_first_line;
        self
    }

    /// Next data row, or `None` at the end of the source.
    pub fn next_row(&mut self) -> Result<Option<Vec<String>>, anyhow::Error> {
        let capture_header = self.header_first_line
            && self.column_headers.is_none()
            && self.lines() == 0;
        if capture_header {
            self.column_headers = self.read_next(true)?;
        }
        self.read_next(false)
    }

    fn read_next(&mut self, header: bool) -> Result<Option<Vec<String>>, anyhow::Error> {
        let source = self.source
            .as_mut()
            .ok_or_else(|| anyhow!("reader for {} is closed", self.name))?;
        let separator = &self.separator;
        let escaped = self.escaped;
        let row = source
            .next_line()
            .map(|line| line.map(|line| codec::parse_line(line, separator, escaped)));
        match row {
            Ok(row) => Ok(row),
            Err(e) => {
                let source_name = source.name().to_string();
                let line = source.line_number() + 1;
                let text = source.diagnostic_line();
                let fault = if header {
                    ParseFault::Header { source_name, line, text }
                } else {
                    ParseFault::Row { source_name, line, text }
                };
                Err(anyhow::Error::new(e).context(fault))
            }
        }
    }

    /// Release the underlying source. Further reads fail.
    pub fn close(&mut self) {
        self.source = None;
    }

    /// Non blank lines consumed so far, the header included.
    pub fn lines(&self) -> usize {
        self.source.as_ref().map_or(0, LineSource::lines)
    }

    /// Text of the last line read.
    pub fn last_line(&self) -> Option<&str> {
        self.source.as_ref().and_then(LineSource::last_line)
    }

    pub fn column_headers(&self) -> Option<&[String]> {
        self.column_headers.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Yield rows keyed by the header. Short rows are padded with empty strings.
    pub fn into_maps(self) -> MapRows {
        MapRows {
            reader: self,
        }
    }
}

impl Iterator for PullReader {
    type Item = Result<Vec<String>, anyhow::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

/// Rows of a [PullReader] as header keyed maps.
pub struct MapRows {
    reader: PullReader,
}

impl MapRows {
    pub fn reader(&self) -> &PullReader {
        &self.reader
    }
}

impl Iterator for MapRows {
    type Item = Result<IndexMap<String, String>, anyhow::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = match self.reader.next_row() {
            Ok(Some(row)) => row,
            Ok(None) => return None,
            Err(e) => return Some(Err(e)),
        };
        let header = match self.reader.column_headers() {
            Some(header) => header,
            None => return Some(Err(anyhow!("{} has no header to key rows by", self.reader.name()))),
        };
        let mut values = row.into_iter();
        let map = header
            .iter()
            .map(|column| (column.clone(), values.next().unwrap_or_default()))
            .collect();
        Some(Ok(map))
    }
}
