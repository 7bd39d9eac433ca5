use thiserror::Error;

/// Raised by a row handler to stop the whole pipeline on purpose.
///
/// Readers pass this error through untouched so that callers can tell a deliberate stop apart
/// from a parse fault with `error.is::<HaltPipeline>()`.
#[derive(Debug, Error)]
#[error("pipeline halted: {message}")]
pub struct HaltPipeline {
    message: String,
}

impl HaltPipeline {
    pub fn new(message: &str) -> HaltPipeline {
        HaltPipeline {
            message: message.to_string(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Location of a failure while reading a delimited source. Attached as context to the
/// underlying error.
#[derive(Debug, Error)]
pub enum ParseFault {
    #[error("could not process header at line {line} of {source_name}: {text}")]
    Header {
        source_name: String,
        line: usize,
        text: String,
    },
    #[error("could not process line {line} of {source_name}: {text}")]
    Row {
        source_name: String,
        line: usize,
        text: String,
    },
}

impl ParseFault {
    pub fn line(&self) -> usize {
        match self {
            ParseFault::Header { line, .. } => *line,
            ParseFault::Row { line, .. } => *line,
        }
    }

    pub fn source_name(&self) -> &str {
        match self {
            ParseFault::Header { source_name, .. } => source_name,
            ParseFault::Row { source_name, .. } => source_name,
        }
    }
}

/// Misuse of the external sort and failures of its merge tasks.
#[derive(Debug, Error)]
pub enum SortError {
    #[error("sort column '{column}' is missing from the record")]
    MissingColumn { column: String },

    #[error("value '{value}' of column '{column}' cannot be ordered as {field_type}")]
    Unorderable {
        column: String,
        value: String,
        field_type: String,
    },

    #[error("column '{column}' is not among the columns of the first record")]
    UnexpectedColumn { column: String },

    #[error("sort column '{column}' not found in the header of {path}")]
    UnknownColumn { column: String, path: String },

    #[error("header of {right} does not match the header of {left}")]
    HeaderMismatch { left: String, right: String },

    #[error("file {path} has no header")]
    MissingHeader { path: String },

    #[error("records cannot be added after the files were merged")]
    Finished,

    #[error("no records were added")]
    NoRecords,

    #[error("could not merge files {left} and {right}")]
    MergeFailed { left: String, right: String },

    #[error("a merge task terminated without reporting a result")]
    TaskLost,
}
