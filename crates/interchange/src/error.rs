use std::fmt::{self, Display};

use serde::ser::{Serialize, SerializeMap, Serializer};

pub type InterchangeResult<T> = Result<T, InterchangeError>;

macro_rules! bail {
    ($kind:ident, $($arg:tt)*) => {{
        return Err($crate::error::InterchangeError::$kind(format!(
            $($arg)*
        )));
    }};
}

pub(crate) use bail;

#[derive(Debug, thiserror::Error)]
pub enum InterchangeError {
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("{0}")]
    MalformedInput(String),

    #[error("{0}")]
    MissingKeyOrField(String),

    #[error("label index out of bounds: {0}")]
    SpanOutOfBounds(String),

    #[error("overlapping spans: {0}")]
    OverlappingSpans(String),

    #[error("{0}")]
    EmptyResult(String),

    #[error("{0}")]
    MissingAnnotation(String),

    #[error("{0}")]
    MismatchedAnnotationCount(String),

    #[error("invalid agreement matrix: {0}")]
    InvalidAgreementMatrix(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl InterchangeError {
    /// Prefixes the message of a record-level error with the (1-based)
    /// number of the record it was raised for.
    pub(crate) fn at_line(self, line: usize) -> Self {
        self.prefixed(&format!("Line {line}"))
    }

    /// Prefixes the message of a record-level error with the id of the
    /// stored document it was raised for.
    pub(crate) fn at_document(self, id: u64) -> Self {
        self.prefixed(&format!("Document {id}"))
    }

    fn prefixed(self, prefix: &str) -> Self {
        use InterchangeError::*;

        match self {
            MalformedInput(m) => MalformedInput(format!("{prefix}: {m}")),
            SpanOutOfBounds(m) => SpanOutOfBounds(format!("{prefix}: {m}")),
            OverlappingSpans(m) => {
                OverlappingSpans(format!("{prefix}: {m}"))
            }
            other => other,
        }
    }
}

/// A failure that is bound to a single input file.
///
/// Batch operations never abort because of a broken file; instead they
/// collect one `FileError` per problem. The serialized form is the
/// single-entry object `{"<file_name>": "<message>"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileError {
    pub file_name: String,
    pub message: String,
}

impl FileError {
    pub fn new<N, M>(file_name: N, message: M) -> Self
    where
        N: Into<String>,
        M: ToString,
    {
        Self {
            file_name: file_name.into(),
            message: message.to_string(),
        }
    }
}

impl Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file_name, self.message)
    }
}

impl Serialize for FileError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.file_name, &self.message)?;
        map.end()
    }
}

/// A reader failure that is bound to a single line (or record) of an
/// otherwise readable file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineError {
    pub line: usize,
    pub message: String,
}

impl LineError {
    pub fn new<M: ToString>(line: usize, message: M) -> Self {
        Self {
            line,
            message: message.to_string(),
        }
    }
}

impl Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}: {}", self.line, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = anyhow::Result<()>;

    #[test]
    fn file_error_serialize() -> TestResult {
        let error = FileError::new("a.jsonl", "Line 2: EOF");
        assert_eq!(
            serde_json::to_string(&error)?,
            r#"{"a.jsonl":"Line 2: EOF"}"#
        );
        assert_eq!(error.to_string(), "a.jsonl: Line 2: EOF");
        Ok(())
    }

    #[test]
    fn at_line_prefixes_record_errors() {
        let err = InterchangeError::SpanOutOfBounds("end 9 > 4".into())
            .at_line(3);
        assert_eq!(
            err.to_string(),
            "label index out of bounds: Line 3: end 9 > 4"
        );

        let err = InterchangeError::NotFound("project 1".into()).at_line(3);
        assert_eq!(err.to_string(), "project 1 not found");
    }
}
