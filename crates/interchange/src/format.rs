use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{bail, InterchangeError};

/// The closed set of interchange formats.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Txt,
    Json,
    Jsonl,
    Csv,
    Conllu,
}

impl Format {
    pub const ALL: [Format; 5] = [
        Format::Txt,
        Format::Json,
        Format::Jsonl,
        Format::Csv,
        Format::Conllu,
    ];

    /// Returns the file extension used for files of this format.
    #[inline]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Json => "json",
            Self::Jsonl => "jsonl",
            Self::Csv => "csv",
            Self::Conllu => "conllu",
        }
    }

    /// Returns the MIME type of a payload in this format.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Txt | Self::Conllu => "text/plain; charset=utf-8",
            Self::Json => "application/json",
            Self::Jsonl => "application/x-ndjson",
            Self::Csv => "text/csv; charset=utf-8",
        }
    }
}

impl Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for Format {
    type Err = InterchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "txt" => Ok(Self::Txt),
            "json" => Ok(Self::Json),
            "jsonl" => Ok(Self::Jsonl),
            "csv" => Ok(Self::Csv),
            "conllu" => Ok(Self::Conllu),
            _ => bail!(UnsupportedFormat, "'{s}'"),
        }
    }
}
