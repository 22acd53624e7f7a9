use interchange::InterchangeError;

pub(crate) type LabelshedResult<T> = Result<T, LabelshedError>;

macro_rules! bail {
    ($($arg:tt)*) => {{
        return Err(LabelshedError::Other(format!($($arg)*)));
    }};
}

pub(crate) use bail;

#[derive(Debug, thiserror::Error)]
pub(crate) enum LabelshedError {
    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Interchange(#[from] InterchangeError),

    #[error("{0}")]
    Other(String),
}

impl LabelshedError {
    /// Returns true, if the error was caused by a closed pipe.
    pub(crate) fn is_broken_pipe(&self) -> bool {
        use std::io::ErrorKind::BrokenPipe;

        match self {
            Self::IO(e) => e.kind() == BrokenPipe,
            Self::Interchange(InterchangeError::IO(e)) => {
                e.kind() == BrokenPipe
            }
            _ => false,
        }
    }
}
