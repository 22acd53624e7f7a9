use std::path::PathBuf;
use std::{env, fs};

use crate::config::Config;
use crate::error::{LabelshedError, LabelshedResult};
use crate::store::FileStore;

pub(crate) struct Labelshed {
    /// The root directory of the labelshed.
    root_dir: PathBuf,
}

impl Labelshed {
    pub(crate) const CONFIG: &'static str = "labelshed.toml";
    pub(crate) const DATA_DIR: &'static str = "data";

    /// Discovers the root of the labelshed.
    ///
    /// This function fails, if neither the current directory nor any
    /// parent directory contains a labelshed [Config].
    pub(crate) fn discover() -> LabelshedResult<Self> {
        let mut root_dir = env::current_dir()?;

        loop {
            if let Ok(metadata) = fs::metadata(root_dir.join(Self::CONFIG))
            {
                if metadata.is_file() {
                    break;
                }
            }

            if !root_dir.pop() {
                return Err(LabelshedError::Other(
                    "not a labelshed (or any parent directory)".into(),
                ));
            }
        }

        Ok(Self { root_dir })
    }

    /// Returns the config associated with the labelshed.
    #[inline]
    pub(crate) fn config(&self) -> LabelshedResult<Config> {
        Config::from_path(self.root_dir.join(Self::CONFIG))
    }

    /// Returns the data directory of the labelshed.
    #[inline]
    pub(crate) fn data_dir(&self) -> PathBuf {
        self.root_dir.join(Self::DATA_DIR)
    }

    /// Opens the document and annotation store of the labelshed.
    #[inline]
    pub(crate) fn store(&self, config: &Config) -> LabelshedResult<FileStore> {
        FileStore::open(self.data_dir(), config)
    }
}
