use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use interchange::store::{ProjectId, UserId};
use interchange::{ColumnMode, ProjectCategory};
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::error::{bail, LabelshedError, LabelshedResult};

/// Labelshed config.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct Config {
    /// The path of the config.
    #[serde(skip)]
    path: PathBuf,

    /// Labelshed metadata.
    pub(crate) metadata: Metadata,

    /// The annotation project.
    pub(crate) project: Project,

    /// The annotators, keyed by their username.
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub(crate) users: BTreeMap<String, User>,

    /// Conversion options.
    pub(crate) convert: Option<Convert>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Metadata {
    /// The name of the labelshed.
    pub(crate) name: String,

    /// The version of the labelshed.
    pub(crate) version: Version,

    /// A short blurb about the labelshed.
    pub(crate) description: Option<String>,

    /// A list of people or organizations, which are considered as the
    /// authors of the labelshed.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub(crate) authors: Vec<String>,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            name: "".into(),
            version: Version::new(0, 1, 0),
            description: None,
            authors: vec![],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Project {
    pub(crate) id: ProjectId,
    pub(crate) category: ProjectCategory,

    /// The label vocabulary.
    #[serde(default)]
    pub(crate) labels: Vec<String>,
}

impl Default for Project {
    fn default() -> Self {
        Self {
            id: 1,
            category: ProjectCategory::default(),
            labels: vec![],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct User {
    pub(crate) id: UserId,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct Convert {
    /// How column-oriented JSON with columns of different lengths is
    /// read.
    pub(crate) json_columns: Option<ColumnMode>,
}

impl Config {
    /// Creates a new default config and sets the file location.
    pub(crate) fn create<P>(path: P) -> LabelshedResult<Self>
    where
        P: AsRef<Path>,
    {
        Ok(Self {
            path: path.as_ref().into(),
            ..Default::default()
        })
    }

    /// Loads an existing config from a path.
    pub(crate) fn from_path<P>(path: P) -> LabelshedResult<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref().into();
        let content = fs::read_to_string(&path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.path = path;

        Ok(config)
    }

    /// Saves the config.
    pub(crate) fn save(&self) -> LabelshedResult<()> {
        let content = toml::to_string(self)?;
        let mut out = File::create(&self.path)?;
        out.write_all(content.as_bytes())?;
        Ok(())
    }

    /// Returns the id of the user `username`.
    pub(crate) fn user_id(&self, username: &str) -> LabelshedResult<UserId> {
        match self.users.get(username) {
            Some(user) => Ok(user.id),
            None => bail!("user '{username}' does not exist."),
        }
    }

    /// Returns the column mode of the JSON reader.
    pub(crate) fn json_columns(&self) -> ColumnMode {
        self.convert
            .as_ref()
            .and_then(|convert| convert.json_columns)
            .unwrap_or_default()
    }
}
