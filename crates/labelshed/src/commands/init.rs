use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{self, Stdio};
use std::{env, fs};

use clap::Parser;
use interchange::store::ProjectId;
use interchange::ProjectCategory;
use semver::Version;

use crate::prelude::*;

/// Initialize a new or re-initialize an existing labelshed.
#[derive(Debug, Parser)]
pub(crate) struct Init {
    /// The name of the labelshed.
    #[arg(short, long)]
    name: Option<String>,

    /// The version of the labelshed.
    #[arg(long, default_value = "0.1.0")]
    version: Version,

    /// A short blurb about the labelshed.
    #[arg(short, long)]
    description: Option<String>,

    /// A list of people or organizations, which are considered as the
    /// authors of the labelshed. By default the list is populated with
    /// the git identity (if available).
    #[arg(short, long = "author")]
    authors: Vec<String>,

    /// The id of the annotation project.
    #[arg(long, default_value = "1")]
    id: ProjectId,

    /// The category of the annotation project, either "text
    /// classification" or "sequential labelling".
    #[arg(short, long, default_value = "text classification")]
    category: ProjectCategory,

    /// The label vocabulary of the project.
    #[arg(short, long = "label")]
    labels: Vec<String>,

    /// Whether to overwrite config with default values or not.
    #[arg(short, long)]
    force: bool,

    /// The location of the labelshed.
    #[arg(default_value = ".")]
    path: PathBuf,
}

fn git_config(path: &Path, key: &str) -> Option<String> {
    let output = process::Command::new("git")
        .arg("config")
        .arg("--get")
        .arg(key)
        .current_dir(path)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .ok()?;

    let value = std::str::from_utf8(&output.stdout).ok()?.trim_end();
    if value.is_empty() {
        return None;
    }

    Some(value.to_string())
}

fn git_user(path: &Path) -> Option<String> {
    let mut user = git_config(path, "user.name")?;
    if let Some(email) = git_config(path, "user.email") {
        user.push_str(&format!(" <{email}>"));
    }

    Some(user)
}

impl Init {
    pub(crate) fn execute(mut self) -> LabelshedResult<()> {
        let root_dir = env::current_dir()?.join(self.path);
        let data_dir = root_dir.join(Labelshed::DATA_DIR);
        let config = root_dir.join(Labelshed::CONFIG);

        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
            log::info!("Initialize new labelshed in {}", root_dir.display());
        } else {
            log::info!(
                "Re-Initialize existing labelshed in {}",
                root_dir.display()
            );
        }

        if !data_dir.exists() {
            fs::create_dir_all(&data_dir)?;
        }

        if config.exists() && !self.force {
            log::warn!(
                "Keep existing config {}; use `--force` to overwrite it.",
                config.display()
            );
            return Ok(());
        }

        if self.authors.is_empty() {
            if let Some(author) = git_user(&root_dir) {
                log::info!("Set authors to Git identity '{author}'.");
                self.authors.push(author)
            }
        }

        let mut labels: Vec<String> = vec![];
        for label in self.labels.into_iter() {
            if label.trim().is_empty() {
                bail!("labels must not be empty.");
            }

            if !labels.contains(&label) {
                labels.push(label);
            }
        }

        let mut config = Config::create(config)?;
        config.metadata.description = self.description;
        config.metadata.authors = self.authors;
        config.metadata.version = self.version;
        config.metadata.name = self.name.unwrap_or(
            root_dir
                .file_name()
                .and_then(OsStr::to_str)
                .unwrap_or_default()
                .to_string(),
        );
        config.project.id = self.id;
        config.project.category = self.category;
        config.project.labels = labels;

        config.save()?;
        Ok(())
    }
}
