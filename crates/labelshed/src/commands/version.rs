use clap::Parser;

use crate::prelude::*;

/// Get or set the version of the labelshed.
#[derive(Debug, Parser)]
pub(crate) struct Version {
    /// Whether to overwrite the current version or not.
    #[arg(short, long)]
    force: bool,

    /// The new version of the labelshed. Unless the `--force` option
    /// is set, the new version must be greater than the current one.
    version: Option<semver::Version>,
}

impl Version {
    pub(crate) fn execute(self) -> LabelshedResult<()> {
        let labelshed = Labelshed::discover()?;
        let mut config = labelshed.config()?;

        let Some(version) = self.version else {
            println!("{}", config.metadata.version);
            return Ok(());
        };

        if !self.force && version <= config.metadata.version {
            bail!(
                "{version} must be greater than {}",
                config.metadata.version
            );
        }

        config.metadata.version = version;
        config.save()?;
        Ok(())
    }
}
