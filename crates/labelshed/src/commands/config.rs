use clap::Parser;
use interchange::{ColumnMode, ProjectCategory};

use crate::config::Convert;
use crate::prelude::*;

const OPTIONS: [&str; 2] = ["convert.json-columns", "project.category"];

/// Get and set labelshed config options.
#[derive(Debug, Parser)]
pub(crate) struct Config {
    /// Get the value for the given key.
    #[arg(long, conflicts_with_all = ["value", "unset", "set"])]
    get: bool,

    /// Remove the key from the config.
    #[arg(long, conflicts_with_all = ["value", "get", "set"])]
    unset: bool,

    /// Set the value for the given key.
    #[arg(long, requires = "value", conflicts_with_all = ["get", "unset"])]
    set: bool,

    /// The name of the config option.
    name: String,

    /// The (new) value of the config option.
    #[arg(conflicts_with_all = ["get", "unset"])]
    value: Option<String>,
}

#[inline]
fn print_option<T>(key: &str, value: Option<T>)
where
    T: ToString,
{
    println!(
        "{key} = {}",
        match value {
            Some(value) => value.to_string(),
            None => "None".to_string(),
        }
    );
}

fn parse_column_mode(value: &str) -> LabelshedResult<ColumnMode> {
    match value {
        "pad" => Ok(ColumnMode::Pad),
        "truncate" => Ok(ColumnMode::Truncate),
        _ => bail!("invalid value `{value}`"),
    }
}

impl Config {
    pub(crate) fn execute(self) -> LabelshedResult<()> {
        let labelshed = Labelshed::discover()?;
        let mut config = labelshed.config()?;

        let name = self.name.as_str();
        if !OPTIONS.contains(&name) {
            bail!("unknown config option `{name}`");
        }

        if let Some(value) = self.value {
            match name {
                "convert.json-columns" => {
                    let mode = parse_column_mode(&value)?;
                    config
                        .convert
                        .get_or_insert_with(Convert::default)
                        .json_columns = Some(mode);
                }
                "project.category" => {
                    let category = value.parse::<ProjectCategory>()?;
                    if category != config.project.category
                        && labelshed.store(&config)?.has_annotations()
                    {
                        bail!(
                            "can't change the category of a labelshed \
                             with annotations"
                        );
                    }

                    config.project.category = category;
                }
                _ => unreachable!(),
            }

            config.save()?;
        } else if self.unset {
            match name {
                "convert.json-columns" => config.convert = None,
                "project.category" => {
                    bail!("config option `{name}` can't be unset")
                }
                _ => unreachable!(),
            }

            config.save()?;
        } else if self.get || !self.set {
            match name {
                "convert.json-columns" => print_option(
                    name,
                    config
                        .convert
                        .and_then(|convert| convert.json_columns)
                        .map(|mode| match mode {
                            ColumnMode::Pad => "pad",
                            ColumnMode::Truncate => "truncate",
                        }),
                ),
                "project.category" => {
                    print_option(name, Some(config.project.category))
                }
                _ => unreachable!(),
            }
        } else {
            unreachable!()
        }

        Ok(())
    }
}
