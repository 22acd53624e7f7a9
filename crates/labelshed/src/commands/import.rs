use std::path::PathBuf;

use clap::Parser;
use interchange::{Converter, Format, ReadOptions, Upload};

use crate::prelude::*;

/// Import documents into the labelshed.
///
/// Every record of the given files becomes a new document. Files or
/// lines that can't be imported are reported next to the created
/// documents; they don't abort the import.
#[derive(Debug, Parser)]
pub(crate) struct Import {
    /// The format of the input files (txt, json, jsonl, csv or
    /// conllu).
    #[arg(short, long, default_value = "jsonl")]
    format: Format,

    /// The key (or column) holding the text of a record. This option
    /// is ignored for txt and conllu files.
    #[arg(short, long)]
    key: Option<String>,

    /// The files to import.
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

impl Import {
    pub(crate) fn execute(self) -> LabelshedResult<()> {
        let labelshed = Labelshed::discover()?;
        let config = labelshed.config()?;
        let mut store = labelshed.store(&config)?;

        let uploads = self
            .files
            .iter()
            .map(Upload::from_path)
            .collect::<Result<Vec<_>, _>>()?;

        let report = Converter::new()
            .read_options(ReadOptions {
                columns: config.json_columns(),
            })
            .import(
                &mut store,
                config.project.id,
                &uploads,
                self.format,
                self.key.as_deref(),
            )?;

        println!("{}", serde_json::to_string_pretty(&report)?);
        Ok(())
    }
}
