use std::fs::File;
use std::io::{stdout, Write};
use std::path::PathBuf;

use clap::Parser;
use interchange::{export, ExportRequest, Format};

use crate::prelude::*;

/// Export the annotations of a user.
#[derive(Debug, Parser)]
pub(crate) struct Export {
    /// The output format (json, jsonl, csv or conllu).
    #[arg(short, long, default_value = "jsonl")]
    format: Format,

    /// Skip documents the user hasn't labelled yet.
    #[arg(short, long)]
    annotated_only: bool,

    /// The name of the user whose annotations are exported.
    #[arg(short, long, env = "LABELSHED_USER")]
    user: String,

    /// Write output to `filename` instead of `stdout`.
    #[arg(short, long, value_name = "filename")]
    output: Option<PathBuf>,
}

impl Export {
    pub(crate) fn execute(self) -> LabelshedResult<()> {
        let labelshed = Labelshed::discover()?;
        let config = labelshed.config()?;
        let store = labelshed.store(&config)?;

        let request = ExportRequest {
            format: self.format,
            annotated_only: self.annotated_only,
            user: config.user_id(&self.user)?,
        };

        let payload = export(&store, config.project.id, &request)?;
        let mut wtr: Box<dyn Write> = match self.output {
            Some(path) => Box::new(File::create(path)?),
            None => Box::new(stdout().lock()),
        };

        wtr.write_all(&payload.content)?;
        wtr.flush()?;
        Ok(())
    }
}
