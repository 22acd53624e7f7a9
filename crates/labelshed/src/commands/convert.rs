use std::fs::File;
use std::io::{stdout, Write};
use std::path::PathBuf;

use clap::Parser;
use flate2::Compression;
use interchange::{ColumnMode, Converter, Format, ReadOptions, Upload};

use crate::prelude::*;

/// Convert files between interchange formats.
///
/// A single converted file is written as it is; multiple files (or
/// multiple target formats) are packed into a tar.gz archive. Files
/// that can't be converted are reported on the standard error stream.
/// This command doesn't require a labelshed, but honours its config if
/// there is one.
#[derive(Debug, Parser)]
pub(crate) struct Convert {
    /// The format of the input files.
    #[arg(long, default_value = "jsonl")]
    from: Format,

    /// The target format(s).
    #[arg(long, required = true)]
    to: Vec<Format>,

    /// Narrow every record to the text stored under this key (or
    /// column).
    #[arg(short, long)]
    key: Option<String>,

    /// Stop at the end of the shortest column when reading
    /// column-oriented JSON, instead of padding short columns.
    #[arg(long)]
    truncate_columns: bool,

    #[arg(long, conflicts_with = "best")]
    fast: bool,

    #[arg(long, conflicts_with = "fast")]
    best: bool,

    /// Write output to `filename` instead of `stdout`.
    #[arg(short, long, value_name = "filename")]
    output: Option<PathBuf>,

    /// The files to convert.
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

impl Convert {
    fn column_mode(&self) -> ColumnMode {
        if self.truncate_columns {
            return ColumnMode::Truncate;
        }

        Labelshed::discover()
            .and_then(|labelshed| labelshed.config())
            .map(|config| config.json_columns())
            .unwrap_or_default()
    }

    pub(crate) fn execute(self) -> LabelshedResult<()> {
        let level = if self.fast {
            Compression::fast()
        } else if self.best {
            Compression::best()
        } else {
            Compression::default()
        };

        let uploads = self
            .files
            .iter()
            .map(Upload::from_path)
            .collect::<Result<Vec<_>, _>>()?;

        let converter = Converter::new().read_options(ReadOptions {
            columns: self.column_mode(),
        });

        let conversion = converter.convert(
            &uploads,
            self.from,
            &self.to,
            self.key.as_deref(),
        )?;

        for error in conversion.errors.iter() {
            eprintln!("{error}");
        }

        let content = match conversion.entries.as_slice() {
            [] => bail!("none of the files could be converted"),
            [entry] => entry.content.clone(),
            _ => conversion.archive(level)?.content,
        };

        let mut wtr: Box<dyn Write> = match self.output {
            Some(path) => Box::new(File::create(path)?),
            None => Box::new(stdout().lock()),
        };

        wtr.write_all(&content)?;
        wtr.flush()?;
        Ok(())
    }
}
