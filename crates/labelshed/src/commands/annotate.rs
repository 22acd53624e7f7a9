use clap::Parser;
use interchange::store::DocumentId;

use crate::prelude::*;
use crate::store::AnnotationRow;

/// Label a document of the labelshed.
///
/// Documents of text classification projects carry exactly one label
/// per user; sequence labelling projects take labelled character spans
/// given by `--start` and `--end`.
#[derive(Debug, Parser)]
pub(crate) struct Annotate {
    /// The name of the annotating user.
    #[arg(short, long, env = "LABELSHED_USER")]
    user: String,

    /// The first character (offset) of the span.
    #[arg(long, requires = "end")]
    start: Option<usize>,

    /// The character offset after the last character of the span.
    #[arg(long, requires = "start")]
    end: Option<usize>,

    /// The id of the document.
    document: DocumentId,

    /// The label, which must be part of the label vocabulary.
    label: String,
}

impl Annotate {
    pub(crate) fn execute(self) -> LabelshedResult<()> {
        let labelshed = Labelshed::discover()?;
        let config = labelshed.config()?;
        let mut store = labelshed.store(&config)?;

        store.add_annotation(AnnotationRow {
            document: self.document,
            user: config.user_id(&self.user)?,
            label: self.label,
            start: self.start,
            end: self.end,
        })?;

        log::info!("{} labelled document {}", self.user, self.document);
        Ok(())
    }
}
