use std::collections::BTreeSet;
use std::fmt::Write;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use interchange::store::{DocumentId, ProjectId, UserId};
use interchange::{
    spans_to_tokens, Annotation, Document, InterchangeError,
    InterchangeResult, Label, Project, ProjectCategory, Span, Store,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::Config;
use crate::error::{bail, LabelshedError, LabelshedResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DocumentRow {
    id: DocumentId,
    hash: String,
    text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct AnnotationRow {
    pub(crate) document: DocumentId,
    pub(crate) user: UserId,
    pub(crate) label: String,
    pub(crate) start: Option<usize>,
    pub(crate) end: Option<usize>,
}

impl From<&AnnotationRow> for Annotation {
    fn from(row: &AnnotationRow) -> Self {
        Annotation {
            label: row.label.clone(),
            start: row.start,
            end: row.end,
        }
    }
}

/// Returns the first eight hex digits of the SHA256 digest of `text`.
fn short_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());

    let hash = hasher.finalize();
    hash.iter().take(4).fold(String::new(), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> csv::Result<Vec<T>> {
    if !path.is_file() {
        return Ok(vec![]);
    }

    csv::Reader::from_path(path)?.deserialize().collect()
}

fn append_rows<T: Serialize>(path: &Path, rows: &[T]) -> csv::Result<()> {
    if rows.is_empty() {
        return Ok(());
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(!path.is_file())
        .from_writer(
            OpenOptions::new().create(true).append(true).open(path)?,
        );

    for row in rows.iter() {
        writer.serialize(row)?;
    }

    writer.flush()?;
    Ok(())
}

/// The documents and annotations of a labelshed, persisted as two CSV
/// files in the data directory.
#[derive(Debug)]
pub(crate) struct FileStore {
    data_dir: PathBuf,
    project: Project,
    labels: Vec<Label>,
    users: BTreeSet<UserId>,
    documents: Vec<DocumentRow>,
    annotations: Vec<AnnotationRow>,
}

impl FileStore {
    pub(crate) const DOCUMENTS: &'static str = "documents.csv";
    pub(crate) const ANNOTATIONS: &'static str = "annotations.csv";

    pub(crate) fn open<P>(
        data_dir: P,
        config: &Config,
    ) -> LabelshedResult<Self>
    where
        P: AsRef<Path>,
    {
        let data_dir = data_dir.as_ref().to_path_buf();
        let documents = read_rows(&data_dir.join(Self::DOCUMENTS))?;
        let annotations = read_rows(&data_dir.join(Self::ANNOTATIONS))?;

        log::debug!(
            "loaded {} document(s) and {} annotation(s) from {}",
            documents.len(),
            annotations.len(),
            data_dir.display()
        );

        Ok(Self {
            data_dir,
            project: Project {
                id: config.project.id,
                category: config.project.category,
            },
            labels: config
                .project
                .labels
                .iter()
                .map(|name| Label { name: name.clone() })
                .collect(),
            users: config.users.values().map(|user| user.id).collect(),
            documents,
            annotations,
        })
    }

    /// Returns true, if at least one annotation has been recorded.
    #[inline]
    pub(crate) fn has_annotations(&self) -> bool {
        !self.annotations.is_empty()
    }

    fn document(&self, id: DocumentId) -> Option<&DocumentRow> {
        self.documents.iter().find(|row| row.id == id)
    }

    fn rows_of(
        &self,
        document: DocumentId,
        user: UserId,
    ) -> impl Iterator<Item = &AnnotationRow> {
        self.annotations
            .iter()
            .filter(move |row| row.document == document && row.user == user)
    }

    /// Checks and persists a single annotation.
    pub(crate) fn add_annotation(
        &mut self,
        row: AnnotationRow,
    ) -> LabelshedResult<()> {
        let Some(document) = self.document(row.document) else {
            bail!("document {} does not exist.", row.document);
        };

        if !self.users.contains(&row.user) {
            bail!("user {} does not exist.", row.user);
        }

        if !self.labels.iter().any(|label| label.name == row.label) {
            bail!("unknown label '{}'.", row.label);
        }

        match (self.project.category, row.start, row.end) {
            (ProjectCategory::Classification, None, None) => {
                if self.rows_of(row.document, row.user).next().is_some() {
                    bail!(
                        "document {} is already labelled by user {}.",
                        row.document,
                        row.user
                    );
                }
            }
            (ProjectCategory::Sequential, Some(start), Some(end)) => {
                let mut spans: Vec<Span> = self
                    .rows_of(row.document, row.user)
                    .filter_map(|row| Annotation::from(row).to_span())
                    .collect();
                spans.push(Span::new(start, end, &row.label));
                spans_to_tokens(&document.text, &spans)?;
            }
            (ProjectCategory::Classification, _, _) => {
                bail!("classification labels don't take offsets.");
            }
            (ProjectCategory::Sequential, _, _) => {
                bail!("sequence labels require a start and an end offset.");
            }
        }

        append_rows(
            &self.data_dir.join(Self::ANNOTATIONS),
            std::slice::from_ref(&row),
        )?;
        self.annotations.push(row);
        Ok(())
    }
}

impl Store for FileStore {
    fn project(&self, id: ProjectId) -> InterchangeResult<Project> {
        if id != self.project.id {
            return Err(InterchangeError::NotFound(format!("project {id}")));
        }

        Ok(self.project.clone())
    }

    fn documents(
        &self,
        project: ProjectId,
    ) -> InterchangeResult<Vec<Document>> {
        if project != self.project.id {
            return Ok(vec![]);
        }

        Ok(self
            .documents
            .iter()
            .map(|row| Document {
                id: row.id,
                text: row.text.clone(),
            })
            .collect())
    }

    fn annotations(
        &self,
        document: DocumentId,
        user: UserId,
    ) -> InterchangeResult<Vec<Annotation>> {
        Ok(self.rows_of(document, user).map(Annotation::from).collect())
    }

    fn labels(&self, project: ProjectId) -> InterchangeResult<Vec<Label>> {
        self.project(project)?;
        Ok(self.labels.clone())
    }

    fn count_users(&self, ids: &[UserId]) -> InterchangeResult<usize> {
        let ids: BTreeSet<&UserId> = ids.iter().collect();
        Ok(ids.into_iter().filter(|id| self.users.contains(*id)).count())
    }

    fn bulk_create_documents(
        &mut self,
        project: ProjectId,
        texts: Vec<String>,
    ) -> InterchangeResult<Vec<Document>> {
        self.project(project)?;

        let next = self.documents.iter().map(|row| row.id).max();
        let next = next.unwrap_or_default() + 1;

        let rows: Vec<DocumentRow> = texts
            .into_iter()
            .enumerate()
            .map(|(idx, text)| DocumentRow {
                id: next + idx as DocumentId,
                hash: short_hash(&text),
                text,
            })
            .collect();

        append_rows(&self.data_dir.join(Self::DOCUMENTS), &rows)?;

        let documents = rows
            .iter()
            .map(|row| Document {
                id: row.id,
                text: row.text.clone(),
            })
            .collect();

        self.documents.extend(rows);
        Ok(documents)
    }
}
