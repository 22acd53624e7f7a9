//! The storage collaborator.
//!
//! The interchange core never owns persisted data. Everything it needs
//! about projects, documents, users and annotations is fetched through
//! the [Store] trait; [MemoryStore] is a complete in-memory
//! implementation.

use std::fmt::{self, Display};
use std::str::FromStr;

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

use crate::align::Span;
use crate::error::{bail, InterchangeError, InterchangeResult};

pub type ProjectId = u64;
pub type DocumentId = u64;
pub type UserId = u64;

/// Decides how annotations of a project are interpreted.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum ProjectCategory {
    /// One label per document.
    #[default]
    #[serde(rename = "text classification")]
    Classification,
    /// Labelled character spans within a document's text.
    #[serde(rename = "sequential labelling")]
    Sequential,
}

impl Display for ProjectCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classification => write!(f, "text classification"),
            Self::Sequential => write!(f, "sequential labelling"),
        }
    }
}

impl FromStr for ProjectCategory {
    type Err = InterchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text classification" | "classification" => {
                Ok(Self::Classification)
            }
            "sequential labelling" | "sequential" => Ok(Self::Sequential),
            _ => bail!(InvalidRequest, "invalid project category '{s}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: ProjectId,
    pub category: ProjectCategory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub id: DocumentId,
    pub text: String,
}

/// A label assigned by one user to one document. Classification
/// annotations carry no offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub label: String,
    pub start: Option<usize>,
    pub end: Option<usize>,
}

impl Annotation {
    pub fn document<L: Into<String>>(label: L) -> Self {
        Self {
            label: label.into(),
            start: None,
            end: None,
        }
    }

    pub fn span<L: Into<String>>(start: usize, end: usize, label: L) -> Self {
        Self {
            label: label.into(),
            start: Some(start),
            end: Some(end),
        }
    }

    /// Returns the labelled span, if the annotation has offsets.
    pub fn to_span(&self) -> Option<Span> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => {
                Some(Span::new(start, end, &self.label))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub name: String,
}

/// Read and write access to persisted annotation data.
pub trait Store {
    /// Looks up a project; fails with [InterchangeError::NotFound].
    fn project(&self, id: ProjectId) -> InterchangeResult<Project>;

    /// Returns the documents of a project in a stable order.
    fn documents(&self, project: ProjectId)
        -> InterchangeResult<Vec<Document>>;

    /// Returns the annotations of `user` on `document`.
    fn annotations(
        &self,
        document: DocumentId,
        user: UserId,
    ) -> InterchangeResult<Vec<Annotation>>;

    /// Returns the label vocabulary of a project.
    fn labels(&self, project: ProjectId) -> InterchangeResult<Vec<Label>>;

    /// Returns the number of distinct existing users among `ids`.
    fn count_users(&self, ids: &[UserId]) -> InterchangeResult<usize>;

    /// Persists one document per text and returns them.
    fn bulk_create_documents(
        &mut self,
        project: ProjectId,
        texts: Vec<String>,
    ) -> InterchangeResult<Vec<Document>>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    projects: HashMap<ProjectId, ProjectCategory>,
    labels: HashMap<ProjectId, Vec<Label>>,
    users: HashSet<UserId>,
    documents: Vec<(ProjectId, Document)>,
    annotations: HashMap<(DocumentId, UserId), Vec<Annotation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_project<I, L>(
        &mut self,
        id: ProjectId,
        category: ProjectCategory,
        labels: I,
    ) -> &mut Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        self.projects.insert(id, category);
        self.labels.insert(
            id,
            labels
                .into_iter()
                .map(|name| Label { name: name.into() })
                .collect(),
        );
        self
    }

    pub fn add_user(&mut self, id: UserId) -> &mut Self {
        self.users.insert(id);
        self
    }

    /// Adds a document with the next free id and returns the id.
    pub fn add_document<T: Into<String>>(
        &mut self,
        project: ProjectId,
        text: T,
    ) -> DocumentId {
        let id = self.documents.len() as DocumentId + 1;
        self.documents.push((
            project,
            Document {
                id,
                text: text.into(),
            },
        ));
        id
    }

    pub fn annotate(
        &mut self,
        document: DocumentId,
        user: UserId,
        annotation: Annotation,
    ) -> &mut Self {
        self.annotations
            .entry((document, user))
            .or_default()
            .push(annotation);
        self
    }
}

impl Store for MemoryStore {
    fn project(&self, id: ProjectId) -> InterchangeResult<Project> {
        match self.projects.get(&id) {
            Some(category) => Ok(Project {
                id,
                category: *category,
            }),
            None => bail!(NotFound, "project {id}"),
        }
    }

    fn documents(
        &self,
        project: ProjectId,
    ) -> InterchangeResult<Vec<Document>> {
        Ok(self
            .documents
            .iter()
            .filter(|(id, _)| *id == project)
            .map(|(_, document)| document.clone())
            .collect())
    }

    fn annotations(
        &self,
        document: DocumentId,
        user: UserId,
    ) -> InterchangeResult<Vec<Annotation>> {
        Ok(self
            .annotations
            .get(&(document, user))
            .cloned()
            .unwrap_or_default())
    }

    fn labels(&self, project: ProjectId) -> InterchangeResult<Vec<Label>> {
        Ok(self.labels.get(&project).cloned().unwrap_or_default())
    }

    fn count_users(&self, ids: &[UserId]) -> InterchangeResult<usize> {
        let ids: HashSet<&UserId> = ids.iter().collect();
        Ok(ids.into_iter().filter(|id| self.users.contains(*id)).count())
    }

    fn bulk_create_documents(
        &mut self,
        project: ProjectId,
        texts: Vec<String>,
    ) -> InterchangeResult<Vec<Document>> {
        self.project(project)?;

        Ok(texts
            .into_iter()
            .map(|text| {
                let id = self.add_document(project, text.clone());
                Document { id, text }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = anyhow::Result<()>;

    #[test]
    fn project_category_from_str() -> TestResult {
        assert_eq!(
            "sequential labelling".parse::<ProjectCategory>()?,
            ProjectCategory::Sequential
        );
        assert_eq!(
            "Classification".parse::<ProjectCategory>()?,
            ProjectCategory::Classification
        );
        assert!("ranking".parse::<ProjectCategory>().is_err());

        assert_eq!(
            ProjectCategory::Sequential.to_string(),
            "sequential labelling"
        );
        Ok(())
    }

    #[test]
    fn memory_store() -> TestResult {
        let mut store = MemoryStore::new();
        store
            .add_project(1, ProjectCategory::Sequential, ["PER", "LOC"])
            .add_user(10)
            .add_user(11);

        assert!(matches!(
            store.project(2),
            Err(InterchangeError::NotFound(_))
        ));

        let docs = store.bulk_create_documents(1, vec!["a".into(), "b".into()])?;
        assert_eq!(docs.iter().map(|d| d.id).collect::<Vec<_>>(), [1, 2]);
        assert_eq!(store.documents(1)?, docs);
        assert!(store.documents(2)?.is_empty());

        store.annotate(1, 10, Annotation::span(0, 1, "PER"));
        assert_eq!(
            store.annotations(1, 10)?[0].to_span(),
            Some(Span::new(0, 1, "PER"))
        );
        assert!(store.annotations(1, 11)?.is_empty());

        assert_eq!(store.count_users(&[10, 10, 11, 12])?, 2);
        assert_eq!(store.labels(1)?.len(), 2);
        assert!(store.bulk_create_documents(5, vec![]).is_err());
        Ok(())
    }
}
