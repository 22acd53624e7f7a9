use serde::Serialize;

use crate::error::InterchangeResult;
use crate::store::{ProjectId, Store, UserId};

/// Annotation progress of one user on one project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

/// Counts the documents of `project` the user has annotated at least
/// once.
pub fn progress(
    store: &dyn Store,
    project: ProjectId,
    user: UserId,
) -> InterchangeResult<Progress> {
    store.project(project)?;

    let documents = store.documents(project)?;
    let mut completed = 0;

    for document in documents.iter() {
        if !store.annotations(document.id, user)?.is_empty() {
            completed += 1;
        }
    }

    Ok(Progress {
        total: documents.len(),
        completed,
        pending: documents.len() - completed,
    })
}
