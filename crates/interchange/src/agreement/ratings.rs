//! Per-user rating sequences.

use crate::align;
use crate::error::{bail, InterchangeResult};
use crate::store::{Document, ProjectCategory, ProjectId, Store, UserId};
use crate::token::SENTINEL;

/// Turns the stored annotations of a project into rating sequences.
pub(crate) trait Strategy {
    /// Returns one rating sequence per user, in the order of `users`.
    /// Ratings are aligned positionally across users.
    fn ratings(
        &self,
        store: &dyn Store,
        documents: &[Document],
        users: &[UserId],
    ) -> InterchangeResult<Vec<Vec<String>>>;

    /// Returns the categories a rating can take.
    fn categories(
        &self,
        store: &dyn Store,
        project: ProjectId,
    ) -> InterchangeResult<Vec<String>>;
}

/// One rating per document: the single label the user assigned to it.
pub(crate) struct Classification;

/// One rating per token: the tag of the token after aligning the
/// user's spans with the document text.
pub(crate) struct Sequential;

pub(crate) fn strategy(category: ProjectCategory) -> Box<dyn Strategy> {
    match category {
        ProjectCategory::Classification => Box::new(Classification),
        ProjectCategory::Sequential => Box::new(Sequential),
    }
}

fn label_names(
    store: &dyn Store,
    project: ProjectId,
) -> InterchangeResult<Vec<String>> {
    Ok(store
        .labels(project)?
        .into_iter()
        .map(|label| label.name)
        .collect())
}

impl Strategy for Classification {
    fn ratings(
        &self,
        store: &dyn Store,
        documents: &[Document],
        users: &[UserId],
    ) -> InterchangeResult<Vec<Vec<String>>> {
        let mut ratings = vec![Vec::with_capacity(documents.len()); users.len()];

        for document in documents.iter() {
            for (user, sequence) in users.iter().zip(ratings.iter_mut()) {
                let mut annotations = store.annotations(document.id, *user)?;
                if annotations.len() != 1 {
                    bail!(
                        MissingAnnotation,
                        "user {user} has {} annotation(s) on document {}, \
                        expected exactly one",
                        annotations.len(),
                        document.id
                    );
                }

                sequence.push(annotations.remove(0).label);
            }
        }

        Ok(ratings)
    }

    fn categories(
        &self,
        store: &dyn Store,
        project: ProjectId,
    ) -> InterchangeResult<Vec<String>> {
        label_names(store, project)
    }
}

impl Strategy for Sequential {
    fn ratings(
        &self,
        store: &dyn Store,
        documents: &[Document],
        users: &[UserId],
    ) -> InterchangeResult<Vec<Vec<String>>> {
        let mut ratings = vec![vec![]; users.len()];

        for (user, sequence) in users.iter().zip(ratings.iter_mut()) {
            for document in documents.iter() {
                let spans: Vec<_> = store
                    .annotations(document.id, *user)?
                    .iter()
                    .filter_map(|annotation| annotation.to_span())
                    .collect();

                sequence.extend(align::tags(&document.text, &spans)?);
            }
        }

        Ok(ratings)
    }

    fn categories(
        &self,
        store: &dyn Store,
        project: ProjectId,
    ) -> InterchangeResult<Vec<String>> {
        let mut categories = label_names(store, project)?;
        if !categories.is_empty() && !categories.iter().any(|c| c == SENTINEL)
        {
            categories.push(SENTINEL.into());
        }

        Ok(categories)
    }
}
