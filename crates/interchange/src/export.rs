//! Export of stored annotations.

use serde_json::{json, Value};

use crate::align;
use crate::codec::{self, Record, WriteOptions};
use crate::convert::Payload;
use crate::error::{bail, InterchangeResult};
use crate::format::Format;
use crate::store::{Annotation, ProjectCategory, ProjectId, Store, UserId};
use crate::token::CharText;

#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub format: Format,
    /// Skip documents the user hasn't annotated.
    pub annotated_only: bool,
    /// The user whose annotations are exported.
    pub user: UserId,
}

fn classification_label(annotations: &[Annotation]) -> Value {
    annotations
        .first()
        .map(|annotation| json!(annotation.label))
        .unwrap_or(Value::Null)
}

fn sequential_label(
    text: &str,
    annotations: &[Annotation],
) -> InterchangeResult<Value> {
    let mut spans = vec![];
    for annotation in annotations.iter() {
        let Some(span) = annotation.to_span() else {
            bail!(
                MalformedInput,
                "annotation '{}' has no offsets",
                annotation.label
            );
        };

        spans.push(span);
    }

    align::validate(&mut spans, CharText::new(text).len())?;

    Ok(Value::Array(
        spans
            .into_iter()
            .map(|span| json!([span.start, span.end, span.label]))
            .collect(),
    ))
}

/// Builds the `{text, label}` records of a project as seen by the
/// requesting user.
pub fn records(
    store: &dyn Store,
    project: ProjectId,
    request: &ExportRequest,
) -> InterchangeResult<Vec<Record>> {
    let category = store.project(project)?.category;
    let mut records = vec![];

    for document in store.documents(project)? {
        let annotations = store.annotations(document.id, request.user)?;
        if request.annotated_only && annotations.is_empty() {
            continue;
        }

        let label = match category {
            ProjectCategory::Classification => {
                classification_label(&annotations)
            }
            ProjectCategory::Sequential => {
                sequential_label(&document.text, &annotations)
                    .map_err(|e| e.at_document(document.id))?
            }
        };

        records.push(json!({ "text": document.text, "label": label }));
    }

    Ok(records)
}

/// Exports the annotations of `request.user` on `project`.
///
/// The writer is resolved before any data is fetched. Sequence
/// labelling projects are written in their token-per-row shape where
/// the format has one.
pub fn export(
    store: &dyn Store,
    project: ProjectId,
    request: &ExportRequest,
) -> InterchangeResult<Payload> {
    let writer = codec::writer(request.format)?;
    let category = store.project(project)?.category;
    let records = records(store, project, request)?;

    let options = WriteOptions {
        sequential: category == ProjectCategory::Sequential,
    };

    let content = writer(&records, &options)?;
    log::info!(
        "exported {} document(s) of project {project} as {}",
        records.len(),
        request.format
    );

    Ok(Payload {
        content,
        content_type: request.format.content_type(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InterchangeError;
    use crate::store::MemoryStore;

    type TestResult = anyhow::Result<()>;

    fn request(format: Format, annotated_only: bool) -> ExportRequest {
        ExportRequest {
            format,
            annotated_only,
            user: 7,
        }
    }

    #[test]
    fn export_classification() -> TestResult {
        let mut store = MemoryStore::new();
        store.add_project(1, ProjectCategory::Classification, ["pos"]);
        let first = store.add_document(1, "great");
        store.add_document(1, "meh");
        store.annotate(first, 7, Annotation::document("pos"));

        let payload = export(&store, 1, &request(Format::Jsonl, false))?;
        assert_eq!(
            String::from_utf8(payload.content)?,
            "{\"text\":\"great\",\"label\":\"pos\"}\n\
             {\"text\":\"meh\",\"label\":null}"
        );

        let payload = export(&store, 1, &request(Format::Json, true))?;
        let records: Value = serde_json::from_slice(&payload.content)?;
        assert_eq!(records, json!([{"text": "great", "label": "pos"}]));
        assert_eq!(payload.content_type, "application/json");
        Ok(())
    }

    #[test]
    fn export_sequential() -> TestResult {
        let mut store = MemoryStore::new();
        store.add_project(1, ProjectCategory::Sequential, ["ANIMAL"]);
        let doc = store.add_document(1, "The cat sat on the mat");
        store
            .annotate(doc, 7, Annotation::span(19, 22, "ANIMAL"))
            .annotate(doc, 7, Annotation::span(4, 7, "ANIMAL"));

        let found = records(&store, 1, &request(Format::Csv, false))?;
        assert_eq!(
            found,
            [json!({
                "text": "The cat sat on the mat",
                "label": [[4, 7, "ANIMAL"], [19, 22, "ANIMAL"]]
            })]
        );

        let payload = export(&store, 1, &request(Format::Csv, false))?;
        let content = String::from_utf8(payload.content)?;
        assert!(content.starts_with("Sentence,Word,Label\r\n"));
        assert!(content.contains(",mat,ANIMAL\r\n"));
        Ok(())
    }

    #[test]
    fn export_errors() {
        let mut store = MemoryStore::new();
        store.add_project(1, ProjectCategory::Classification, ["pos"]);
        store.add_document(1, "text");

        assert!(matches!(
            export(&store, 1, &request(Format::Txt, false)),
            Err(InterchangeError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            export(&store, 2, &request(Format::Json, false)),
            Err(InterchangeError::NotFound(_))
        ));
        assert!(matches!(
            export(&store, 1, &request(Format::Json, true)),
            Err(InterchangeError::EmptyResult(_))
        ));
    }

    #[test]
    fn export_rejects_invalid_spans() {
        let mut store = MemoryStore::new();
        store.add_project(1, ProjectCategory::Sequential, ["X"]);
        let doc = store.add_document(1, "abc");
        store.annotate(doc, 7, Annotation::span(0, 99, "X"));

        for format in [Format::Json, Format::Jsonl] {
            match export(&store, 1, &request(format, false)) {
                Err(InterchangeError::SpanOutOfBounds(message)) => {
                    assert!(message.starts_with("Document 1: "))
                }
                other => panic!("unexpected result {other:?}"),
            }
        }

        let doc = store.add_document(1, "Ada met Bob");
        store
            .annotate(doc, 8, Annotation::span(0, 5, "X"))
            .annotate(doc, 8, Annotation::span(4, 7, "X"));

        assert!(matches!(
            records(
                &store,
                1,
                &ExportRequest {
                    format: Format::Jsonl,
                    annotated_only: true,
                    user: 8,
                }
            ),
            Err(InterchangeError::OverlappingSpans(_))
        ));
    }
}
