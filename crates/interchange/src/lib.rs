//! # Interchange
//!
//! This crate converts annotation datasets between the interchange
//! formats plain text, JSON, JSON-Lines, CSV and CoNLL-U, and computes
//! inter-annotator agreement (Cohen's and Fleiss' Kappa) over stored
//! annotations.
//!
//! The crate doesn't own any persisted data. Projects, documents,
//! labels and annotations are fetched through the [Store] trait, which
//! is implemented by the caller ([MemoryStore] is an in-memory
//! implementation).
//!
//! ## Sequence labelling
//!
//! Labels of sequence-labelling projects are character spans over a
//! document's text. Exports and agreement ratings need a per-token
//! view instead; [spans_to_tokens] produces one token per span and
//! splits the remaining text on whitespace into untagged tokens,
//! whose tag is [SENTINEL].
//!
//! ## Example
//!
//! ```rust
//! use interchange::{Converter, Format, Upload};
//!
//! let upload = Upload::new("data.txt", b"first\nsecond\n".to_vec());
//! let payload = Converter::new()
//!     .convert_one(&upload, Format::Txt, Format::Jsonl)
//!     .unwrap();
//!
//! assert_eq!(
//!     payload.content,
//!     b"{\"text\":\"first\"}\n{\"text\":\"second\"}"
//! );
//! ```

pub mod agreement;
pub mod align;
pub mod archive;
pub mod codec;
pub mod convert;
pub mod error;
pub mod export;
pub mod format;
pub mod progress;
pub mod store;
pub mod token;

pub use agreement::{agreement, AgreementRequest, Method, Report};
pub use align::{spans_to_tokens, tokens_to_spans, Span};
pub use codec::{ColumnMode, Decoded, ReadOptions, Record, WriteOptions};
pub use convert::{
    Conversion, Converter, Entry, ImportReport, Payload, Upload,
};
pub use error::{FileError, InterchangeError, InterchangeResult, LineError};
pub use export::{export, ExportRequest};
pub use format::Format;
pub use progress::{progress, Progress};
pub use store::{
    Annotation, Document, Label, MemoryStore, Project, ProjectCategory,
    Store,
};
pub use token::{Token, SENTINEL};
