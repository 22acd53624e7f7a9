//! Batch conversion and import of uploaded files.
//!
//! A batch never aborts because of a single broken file. Every
//! per-file or per-line problem is recorded as a [FileError] next to
//! whatever could be converted; only request-level problems (an
//! unsupported format) fail the whole call, and they do so before any
//! file is read.

use std::fs;
use std::path::Path;

use flate2::Compression;
use hashbrown::HashSet;
use serde::Serialize;
use serde_json::{json, Value};

use crate::archive;
use crate::codec::{self, ReadFn, ReadOptions, Record, WriteOptions};
use crate::error::{bail, FileError, InterchangeResult, LineError};
use crate::format::Format;
use crate::store::{Document, ProjectId, Store};

/// The key holding the importable text of a record.
pub const DEFAULT_KEY: &str = "text";

/// A named input file.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub content: Vec<u8>,
}

impl Upload {
    pub fn new<N: Into<String>>(name: N, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content,
        }
    }

    /// Reads an upload from disk; the file name becomes the name.
    pub fn from_path<P: AsRef<Path>>(path: P) -> InterchangeResult<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self::new(name, fs::read(path)?))
    }

    /// Returns the name without its last extension.
    pub fn stem(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.name,
        }
    }
}

/// One converted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub format: Format,
    pub content: Vec<u8>,
}

impl Entry {
    pub fn new<N: Into<String>>(
        name: N,
        format: Format,
        content: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            format,
            content,
        }
    }
}

/// Bytes together with their MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub content: Vec<u8>,
    pub content_type: &'static str,
}

/// The outcome of a batch conversion.
#[derive(Debug, Default)]
pub struct Conversion {
    pub entries: Vec<Entry>,
    pub errors: Vec<FileError>,
}

impl Conversion {
    /// Packs all entries into a tar.gz archive.
    pub fn archive(&self, level: Compression) -> InterchangeResult<Payload> {
        Ok(Payload {
            content: archive::build(&self.entries, level)?,
            content_type: archive::CONTENT_TYPE,
        })
    }
}

/// The outcome of an import.
#[derive(Debug, Default, Serialize)]
pub struct ImportReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub objects: Vec<Document>,
    pub errors: Vec<FileError>,
}

/// Returns `stem`, or `stem-1`, `stem-2`, ... if `stem` is already
/// taken, and marks the result as taken.
fn unique_stem(taken: &mut HashSet<String>, stem: &str) -> String {
    let mut candidate = stem.to_string();
    let mut n = 0;

    while taken.contains(&candidate) {
        n += 1;
        candidate = format!("{stem}-{n}");
    }

    taken.insert(candidate.clone());
    candidate
}

/// Turns every record into its text under `key`.
///
/// Records without a usable value are rejected with their 1-based
/// position; scalar non-string values are rendered as text.
fn extract(records: Vec<Record>, key: &str) -> (Vec<String>, Vec<LineError>) {
    let mut texts = vec![];
    let mut rejected = vec![];

    for (idx, record) in records.into_iter().enumerate() {
        let line = idx + 1;
        let Value::Object(mut map) = record else {
            rejected.push(LineError::new(
                line,
                format!("Key '{key}' not found"),
            ));
            continue;
        };

        match map.remove(key) {
            Some(Value::String(text)) if !text.trim().is_empty() => {
                texts.push(text)
            }
            Some(value @ (Value::Number(_) | Value::Bool(true))) => {
                texts.push(value.to_string())
            }
            Some(Value::Array(_) | Value::Object(_)) => {
                rejected.push(LineError::new(
                    line,
                    format!("Value of the key '{key}' is not text"),
                ))
            }
            _ => rejected.push(LineError::new(
                line,
                format!("No data found for the key '{key}'"),
            )),
        }
    }

    (texts, rejected)
}

#[derive(Debug, Default, Clone)]
pub struct Converter {
    read_options: ReadOptions,
    write_options: WriteOptions,
}

impl Converter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_options(mut self, options: ReadOptions) -> Self {
        self.read_options = options;
        self
    }

    pub fn write_options(mut self, options: WriteOptions) -> Self {
        self.write_options = options;
        self
    }

    /// Reads one upload and, if requested, narrows every record to
    /// `{"text": record[key]}`. Rejected lines are appended to
    /// `errors`.
    fn decode(
        &self,
        upload: &Upload,
        reader: ReadFn,
        key: Option<&str>,
        errors: &mut Vec<FileError>,
    ) -> InterchangeResult<Vec<Record>> {
        let decoded = reader(&upload.content, &self.read_options)?;
        let mut rejected = decoded.rejected;

        let records = match key {
            Some(key) => {
                let (texts, missing) = extract(decoded.records, key);
                rejected.extend(missing);
                texts
                    .into_iter()
                    .map(|text| json!({ DEFAULT_KEY: text }))
                    .collect()
            }
            None => decoded.records,
        };

        for line_error in rejected {
            log::warn!("{}: {line_error}", upload.name);
            errors.push(FileError::new(&upload.name, line_error));
        }

        if records.is_empty() {
            bail!(EmptyResult, "The file is empty");
        }

        log::debug!("{}: read {} record(s)", upload.name, records.len());
        Ok(records)
    }

    /// Converts every upload from `source` into each of `targets`.
    ///
    /// All codecs are resolved up front. Each (file, target) pair that
    /// succeeds yields an [Entry] named `<stem>.<extension>`; a stem
    /// already used by an earlier upload gets a `-<n>` suffix.
    pub fn convert(
        &self,
        uploads: &[Upload],
        source: Format,
        targets: &[Format],
        key: Option<&str>,
    ) -> InterchangeResult<Conversion> {
        if targets.is_empty() {
            bail!(InvalidRequest, "no target format given");
        }

        let reader = codec::reader(source)?;
        let writers = targets
            .iter()
            .map(|target| codec::writer(*target).map(|w| (*target, w)))
            .collect::<InterchangeResult<Vec<_>>>()?;

        let mut conversion = Conversion::default();
        let mut stems = HashSet::new();

        for upload in uploads.iter() {
            let records = match self.decode(
                upload,
                reader,
                key,
                &mut conversion.errors,
            ) {
                Ok(records) => records,
                Err(e) => {
                    log::warn!("{}: {e}", upload.name);
                    conversion.errors.push(FileError::new(&upload.name, e));
                    continue;
                }
            };

            let stem = unique_stem(&mut stems, upload.stem());
            if stem != upload.stem() {
                log::info!("{}: written as '{stem}'", upload.name);
            }

            for (target, writer) in writers.iter() {
                match writer(&records, &self.write_options) {
                    Ok(content) => conversion.entries.push(Entry::new(
                        format!("{stem}.{}", target.extension()),
                        *target,
                        content,
                    )),
                    Err(e) => {
                        log::warn!("{}: {e}", upload.name);
                        conversion
                            .errors
                            .push(FileError::new(&upload.name, e));
                    }
                }
            }
        }

        log::info!(
            "converted {} file(s) into {} entries with {} error(s)",
            uploads.len(),
            conversion.entries.len(),
            conversion.errors.len()
        );

        Ok(conversion)
    }

    /// Converts a single upload and returns the payload directly.
    ///
    /// Unlike [Converter::convert] every failure is an error here,
    /// including rejected lines.
    pub fn convert_one(
        &self,
        upload: &Upload,
        source: Format,
        target: Format,
    ) -> InterchangeResult<Payload> {
        let reader = codec::reader(source)?;
        let writer = codec::writer(target)?;

        let mut rejected = vec![];
        let records = self.decode(upload, reader, None, &mut rejected)?;
        if let Some(error) = rejected.first() {
            bail!(MalformedInput, "{}", error.message);
        }

        Ok(Payload {
            content: writer(&records, &self.write_options)?,
            content_type: target.content_type(),
        })
    }

    /// Reads the uploads as `format` and stores the text under `key`
    /// (default `text`) of every record as a new document of
    /// `project`.
    pub fn import(
        &self,
        store: &mut dyn Store,
        project: ProjectId,
        uploads: &[Upload],
        format: Format,
        key: Option<&str>,
    ) -> InterchangeResult<ImportReport> {
        store.project(project)?;
        let reader = codec::reader(format)?;

        let key = match format {
            Format::Txt | Format::Conllu => DEFAULT_KEY,
            _ => key.unwrap_or(DEFAULT_KEY),
        };

        let mut report = ImportReport::default();

        for upload in uploads.iter() {
            let records = match self.decode(
                upload,
                reader,
                Some(key),
                &mut report.errors,
            ) {
                Ok(records) => records,
                Err(e) => {
                    log::warn!("{}: {e}", upload.name);
                    report.errors.push(FileError::new(&upload.name, e));
                    continue;
                }
            };

            let texts = records
                .into_iter()
                .filter_map(|record| {
                    record
                        .get(DEFAULT_KEY)
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .collect();

            let documents = store.bulk_create_documents(project, texts)?;
            report.objects.extend(documents);
        }

        if !report.objects.is_empty() {
            report.message = Some(format!(
                "{} data imported successfully from {} file(s).",
                report.objects.len(),
                uploads.len()
            ));
        }

        log::info!(
            "imported {} document(s) with {} error(s)",
            report.objects.len(),
            report.errors.len()
        );

        Ok(report)
    }
}
