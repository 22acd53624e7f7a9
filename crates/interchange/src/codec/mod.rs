//! Readers and writers of the interchange formats.
//!
//! Each format is served by a plain reader and/or writer function. The
//! mapping from [Format] to these functions is an exhaustive match, so
//! a format without a codec is rejected with
//! [InterchangeError::UnsupportedFormat] before any input is touched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::align::{spans_to_tokens, Span};
use crate::error::{bail, InterchangeError, InterchangeResult, LineError};
use crate::format::Format;
use crate::token::{CharText, Token, TokenBuilder, SENTINEL};

mod conllu;
mod json;
mod jsonl;
mod table;
mod txt;

/// One importable or exportable unit, usually a JSON object.
pub type Record = Value;

pub type ReadFn = fn(&[u8], &ReadOptions) -> InterchangeResult<Decoded>;
pub type WriteFn = fn(&[Record], &WriteOptions) -> InterchangeResult<Vec<u8>>;

/// How column-oriented JSON with columns of different lengths is
/// turned into rows.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ColumnMode {
    /// Pad short columns with empty strings (one row per element of the
    /// longest column).
    #[default]
    Pad,
    /// Stop at the end of the shortest column.
    Truncate,
}

#[derive(Debug, Default, Clone)]
pub struct ReadOptions {
    pub columns: ColumnMode,
}

#[derive(Debug, Default, Clone)]
pub struct WriteOptions {
    /// Emit the token-per-row table of sequence-labelling projects
    /// instead of flattened records (CSV only).
    pub sequential: bool,
}

/// The outcome of reading one file: the surviving records in source
/// order and the lines that had to be rejected.
#[derive(Debug, Default)]
pub struct Decoded {
    pub records: Vec<Record>,
    pub rejected: Vec<LineError>,
}

impl Decoded {
    pub(crate) fn from_records(records: Vec<Record>) -> Self {
        Self {
            records,
            rejected: vec![],
        }
    }
}

/// Returns the reader of `format`.
pub fn reader(format: Format) -> InterchangeResult<ReadFn> {
    match format {
        Format::Txt => Ok(txt::read),
        Format::Json => Ok(json::read),
        Format::Jsonl => Ok(jsonl::read),
        Format::Csv => Ok(table::read),
        Format::Conllu => Ok(conllu::read),
    }
}

/// Returns the writer of `format`.
pub fn writer(format: Format) -> InterchangeResult<WriteFn> {
    match format {
        Format::Json => Ok(json::write),
        Format::Jsonl => Ok(jsonl::write),
        Format::Csv => Ok(table::write),
        Format::Conllu => Ok(conllu::write),
        Format::Txt => {
            bail!(UnsupportedFormat, "no writer available for '{format}'")
        }
    }
}

/// Reads `buf` as `format`.
pub fn read(
    format: Format,
    buf: &[u8],
    options: &ReadOptions,
) -> InterchangeResult<Decoded> {
    reader(format)?(buf, options)
}

/// Writes `records` as `format`.
pub fn write(
    format: Format,
    records: &[Record],
    options: &WriteOptions,
) -> InterchangeResult<Vec<u8>> {
    writer(format)?(records, options)
}

#[inline]
pub(crate) fn decode_utf8(buf: &[u8]) -> InterchangeResult<&str> {
    std::str::from_utf8(buf)
        .map_err(|e| InterchangeError::MalformedInput(e.to_string()))
}

#[inline]
pub(crate) fn ensure_not_empty(records: &[Record]) -> InterchangeResult<()> {
    if records.is_empty() {
        bail!(EmptyResult, "The exported file is empty");
    }

    Ok(())
}

/// Parses the `label` value of a sequence-labelling record: a list of
/// `[start, end, label]` triples or `{start, end, label}` objects.
pub fn parse_spans(items: &[Value]) -> InterchangeResult<Vec<Span>> {
    items.iter().map(parse_span).collect()
}

fn parse_span(item: &Value) -> InterchangeResult<Span> {
    let (start, end, label) = match item {
        Value::Array(parts) if parts.len() == 3 => {
            (&parts[0], &parts[1], &parts[2])
        }
        Value::Object(map) => match (
            map.get("start"),
            map.get("end"),
            map.get("label").or_else(|| map.get("labelName")),
        ) {
            (Some(start), Some(end), Some(label)) => (start, end, label),
            _ => bail!(MalformedInput, "invalid label span {item}"),
        },
        _ => bail!(MalformedInput, "invalid label span {item}"),
    };

    let (Some(start), Some(end), Some(label)) =
        (start.as_i64(), end.as_i64(), label.as_str())
    else {
        bail!(MalformedInput, "invalid label span {item}");
    };

    if start < 0 || end < 0 {
        bail!(SpanOutOfBounds, "span ({start}, {end}) is negative");
    }

    Ok(Span::new(start as usize, end as usize, label))
}

/// Renders a CoNLL-U field value; missing values become `_`.
fn field(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => SENTINEL.into(),
        Some(Value::String(s)) if s.is_empty() => SENTINEL.into(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Object(map)) if map.is_empty() => SENTINEL.into(),
        Some(Value::Object(map)) => map
            .iter()
            .map(|(key, value)| match value {
                Value::Null => key.clone(),
                Value::String(s) => format!("{key}={s}"),
                other => format!("{key}={other}"),
            })
            .collect::<Vec<_>>()
            .join("|"),
        Some(Value::Array(items)) if items.is_empty() => SENTINEL.into(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| field(Some(item)))
            .collect::<Vec<_>>()
            .join("|"),
        Some(other) => other.to_string(),
    }
}

/// Rebuilds a token from its JSON object representation.
fn token_from_map(map: &Map<String, Value>) -> Token {
    let get = |keys: &[&str]| keys.iter().find_map(|key| map.get(*key));

    let mut token = Token::new(
        field(get(&["form"])),
        field(get(&["upostag", "upos"])),
    );

    let lemma = field(get(&["lemma"]));
    if lemma != SENTINEL {
        token.lemma = lemma;
    }

    token.xpostag = field(get(&["xpostag", "xpos"]));
    token.feats = field(get(&["feats"]));
    token.deprel = field(get(&["deprel"]));
    token.deps = field(get(&["deps"]));
    token.misc = field(get(&["misc"]));
    token.head = match get(&["head"]) {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0) as usize,
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        _ => 0,
    };

    token
}

/// Derives the token sequence of a record.
///
/// An existing `tokens` list takes precedence. Otherwise the tokens are
/// derived from `text` and `label`: a list of spans goes through the
/// span aligner, anything else yields whitespace tokens with the
/// sentinel tag. Records with neither `tokens` nor a non-empty `text`
/// yield `None`.
pub(crate) fn sentence_tokens(
    record: &Record,
    line: usize,
) -> InterchangeResult<Option<Vec<Token>>> {
    let Some(map) = record.as_object() else {
        return Ok(None);
    };

    if let Some(tokens) = map.get("tokens") {
        let Some(items) = tokens.as_array() else {
            bail!(MalformedInput, "Line {line}: invalid token format");
        };

        let mut builder = TokenBuilder::new();
        for item in items {
            let Some(token) = item.as_object() else {
                bail!(MalformedInput, "Line {line}: invalid token format");
            };

            builder.push(token_from_map(token));
        }

        return Ok(Some(builder.finish()).filter(|t| !t.is_empty()));
    }

    let text = match map.get("text") {
        Some(Value::String(text)) if !text.is_empty() => text,
        _ => return Ok(None),
    };

    let tokens = match map.get("label") {
        Some(Value::Array(items)) => parse_spans(items)
            .and_then(|spans| spans_to_tokens(text, &spans))
            .map_err(|e| e.at_line(line))?,
        _ => {
            let chars = CharText::new(text);
            let mut builder = TokenBuilder::new();
            builder.push_words(&chars, 0, chars.len(), SENTINEL);
            builder.finish()
        }
    };

    Ok(Some(tokens).filter(|t| !t.is_empty()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    type TestResult = anyhow::Result<()>;

    #[test]
    fn writer_of_txt_is_unsupported() {
        assert!(matches!(
            writer(Format::Txt),
            Err(InterchangeError::UnsupportedFormat(_))
        ));

        for format in Format::ALL {
            assert!(reader(format).is_ok());
        }
    }

    #[test]
    fn parse_spans_accepts_triples_and_objects() -> TestResult {
        let spans = parse_spans(&[
            json!([0, 3, "PER"]),
            json!({"start": 5, "end": 9, "label": "LOC"}),
        ])?;

        assert_eq!(
            spans,
            [Span::new(0, 3, "PER"), Span::new(5, 9, "LOC")]
        );

        assert!(parse_spans(&[json!([0, "x", "PER"])]).is_err());
        assert!(matches!(
            parse_spans(&[json!([-1, 2, "PER"])]),
            Err(InterchangeError::SpanOutOfBounds(_))
        ));
        Ok(())
    }

    #[test]
    fn sentence_tokens_prefers_tokens() -> TestResult {
        let record = json!({
            "text": "ignored text",
            "tokens": [
                {"id": 7, "form": "Hallo", "upostag": "INTJ",
                 "misc": {"SpaceAfter": "No"}},
                {"form": "!", "lemma": "!", "head": 1},
            ]
        });

        let tokens = sentence_tokens(&record, 1)?.unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].id, 1);
        assert_eq!(tokens[0].lemma, "hallo");
        assert_eq!(tokens[0].tag, "INTJ");
        assert_eq!(tokens[0].misc, "SpaceAfter=No");
        assert_eq!(tokens[1].tag, "_");
        assert_eq!(tokens[1].head, 1);
        Ok(())
    }

    #[test]
    fn sentence_tokens_from_text_and_label() -> TestResult {
        let record = json!({"text": "I love Paris", "label": [[7, 12, "LOC"]]});
        let tokens = sentence_tokens(&record, 1)?.unwrap();
        let tags: Vec<_> = tokens.iter().map(|t| t.tag.as_str()).collect();
        assert_eq!(tags, ["_", "_", "LOC"]);

        let record = json!({"text": "I love Paris", "label": "positive"});
        let tokens = sentence_tokens(&record, 1)?.unwrap();
        assert_eq!(tokens.len(), 3);
        assert!(tokens.iter().all(|t| !t.is_tagged()));

        assert!(sentence_tokens(&json!({"label": "x"}), 1)?.is_none());
        assert!(sentence_tokens(&json!({"text": ""}), 1)?.is_none());
        assert!(sentence_tokens(&json!("plain"), 1)?.is_none());
        Ok(())
    }

    #[test]
    fn sentence_tokens_reports_line() {
        let record = json!({"text": "abc", "label": [[0, 10, "X"]]});
        let err = sentence_tokens(&record, 4).unwrap_err();
        assert!(err.to_string().contains("Line 4"));
    }
}
