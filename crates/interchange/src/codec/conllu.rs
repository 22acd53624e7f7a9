//! The CoNLL-U codec.
//!
//! A sentence is a block of comment lines (`# key = value`) followed by
//! one line per token with ten tab-separated columns; sentences are
//! separated by blank lines. Only the label tag is stored in the UPOS
//! column, all other columns are carried through.

use serde_json::{json, Map, Value};

use super::{
    decode_utf8, sentence_tokens, Decoded, ReadOptions, Record,
    WriteOptions,
};
use crate::error::{bail, InterchangeResult};
use crate::token::{Token, SENTINEL};

const COLUMNS: usize = 10;

/// Parses `key=value|key=value` columns into an object; a part
/// without `=` becomes a key with a null value.
fn parse_pairs(value: &str) -> Value {
    let map: Map<String, Value> = value
        .split('|')
        .filter(|part| !part.is_empty())
        .map(|part| match part.split_once('=') {
            Some((key, value)) => (key.to_string(), json!(value)),
            None => (part.to_string(), Value::Null),
        })
        .collect();

    Value::Object(map)
}

fn nullable(value: &str) -> Value {
    if value == SENTINEL {
        Value::Null
    } else {
        json!(value)
    }
}

#[derive(Debug, Default)]
struct Sentence {
    metadata: Vec<(String, String)>,
    tokens: Vec<Map<String, Value>>,
}

impl Sentence {
    fn is_empty(&self) -> bool {
        self.metadata.is_empty() && self.tokens.is_empty()
    }

    fn push_comment(&mut self, comment: &str) {
        if let Some((key, value)) = comment.split_once('=') {
            self.metadata
                .push((key.trim().to_string(), value.trim().to_string()));
        }
    }

    fn push_token(&mut self, line: &str, lineno: usize) -> InterchangeResult<()> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != COLUMNS {
            bail!(
                MalformedInput,
                "Line {lineno}: expected {COLUMNS} tab-separated fields, \
                found {}",
                fields.len()
            );
        }

        // multiword ranges and empty nodes
        if fields[0].contains(['-', '.']) {
            return Ok(());
        }

        let Ok(id) = fields[0].parse::<usize>() else {
            bail!(MalformedInput, "Line {lineno}: invalid id '{}'", fields[0]);
        };

        let head = match fields[6] {
            "_" => Value::Null,
            value => match value.parse::<usize>() {
                Ok(head) => json!(head),
                Err(_) => bail!(
                    MalformedInput,
                    "Line {lineno}: invalid head '{value}'"
                ),
            },
        };

        let pairs = |value: &str| {
            if value == SENTINEL {
                Value::Null
            } else {
                parse_pairs(value)
            }
        };

        let mut token = Map::new();
        token.insert("id".into(), json!(id));
        token.insert("form".into(), json!(fields[1]));
        token.insert("lemma".into(), json!(fields[2]));
        token.insert("upostag".into(), nullable(fields[3]));
        token.insert("xpostag".into(), nullable(fields[4]));
        token.insert("feats".into(), pairs(fields[5]));
        token.insert("head".into(), head);
        token.insert("deprel".into(), nullable(fields[7]));
        token.insert("deps".into(), nullable(fields[8]));
        token.insert("misc".into(), pairs(fields[9]));

        self.tokens.push(token);
        Ok(())
    }

    /// Joins the token forms, separated by a space unless the token
    /// has `SpaceAfter=No`.
    fn surface(&self) -> String {
        let mut text = String::new();

        for token in self.tokens.iter() {
            if let Some(form) = token.get("form").and_then(Value::as_str) {
                text.push_str(form);
            }

            let no_space = token
                .get("misc")
                .and_then(|misc| misc.get("SpaceAfter"))
                .and_then(Value::as_str)
                == Some("No");

            if !no_space {
                text.push(' ');
            }
        }

        text.trim().to_string()
    }

    fn into_record(self) -> Option<Record> {
        let text = self.surface();
        if text.is_empty() {
            return None;
        }

        let label = self
            .metadata
            .iter()
            .find(|(key, _)| key == "sentiment_label")
            .map(|(_, value)| value.clone())
            .filter(|value| !value.is_empty());

        let mut record = Map::new();
        record.insert("text".into(), json!(text));
        record.insert(
            "tokens".into(),
            Value::Array(self.tokens.into_iter().map(Value::Object).collect()),
        );

        if let Some(label) = label {
            record.insert("label".into(), json!(label));
        }

        Some(Value::Object(record))
    }
}

/// Reads a CoNLL-U file into one `{text, tokens, label?}` record per
/// sentence.
pub(crate) fn read(
    buf: &[u8],
    _options: &ReadOptions,
) -> InterchangeResult<Decoded> {
    let content = decode_utf8(buf)?;
    let mut sentences = vec![];
    let mut current = Sentence::default();

    for (idx, line) in content.lines().enumerate() {
        let line = line.trim_end_matches('\r');

        if line.trim().is_empty() {
            if !current.is_empty() {
                sentences.push(std::mem::take(&mut current));
            }
        } else if let Some(comment) = line.strip_prefix('#') {
            current.push_comment(comment);
        } else {
            current.push_token(line, idx + 1)?;
        }
    }

    if !current.is_empty() {
        sentences.push(current);
    }

    let records: Vec<Record> = sentences
        .into_iter()
        .filter_map(Sentence::into_record)
        .collect();

    if records.is_empty() {
        bail!(EmptyResult, "The file is empty");
    }

    log::debug!("read {} CoNLL-U sentence(s)", records.len());
    Ok(Decoded::from_records(records))
}

/// Replaces line breaks and tabs, which would end a comment or a
/// field early, by spaces.
fn single_line(value: &str) -> String {
    value
        .replace("\r\n", " ")
        .replace(['\n', '\r', '\t'], " ")
}

fn token_line(token: &Token) -> String {
    [
        token.id.to_string(),
        single_line(&token.form),
        single_line(&token.lemma),
        token.tag.clone(),
        token.xpostag.clone(),
        token.feats.clone(),
        token.head.to_string(),
        token.deprel.clone(),
        token.deps.clone(),
        token.misc.clone(),
    ]
    .join("\t")
}

/// Writes one CoNLL-U sentence per record.
///
/// Records that yield no tokens (neither `tokens` nor a non-empty
/// `text`) are skipped.
pub(crate) fn write(
    records: &[Record],
    _options: &WriteOptions,
) -> InterchangeResult<Vec<u8>> {
    let mut out = String::new();
    let mut sentences = 0;

    for (idx, record) in records.iter().enumerate() {
        let Some(tokens) = sentence_tokens(record, idx + 1)? else {
            continue;
        };

        if let Some(text) = record.get("text").and_then(Value::as_str) {
            out.push_str(&format!("# text = {}\n", single_line(text)));
        }

        if let Some(label) = record.get("label").and_then(Value::as_str) {
            if !label.is_empty() {
                out.push_str(&format!(
                    "# sentiment_label = {}\n",
                    single_line(label)
                ));
            }
        }

        for token in tokens.iter() {
            out.push_str(&token_line(token));
            out.push('\n');
        }

        out.push('\n');
        sentences += 1;
    }

    if sentences == 0 {
        bail!(EmptyResult, "The exported file is empty");
    }

    Ok(out.into_bytes())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::InterchangeError;

    type TestResult = anyhow::Result<()>;

    const SAMPLE: &str = "\
# sent_id = 1
# sentiment_label = positive
1\tHallo\thallo\tINTJ\t_\t_\t0\troot\t_\tSpaceAfter=No
2\t!\t!\tPUNCT\t_\t_\t1\tpunct\t_\t_

# text = Gut so
1-2\tGutso\t_\t_\t_\t_\t_\t_\t_\t_
1\tGut\tgut\tADJ\t_\tDegree=Pos\t0\troot\t_\t_
2\tso\tso\tADV\t_\t_\t1\tadvmod\t_\t_
";

    #[test]
    fn read_sentences() -> TestResult {
        let decoded = read(SAMPLE.as_bytes(), &ReadOptions::default())?;
        assert_eq!(decoded.records.len(), 2);

        let first = &decoded.records[0];
        assert_eq!(first["text"], json!("Hallo!"));
        assert_eq!(first["label"], json!("positive"));
        assert_eq!(first["tokens"][0]["misc"], json!({"SpaceAfter": "No"}));
        assert_eq!(first["tokens"][0]["upostag"], json!("INTJ"));
        assert_eq!(first["tokens"][1]["head"], json!(1));
        assert_eq!(first["tokens"][1]["feats"], Value::Null);

        let second = &decoded.records[1];
        assert_eq!(second["text"], json!("Gut so"));
        assert!(second.get("label").is_none());
        assert_eq!(second["tokens"].as_array().unwrap().len(), 2);
        assert_eq!(second["tokens"][0]["feats"], json!({"Degree": "Pos"}));
        Ok(())
    }

    #[test]
    fn read_malformed_and_empty() {
        assert!(matches!(
            read(b"1\tHallo\thallo\n", &ReadOptions::default()),
            Err(InterchangeError::MalformedInput(_))
        ));

        assert!(matches!(
            read(b"# text = nothing\n\n", &ReadOptions::default()),
            Err(InterchangeError::EmptyResult(_))
        ));
    }

    #[test]
    fn write_from_spans() -> TestResult {
        let records = [
            json!({"text": "The cat sat.", "label": [[4, 7, "ANIMAL"]]}),
            json!({"label": "skipped"}),
        ];

        let out = write(&records, &WriteOptions::default())?;
        assert_eq!(
            String::from_utf8(out)?,
            "# text = The cat sat.\n\
             1\tThe\tthe\t_\t_\t_\t0\t_\t_\t_\n\
             2\tcat\tcat\tANIMAL\t_\t_\t0\t_\t_\t_\n\
             3\tsat.\tsat.\t_\t_\t_\t0\t_\t_\t_\n\n"
        );
        Ok(())
    }

    #[test]
    fn write_document_label() -> TestResult {
        let records = [json!({"text": "Good movie", "label": "positive"})];
        let out = String::from_utf8(write(&records, &Default::default())?)?;

        assert!(out.starts_with(
            "# text = Good movie\n# sentiment_label = positive\n"
        ));
        assert!(out.contains("1\tGood\tgood\t_\t"));
        Ok(())
    }

    #[test]
    fn write_keeps_line_breaks_out_of_lines() -> TestResult {
        let records = [
            json!({"text": "first line\nsecond", "label": "pos"}),
            json!({"text": "New\nYork is big", "label": [[0, 8, "LOC"]]}),
        ];
        let out = String::from_utf8(write(&records, &Default::default())?)?;

        assert!(out.starts_with(
            "# text = first line second\n# sentiment_label = pos\n"
        ));
        assert!(out.contains("# text = New York is big\n"));
        assert!(out.contains("1\tNew York\tnew york\tLOC\t"));
        assert_eq!(read(out.as_bytes(), &Default::default())?.records.len(), 2);
        Ok(())
    }

    #[test]
    fn read_write_round_trip() -> TestResult {
        let decoded = read(SAMPLE.as_bytes(), &ReadOptions::default())?;
        let out = write(&decoded.records, &WriteOptions::default())?;
        let again = read(&out, &ReadOptions::default())?;

        assert_eq!(again.records.len(), 2);
        assert_eq!(again.records[0]["text"], json!("Hallo!"));
        assert_eq!(again.records[0]["label"], json!("positive"));
        assert_eq!(
            again.records[1]["tokens"][0]["feats"],
            json!({"Degree": "Pos"})
        );
        Ok(())
    }

    #[test]
    fn write_nothing() {
        assert!(matches!(
            write(&[json!({"label": "x"})], &WriteOptions::default()),
            Err(InterchangeError::EmptyResult(_))
        ));
    }
}
