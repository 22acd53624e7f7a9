//! The CSV codec.
//!
//! Nested records are flattened into `/`-joined column names on write
//! (`meta/0/x`) and reconstructed from them on read.

use ::csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use hashbrown::HashMap;
use serde_json::{Map, Number, Value};

use super::{
    decode_utf8, ensure_not_empty, sentence_tokens, Decoded, ReadOptions,
    Record, WriteOptions,
};
use crate::error::{bail, InterchangeResult, LineError};

const SEP: char = '/';
const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];
const SEQUENTIAL_HEADER: [&str; 3] = ["Sentence", "Word", "Label"];

/// Guesses the delimiter from the header line. The most frequent
/// candidate outside of quotes wins; ties keep the earlier candidate
/// and a line without any candidate falls back to `,`.
fn sniff(header: &str) -> u8 {
    let mut counts = [0usize; DELIMITERS.len()];
    let mut quoted = false;

    for b in header.bytes() {
        if b == b'"' {
            quoted = !quoted;
        } else if !quoted {
            if let Some(pos) = DELIMITERS.iter().position(|d| *d == b) {
                counts[pos] += 1;
            }
        }
    }

    let (pos, count) = counts.iter().enumerate().fold(
        (0, 0),
        |best, (pos, count)| {
            if *count > best.1 {
                (pos, *count)
            } else {
                best
            }
        },
    );

    if count == 0 {
        b','
    } else {
        DELIMITERS[pos]
    }
}

/// Turns a digit string into an integer, a decimal string into a float
/// and leaves everything else as a string.
fn coerce(value: &str) -> Value {
    let is_digits =
        |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

    if is_digits(value) {
        return match value.parse::<u64>() {
            Ok(n) => Value::from(n),
            Err(_) => Value::String(value.into()),
        };
    }

    if is_digits(&value.replacen('.', "", 1)) {
        if let Some(n) =
            value.parse::<f64>().ok().and_then(Number::from_f64)
        {
            return Value::Number(n);
        }
    }

    Value::String(value.into())
}

/// Inserts `value` at the `/`-separated `path` below `root`.
fn insert_path(
    root: &mut Map<String, Value>,
    path: &str,
    value: Value,
) -> Result<(), String> {
    let mut parts: Vec<&str> = path.split(SEP).collect();
    let last = parts.pop().unwrap_or_default();
    let mut node = root;

    for part in parts {
        let child = node
            .entry(part)
            .or_insert_with(|| Value::Object(Map::new()));

        node = match child {
            Value::Object(map) => map,
            _ => return Err(format!("conflicting column '{path}'")),
        };
    }

    node.insert(last.into(), value);
    Ok(())
}

/// Orders digit keys by their numeric value.
fn numeric_key(key: &str) -> (usize, &str) {
    let trimmed = key.trim_start_matches('0');
    (trimmed.len(), trimmed)
}

/// Replaces every object whose keys are all digit strings by a list
/// ordered by the numeric value of the keys.
fn materialize_lists(value: Value) -> Value {
    match value {
        Value::Object(map)
            if !map.is_empty()
                && map.keys().all(|key| {
                    key.bytes().all(|b| b.is_ascii_digit())
                        && !key.is_empty()
                }) =>
        {
            let mut items: Vec<(String, Value)> = map.into_iter().collect();
            items.sort_by(|a, b| numeric_key(&a.0).cmp(&numeric_key(&b.0)));
            Value::Array(
                items
                    .into_iter()
                    .map(|(_, value)| materialize_lists(value))
                    .collect(),
            )
        }
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, materialize_lists(value)))
                .collect(),
        ),
        other => other,
    }
}

fn read_row(
    headers: &StringRecord,
    row: &StringRecord,
) -> Result<Value, String> {
    if row.len() > headers.len() {
        return Err(format!(
            "expected {} fields, found {}",
            headers.len(),
            row.len()
        ));
    }

    let mut root = Map::new();

    for (idx, key) in headers.iter().enumerate() {
        let value = match row.get(idx) {
            Some(value) => coerce(value.trim()),
            None => Value::Null,
        };

        insert_path(&mut root, key, value)?;
    }

    Ok(materialize_lists(Value::Object(root)))
}

/// Reads a CSV file with a header line.
pub(crate) fn read(
    buf: &[u8],
    _options: &ReadOptions,
) -> InterchangeResult<Decoded> {
    let content = decode_utf8(buf)?;
    let Some(header) = content.lines().next() else {
        bail!(EmptyResult, "The file is empty");
    };

    let mut reader = ReaderBuilder::new()
        .delimiter(sniff(header))
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let mut decoded = Decoded::default();

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                decoded.rejected.push(LineError::new(line, e));
                continue;
            }
        };

        let line = row
            .position()
            .map(|pos| pos.line() as usize)
            .unwrap_or(line);

        match read_row(&headers, &row) {
            Ok(record) => decoded.records.push(record),
            Err(e) => decoded.rejected.push(LineError::new(line, e)),
        }
    }

    if decoded.records.is_empty() && decoded.rejected.is_empty() {
        bail!(EmptyResult, "The file is empty");
    }

    Ok(decoded)
}

fn scalar(value: &Value) -> String {
    match value {
        Value::Null => "".into(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Flattens a record into `(column, value)` pairs. List indices become
/// path segments, an empty list becomes a single empty column and an
/// empty object vanishes.
fn flatten(value: &Value, parent: &str, items: &mut Vec<(String, String)>) {
    match value {
        Value::Array(list) if list.is_empty() => {
            items.push((parent.into(), "".into()));
        }
        Value::Array(list) => {
            for (idx, item) in list.iter().enumerate() {
                flatten(item, &format!("{parent}{SEP}{idx}"), items);
            }
        }
        Value::Object(map) => {
            for (key, item) in map.iter() {
                let key = if parent.is_empty() {
                    key.clone()
                } else {
                    format!("{parent}{SEP}{key}")
                };

                flatten(item, &key, items);
            }
        }
        scalar_value => items.push((parent.into(), scalar(scalar_value))),
    }
}

fn flatten_records(records: &[Record]) -> (Vec<String>, Vec<Vec<String>>) {
    let mut headers: Vec<String> = vec![];
    let mut flattened: Vec<HashMap<String, String>> = vec![];

    for record in records {
        let mut items = vec![];
        flatten(record, "", &mut items);

        for (key, _) in items.iter() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }

        flattened.push(items.into_iter().collect());
    }

    let rows = flattened
        .iter()
        .map(|row| {
            headers
                .iter()
                .map(|key| row.get(key).cloned().unwrap_or_default())
                .collect()
        })
        .collect();

    (headers, rows)
}

/// Builds the token-per-row table of sequence-labelling records.
fn sequential_rows(records: &[Record]) -> InterchangeResult<Vec<Vec<String>>> {
    let mut rows = vec![];
    let mut sentence = 0;

    for (idx, record) in records.iter().enumerate() {
        let Some(tokens) = sentence_tokens(record, idx + 1)? else {
            continue;
        };

        sentence += 1;
        for (pos, token) in tokens.into_iter().enumerate() {
            let marker = if pos == 0 {
                format!("Sentence: {sentence}")
            } else {
                String::new()
            };

            rows.push(vec![marker, token.form, token.tag]);
        }
    }

    if rows.is_empty() {
        bail!(EmptyResult, "The exported file is empty");
    }

    Ok(rows)
}

/// Writes the records as CSV with a header line.
pub(crate) fn write(
    records: &[Record],
    options: &WriteOptions,
) -> InterchangeResult<Vec<u8>> {
    ensure_not_empty(records)?;

    let (headers, rows) = if options.sequential {
        let headers =
            SEQUENTIAL_HEADER.iter().map(ToString::to_string).collect();
        (headers, sequential_rows(records)?)
    } else {
        flatten_records(records)
    };

    let mut writer = WriterBuilder::new()
        .terminator(Terminator::CRLF)
        .from_writer(vec![]);

    writer.write_record(&headers)?;
    for row in rows.iter() {
        writer.write_record(row)?;
    }

    writer.into_inner().map_err(|e| e.into_error().into())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::InterchangeError;

    type TestResult = anyhow::Result<()>;

    #[test]
    fn sniff_delimiter() {
        assert_eq!(sniff("text,label"), b',');
        assert_eq!(sniff("text;label;\"a,b\""), b';');
        assert_eq!(sniff("text\tlabel"), b'\t');
        assert_eq!(sniff("text"), b',');
    }

    #[test]
    fn coerce_scalars() {
        assert_eq!(coerce("42"), json!(42));
        assert_eq!(coerce("007"), json!(7));
        assert_eq!(coerce("3.5"), json!(3.5));
        assert_eq!(coerce("1.2.3"), json!("1.2.3"));
        assert_eq!(coerce("-1"), json!("-1"));
        assert_eq!(coerce(""), json!(""));
        assert_eq!(
            coerce("99999999999999999999"),
            json!("99999999999999999999")
        );
    }

    #[test]
    fn read_nested_paths() -> TestResult {
        let decoded = read(b"meta/0/x,meta/0/y\n1,2\n", &Default::default())?;
        assert_eq!(decoded.records, [json!({"meta": [{"x": 1, "y": 2}]})]);
        Ok(())
    }

    #[test]
    fn read_orders_lists_numerically() -> TestResult {
        let buf = b"text;l/10;l/2;l/1\n hello ;c;b;a\n";
        let decoded = read(buf, &Default::default())?;

        assert_eq!(
            decoded.records,
            [json!({"text": "hello", "l": ["a", "b", "c"]})]
        );
        Ok(())
    }

    #[test]
    fn read_missing_fields_and_conflicts() -> TestResult {
        let buf = b"text,label\nonly text\na,b\n";
        let decoded = read(buf, &Default::default())?;
        assert_eq!(
            decoded.records,
            [
                json!({"text": "only text", "label": null}),
                json!({"text": "a", "label": "b"}),
            ]
        );

        let decoded = read(b"a,a/b\n1,2\n3,4\n", &Default::default())?;
        assert!(decoded.records.is_empty());
        assert_eq!(decoded.rejected.len(), 2);
        assert_eq!(decoded.rejected[0].line, 2);
        Ok(())
    }

    #[test]
    fn read_rejects_surplus_fields() -> TestResult {
        let buf = b"text,label
a,b,extra
c,d
";
        let decoded = read(buf, &Default::default())?;

        assert_eq!(decoded.records, [json!({"text": "c", "label": "d"})]);
        assert_eq!(decoded.rejected.len(), 1);
        assert_eq!(
            decoded.rejected[0].to_string(),
            "Line 2: expected 2 fields, found 3"
        );
        Ok(())
    }

    #[test]
    fn read_empty_file() {
        let cases: [&[u8]; 2] = [b"", b"text,label\n"];
        for buf in cases {
            assert!(matches!(
                read(buf, &Default::default()),
                Err(InterchangeError::EmptyResult(_))
            ));
        }
    }

    #[test]
    fn write_flattened() -> TestResult {
        let records = [
            json!({
                "text": "a",
                "label": ["x", "y"],
                "meta": {"k": 1, "empty": {}},
                "none": [],
            }),
            json!({"text": "b, c", "extra": true, "skip": null}),
        ];

        let out = write(&records, &WriteOptions::default())?;
        assert_eq!(
            String::from_utf8(out)?,
            "text,label/0,label/1,meta/k,none,extra,skip\r\n\
             a,x,y,1,,,\r\n\
             \"b, c\",,,,,true,\r\n"
        );
        Ok(())
    }

    #[test]
    fn write_sequential() -> TestResult {
        let records = [
            json!({"text": "The cat sat.", "label": [[4, 7, "ANIMAL"]]}),
            json!({"label": "no text"}),
            json!({"text": "Hi there", "label": []}),
        ];

        let options = WriteOptions { sequential: true };
        let out = write(&records, &options)?;
        assert_eq!(
            String::from_utf8(out)?,
            "Sentence,Word,Label\r\n\
             Sentence: 1,The,_\r\n\
             ,cat,ANIMAL\r\n\
             ,sat.,_\r\n\
             Sentence: 2,Hi,_\r\n\
             ,there,_\r\n"
        );
        Ok(())
    }

    #[test]
    fn write_sequential_out_of_bounds() {
        let records = [json!({"text": "abc", "label": [[1, 8, "X"]]})];
        let options = WriteOptions { sequential: true };

        assert!(matches!(
            write(&records, &options),
            Err(InterchangeError::SpanOutOfBounds(_))
        ));

        assert!(matches!(
            write(&[], &WriteOptions::default()),
            Err(InterchangeError::EmptyResult(_))
        ));
    }
}
