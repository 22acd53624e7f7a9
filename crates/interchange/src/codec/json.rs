use serde_json::{Map, Value};

use super::{
    decode_utf8, ensure_not_empty, ColumnMode, Decoded, ReadOptions,
    Record, WriteOptions,
};
use crate::error::{bail, InterchangeError, InterchangeResult};

/// Reads a JSON document.
///
/// Three layouts are accepted, in this order: a column-oriented object
/// (every value is a list), an object with at least one list-valued
/// field (the first such list is returned) and a plain array.
pub(crate) fn read(
    buf: &[u8],
    options: &ReadOptions,
) -> InterchangeResult<Decoded> {
    let content = decode_utf8(buf)?;
    let data: Value = serde_json::from_str(content)
        .map_err(|e| InterchangeError::MalformedInput(e.to_string()))?;

    let records = match data {
        Value::Object(map)
            if !map.is_empty() && map.values().all(Value::is_array) =>
        {
            transpose(map, options.columns)
        }
        Value::Object(map) => match map
            .into_iter()
            .find_map(|(_, value)| match value {
                Value::Array(items) => Some(items),
                _ => None,
            }) {
            Some(items) => items,
            None => bail!(UnsupportedFormat, "unsupported JSON format"),
        },
        Value::Array(items) => items,
        _ => bail!(UnsupportedFormat, "unsupported JSON format"),
    };

    Ok(Decoded::from_records(records))
}

/// Turns a column-oriented object into row objects.
fn transpose(map: Map<String, Value>, mode: ColumnMode) -> Vec<Record> {
    let columns: Vec<(String, Vec<Value>)> = map
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::Array(items) => Some((key, items)),
            _ => None,
        })
        .collect();

    let lengths = columns.iter().map(|(_, items)| items.len());
    let rows = match mode {
        ColumnMode::Pad => lengths.max().unwrap_or(0),
        ColumnMode::Truncate => lengths.min().unwrap_or(0),
    };

    (0..rows)
        .map(|idx| {
            let row: Map<String, Value> = columns
                .iter()
                .map(|(key, items)| {
                    let value = items
                        .get(idx)
                        .cloned()
                        .unwrap_or_else(|| Value::String("".into()));
                    (key.clone(), value)
                })
                .collect();

            Value::Object(row)
        })
        .collect()
}

/// Writes the records as a pretty-printed JSON array.
pub(crate) fn write(
    records: &[Record],
    _options: &WriteOptions,
) -> InterchangeResult<Vec<u8>> {
    ensure_not_empty(records)?;
    Ok(serde_json::to_vec_pretty(records)?)
}
