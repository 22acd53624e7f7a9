use serde_json::Value;

use super::{
    decode_utf8, ensure_not_empty, Decoded, ReadOptions, Record,
    WriteOptions,
};
use crate::error::{InterchangeResult, LineError};

/// Reads one JSON value per line.
///
/// A line that fails to parse is rejected on its own; the remaining
/// lines are still read. Blank lines are skipped.
pub(crate) fn read(
    buf: &[u8],
    _options: &ReadOptions,
) -> InterchangeResult<Decoded> {
    let content = decode_utf8(buf)?;
    let mut decoded = Decoded::default();

    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<Value>(line) {
            Ok(record) => decoded.records.push(record),
            Err(e) => decoded.rejected.push(LineError::new(idx + 1, e)),
        }
    }

    Ok(decoded)
}

/// Writes one compact JSON object per line.
pub(crate) fn write(
    records: &[Record],
    _options: &WriteOptions,
) -> InterchangeResult<Vec<u8>> {
    ensure_not_empty(records)?;

    let lines = records
        .iter()
        .map(serde_json::to_string)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(lines.join("\n").into_bytes())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    type TestResult = anyhow::Result<()>;

    #[test]
    fn read_rejects_single_lines() -> TestResult {
        let buf = b"{\"text\": \"a\"}\n\n{\"text\": \n{\"text\": \"c\"}\n";
        let decoded = read(buf, &ReadOptions::default())?;

        assert_eq!(
            decoded.records,
            [json!({"text": "a"}), json!({"text": "c"})]
        );
        assert_eq!(decoded.rejected.len(), 1);
        assert_eq!(decoded.rejected[0].line, 3);
        assert!(decoded.rejected[0].to_string().starts_with("Line 3: "));
        Ok(())
    }

    #[test]
    fn write_compact_lines() -> TestResult {
        let records = [
            json!({"text": "a", "label": ["x", "y"]}),
            json!({"text": "b"}),
        ];

        let out = write(&records, &WriteOptions::default())?;
        assert_eq!(
            String::from_utf8(out)?,
            "{\"text\":\"a\",\"label\":[\"x\",\"y\"]}\n{\"text\":\"b\"}"
        );
        Ok(())
    }
}
