use serde_json::json;

use super::{decode_utf8, Decoded, ReadOptions};
use crate::error::InterchangeResult;

/// Reads one record `{"text": line}` per non-blank line.
pub(crate) fn read(
    buf: &[u8],
    _options: &ReadOptions,
) -> InterchangeResult<Decoded> {
    let content = decode_utf8(buf)?;
    let records = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| json!({ "text": line }))
        .collect();

    Ok(Decoded::from_records(records))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    type TestResult = anyhow::Result<()>;

    #[test]
    fn read_skips_blank_lines() -> TestResult {
        let decoded =
            read(b"  first line \r\n\n   \nsecond\n", &Default::default())?;

        assert_eq!(
            decoded.records,
            [json!({"text": "first line"}), json!({"text": "second"})]
        );
        assert!(decoded.rejected.is_empty());
        Ok(())
    }

    #[test]
    fn read_invalid_utf8() {
        assert!(read(b"\xff\xfe", &Default::default()).is_err());
    }
}
