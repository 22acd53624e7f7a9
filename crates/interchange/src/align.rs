//! Mapping between character-offset label spans and token tags.
//!
//! The alignment produces exactly one token per label span, regardless
//! of how many words the span covers, while the text between spans is
//! split on whitespace into untagged tokens (tag [SENTINEL]). The
//! resulting tag sequence is what sequence-labelling exports and the
//! per-token agreement ratings are built from.
//!
//! Offsets count characters. A span `(start, end)` covers `start..end`,
//! except for `start == end`, which covers the single character at
//! `start`. After a span the next gap begins at `end + 1`, i.e. the
//! character at a span's end offset acts as a separator.

use serde::{Deserialize, Serialize};

use crate::error::{bail, InterchangeResult};
use crate::token::{CharText, Token, TokenBuilder, SENTINEL};

/// A labelled, character-offset delimited substring of a text.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub label: String,
}

impl Span {
    pub fn new<L: Into<String>>(start: usize, end: usize, label: L) -> Self {
        Self {
            start,
            end,
            label: label.into(),
        }
    }

    /// Returns the exclusive upper bound of the covered characters.
    #[inline]
    pub fn upper(&self) -> usize {
        if self.start == self.end {
            self.end + 1
        } else {
            self.end
        }
    }
}

/// Sorts spans by `(start, end)` and checks that they lie within a text
/// of `len` characters and don't overlap.
pub fn validate(spans: &mut [Span], len: usize) -> InterchangeResult<()> {
    spans.sort_by_key(|span| (span.start, span.end));

    let mut prev: Option<&Span> = None;
    for span in spans.iter() {
        if span.start > span.end {
            bail!(
                SpanOutOfBounds,
                "span ({}, {}) starts after its end",
                span.start,
                span.end
            );
        }

        if span.upper() > len {
            bail!(
                SpanOutOfBounds,
                "span ({}, {}) exceeds text length {len}",
                span.start,
                span.end
            );
        }

        if let Some(prev) = prev {
            if span.start < prev.upper() {
                bail!(
                    OverlappingSpans,
                    "({}, {}, {}) overlaps ({}, {}, {})",
                    span.start,
                    span.end,
                    span.label,
                    prev.start,
                    prev.end,
                    prev.label
                );
            }
        }

        prev = Some(span);
    }

    Ok(())
}

/// Converts label spans over `text` into a token sequence.
///
/// Every span becomes one token tagged with the span's label; the
/// remaining text is split on whitespace into untagged tokens. Token
/// ids are 1-based and contiguous.
pub fn spans_to_tokens(
    text: &str,
    spans: &[Span],
) -> InterchangeResult<Vec<Token>> {
    let chars = CharText::new(text);
    let mut spans = spans.to_vec();
    validate(&mut spans, chars.len())?;

    let mut builder = TokenBuilder::new();
    let mut gap_start = 0;

    for span in spans.iter() {
        if gap_start < span.start {
            builder.push_words(&chars, gap_start, span.start, SENTINEL);
        }

        let form = chars.slice(span.start, span.upper());
        builder.push_span(form, &span.label, span.start, span.end);
        gap_start = span.end + 1;
    }

    if gap_start < chars.len() {
        builder.push_words(&chars, gap_start, chars.len(), SENTINEL);
    }

    Ok(builder.finish())
}

/// Recovers the label spans of a token sequence.
///
/// Untagged tokens and tokens without character offsets are skipped.
pub fn tokens_to_spans(tokens: &[Token]) -> Vec<Span> {
    tokens
        .iter()
        .filter(|token| token.is_tagged())
        .filter_map(|token| {
            token
                .offsets
                .map(|(start, end)| Span::new(start, end, &token.tag))
        })
        .collect()
}

/// Returns the per-token tag sequence of `text` labelled with `spans`.
pub fn tags(text: &str, spans: &[Span]) -> InterchangeResult<Vec<String>> {
    Ok(spans_to_tokens(text, spans)?
        .into_iter()
        .map(|token| token.tag)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InterchangeError;

    type TestResult = anyhow::Result<()>;

    fn forms_and_tags(tokens: &[Token]) -> Vec<(&str, &str)> {
        tokens
            .iter()
            .map(|t| (t.form.as_str(), t.tag.as_str()))
            .collect()
    }

    #[test]
    fn spans_to_tokens_single_span() -> TestResult {
        let tokens = spans_to_tokens(
            "The cat sat.",
            &[Span::new(4, 7, "ANIMAL")],
        )?;

        assert_eq!(
            forms_and_tags(&tokens),
            [("The", "_"), ("cat", "ANIMAL"), ("sat.", "_")]
        );
        assert_eq!(
            tokens.iter().map(|t| t.id).collect::<Vec<_>>(),
            [1, 2, 3]
        );
        Ok(())
    }

    #[test]
    fn spans_to_tokens_sorts_and_keeps_multiword_spans() -> TestResult {
        let text = "Angela Merkel visited New York today";
        let tokens = spans_to_tokens(
            text,
            &[Span::new(22, 30, "LOC"), Span::new(0, 13, "PER")],
        )?;

        assert_eq!(
            forms_and_tags(&tokens),
            [
                ("Angela Merkel", "PER"),
                ("visited", "_"),
                ("New York", "LOC"),
                ("today", "_")
            ]
        );
        Ok(())
    }

    #[test]
    fn spans_to_tokens_single_character_span() -> TestResult {
        let tokens = spans_to_tokens("a b c", &[Span::new(2, 2, "X")])?;
        assert_eq!(forms_and_tags(&tokens), [("a", "_"), ("b", "X"), ("c", "_")]);
        assert_eq!(tokens[1].offsets, Some((2, 2)));
        Ok(())
    }

    #[test]
    fn spans_to_tokens_without_spans() -> TestResult {
        let tokens = spans_to_tokens(" one  two ", &[])?;
        assert_eq!(forms_and_tags(&tokens), [("one", "_"), ("two", "_")]);
        assert!(spans_to_tokens("", &[])?.is_empty());
        Ok(())
    }

    #[test]
    fn spans_to_tokens_out_of_bounds() {
        let result = spans_to_tokens("short", &[Span::new(2, 9, "X")]);
        assert!(matches!(
            result,
            Err(InterchangeError::SpanOutOfBounds(_))
        ));

        let result = spans_to_tokens("short", &[Span::new(5, 5, "X")]);
        assert!(matches!(
            result,
            Err(InterchangeError::SpanOutOfBounds(_))
        ));

        let result = spans_to_tokens("short", &[Span::new(3, 1, "X")]);
        assert!(matches!(
            result,
            Err(InterchangeError::SpanOutOfBounds(_))
        ));
    }

    #[test]
    fn spans_to_tokens_overlapping() {
        let result = spans_to_tokens(
            "New York City",
            &[Span::new(0, 8, "LOC"), Span::new(4, 13, "LOC")],
        );
        assert!(matches!(
            result,
            Err(InterchangeError::OverlappingSpans(_))
        ));
    }

    #[test]
    fn round_trip() -> TestResult {
        let text = "Ada Lovelace wrote to Charles Babbage in London.";
        let spans = vec![
            Span::new(0, 12, "PER"),
            Span::new(22, 37, "PER"),
            Span::new(41, 47, "LOC"),
        ];

        let tokens = spans_to_tokens(text, &spans)?;
        assert_eq!(tokens_to_spans(&tokens), spans);
        Ok(())
    }

    #[test]
    fn tags_of_text() -> TestResult {
        assert_eq!(
            tags("x y z", &[Span::new(2, 2, "B")])?,
            ["_", "B", "_"]
        );
        Ok(())
    }
}
