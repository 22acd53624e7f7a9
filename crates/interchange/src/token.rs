use serde::Serialize;

/// The tag carried by tokens which aren't covered by any label span.
pub const SENTINEL: &str = "_";

/// A CoNLL-U style token.
///
/// Besides the ten CoNLL-U columns (the label tag lives in the UPOS
/// column) a token remembers the character offsets it was built from.
/// Tokens built from a label span carry the offsets of that span, so
/// that the span can be recovered verbatim; tokens read from an
/// already tokenized record have no offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub id: usize,
    pub form: String,
    pub tag: String,
    pub lemma: String,
    pub xpostag: String,
    pub feats: String,
    pub head: usize,
    pub deprel: String,
    pub deps: String,
    pub misc: String,
    #[serde(skip)]
    pub offsets: Option<(usize, usize)>,
}

impl Token {
    /// Creates a token with CoNLL-U defaults (`_` and head `0`); the
    /// lemma is the lowercased form.
    pub fn new<F, T>(form: F, tag: T) -> Self
    where
        F: Into<String>,
        T: Into<String>,
    {
        let form = form.into();
        Self {
            id: 0,
            lemma: form.to_lowercase(),
            form,
            tag: tag.into(),
            xpostag: SENTINEL.into(),
            feats: SENTINEL.into(),
            head: 0,
            deprel: SENTINEL.into(),
            deps: SENTINEL.into(),
            misc: SENTINEL.into(),
            offsets: None,
        }
    }

    #[inline]
    pub fn is_tagged(&self) -> bool {
        self.tag != SENTINEL
    }
}

/// Character-indexed view of a text.
///
/// Offsets of spans and tokens count Unicode scalar values, not bytes.
#[derive(Debug)]
pub struct CharText<'a> {
    text: &'a str,
    bounds: Vec<usize>,
}

impl<'a> CharText<'a> {
    pub fn new(text: &'a str) -> Self {
        let bounds = text
            .char_indices()
            .map(|(pos, _)| pos)
            .chain(std::iter::once(text.len()))
            .collect();

        Self { text, bounds }
    }

    /// Returns the number of characters.
    #[inline]
    pub fn len(&self) -> usize {
        self.bounds.len() - 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the characters `from..to`; the range is clamped to the
    /// text and an inverted range yields the empty string.
    pub fn slice(&self, from: usize, to: usize) -> &'a str {
        let to = to.min(self.len());
        let from = from.min(to);
        &self.text[self.bounds[from]..self.bounds[to]]
    }
}

/// Builds a token sequence with contiguous, 1-based ids.
#[derive(Debug)]
pub struct TokenBuilder {
    tokens: Vec<Token>,
}

impl Default for TokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenBuilder {
    pub fn new() -> Self {
        Self { tokens: vec![] }
    }

    #[inline]
    fn next_id(&self) -> usize {
        self.tokens.len() + 1
    }

    /// Appends a token, replacing its id with the next free one.
    pub fn push(&mut self, mut token: Token) -> &mut Self {
        token.id = self.next_id();
        self.tokens.push(token);
        self
    }

    /// Appends a token for the characters `start..end` of `text`.
    pub fn push_span(
        &mut self,
        form: &str,
        tag: &str,
        start: usize,
        end: usize,
    ) -> &mut Self {
        let mut token = Token::new(form, tag);
        token.offsets = Some((start, end));
        self.push(token)
    }

    /// Splits the characters `from..to` of `text` on whitespace and
    /// appends one token per word.
    pub fn push_words(
        &mut self,
        text: &CharText<'_>,
        from: usize,
        to: usize,
        tag: &str,
    ) -> &mut Self {
        let to = to.min(text.len());
        let segment = text.slice(from, to);
        let mut word_start: Option<usize> = None;

        for (idx, c) in segment.chars().enumerate() {
            let pos = from + idx;
            match (c.is_whitespace(), word_start) {
                (true, Some(start)) => {
                    self.push_span(text.slice(start, pos), tag, start, pos);
                    word_start = None;
                }
                (false, None) => word_start = Some(pos),
                _ => {}
            }
        }

        if let Some(start) = word_start {
            self.push_span(text.slice(start, to), tag, start, to);
        }

        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn finish(self) -> Vec<Token> {
        self.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_text_slice() {
        let text = CharText::new("Grüße aus Köln");
        assert_eq!(text.len(), 14);
        assert_eq!(text.slice(0, 5), "Grüße");
        assert_eq!(text.slice(10, 14), "Köln");
        assert_eq!(text.slice(10, 99), "Köln");
        assert_eq!(text.slice(7, 3), "");
    }

    #[test]
    fn push_words_tracks_offsets() {
        let text = CharText::new("  Grüße aus\tKöln ");
        let mut builder = TokenBuilder::new();
        builder.push_words(&text, 0, text.len(), SENTINEL);
        let tokens = builder.finish();

        let forms: Vec<_> = tokens.iter().map(|t| t.form.as_str()).collect();
        assert_eq!(forms, ["Grüße", "aus", "Köln"]);

        let ids: Vec<_> = tokens.iter().map(|t| t.id).collect();
        assert_eq!(ids, [1, 2, 3]);

        assert_eq!(tokens[0].offsets, Some((2, 7)));
        assert_eq!(tokens[2].offsets, Some((12, 16)));
        assert_eq!(tokens[1].lemma, "aus");
        assert!(!tokens[1].is_tagged());
    }

    #[test]
    fn push_renumbers() {
        let mut token = Token::new("Berlin", "LOC");
        token.id = 42;

        let mut builder = TokenBuilder::new();
        builder.push_words(&CharText::new("in"), 0, 2, SENTINEL);
        builder.push(token);

        let tokens = builder.finish();
        assert_eq!(tokens[1].id, 2);
        assert_eq!(tokens[1].lemma, "berlin");
        assert!(tokens[1].is_tagged());
    }
}
