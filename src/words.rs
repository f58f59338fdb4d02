//! Token sequences.
//!
//! [`Words`] is the tokenized form of a path: an ordered list of non-empty
//! tokens with signed 1-based indexing (negative indexes count from the
//! end), token-wise prefix comparison and removal by index or by value.
use crate::config::DEFAULT_WORD_DELIMITER;
use crate::strings;
use std::fmt;

/// Resolve a signed 1-based index against `count` items.
///
/// `1` is the first item, `-1` the last. Returns `None` for `0` and for
/// indexes beyond either end.
pub fn positive_index(index: i64, count: usize) -> Option<usize> {
    if index == 0 {
        return None;
    }
    let magnitude = usize::try_from(index.unsigned_abs()).ok()?;
    if magnitude > count {
        return None;
    }
    if index > 0 {
        Some(magnitude - 1)
    } else {
        Some(count - magnitude)
    }
}

/// Stable ascending insertion sort, in place.
pub fn insert_sort<T: PartialOrd>(items: &mut [T]) {
    for index in 1..items.len() {
        let mut prev = index;
        while prev > 0 && items[prev - 1] > items[prev] {
            items.swap(prev - 1, prev);
            prev -= 1;
        }
    }
}

/// Reverse `items`, dropping adjacent duplicates.
pub fn no_dup_and_reverse<T: PartialEq + Clone>(items: &[T]) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items.iter().rev() {
        if out.last() != Some(item) {
            out.push(item.clone());
        }
    }
    out
}

/// What to remove from a [`Words`] sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector<'a> {
    /// Signed 1-based position.
    Index(i64),
    /// Every token equal to this word.
    Word(&'a str),
}

impl From<i64> for Selector<'_> {
    fn from(index: i64) -> Self {
        Selector::Index(index)
    }
}

impl From<i32> for Selector<'_> {
    fn from(index: i32) -> Self {
        Selector::Index(i64::from(index))
    }
}

impl<'a> From<&'a str> for Selector<'a> {
    fn from(word: &'a str) -> Self {
        Selector::Word(word)
    }
}

/// An ordered sequence of non-empty tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Words {
    words: Vec<String>,
    delimiter: char,
}

impl Default for Words {
    fn default() -> Self {
        Self {
            words: Vec::new(),
            delimiter: DEFAULT_WORD_DELIMITER,
        }
    }
}

impl Words {
    /// Tokenize `text` on whitespace.
    pub fn new(text: &str) -> Self {
        Self::with_delimiter(text, DEFAULT_WORD_DELIMITER)
    }

    /// Tokenize `text` on `delimiter` after whitespace normalization.
    pub fn with_delimiter(text: &str, delimiter: char) -> Self {
        Self {
            words: strings::split(text, delimiter),
            delimiter,
        }
    }

    /// Build from several pieces, each tokenized in turn.
    pub fn from_pieces<I, S>(pieces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut words = Self::default();
        for piece in pieces {
            words
                .words
                .extend(strings::split(piece.as_ref(), words.delimiter));
        }
        words
    }

    /// Replace the contents with the tokens of `text`.
    pub fn set(&mut self, text: &str) -> &mut Self {
        self.words = strings::split(text, self.delimiter);
        self
    }

    pub fn count(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    pub fn as_slice(&self) -> &[String] {
        &self.words
    }

    pub fn into_vec(self) -> Vec<String> {
        self.words
    }

    /// All tokens joined with the delimiter.
    pub fn joined(&self) -> String {
        let mut buf = [0u8; 4];
        self.words.join(self.delimiter.encode_utf8(&mut buf))
    }

    /// The tokens at the given signed 1-based indexes, joined. Invalid
    /// indexes are skipped.
    pub fn get(&self, indexes: &[i64]) -> String {
        let mut buf = [0u8; 4];
        let delimiter = self.delimiter.encode_utf8(&mut buf);
        indexes
            .iter()
            .filter_map(|&index| positive_index(index, self.count()))
            .map(|i| self.words[i].as_str())
            .collect::<Vec<_>>()
            .join(delimiter)
    }

    /// Rebuild the sequence from `f`: `None` drops a token, `Some`
    /// replaces it.
    pub fn filter_map<F>(&mut self, mut f: F) -> &mut Self
    where
        F: FnMut(&str, usize) -> Option<String>,
    {
        self.words = self
            .words
            .iter()
            .enumerate()
            .filter_map(|(index, word)| f(word, index))
            .collect();
        self
    }

    /// Token-wise prefix test. An empty prefix never matches.
    pub fn starts_with(&self, prefix: &Words) -> bool {
        if prefix.is_empty() || prefix.count() > self.count() {
            return false;
        }
        prefix.words.iter().zip(&self.words).all(|(p, w)| p == w)
    }

    /// [`starts_with`](Self::starts_with) against tokenized text.
    pub fn starts_with_str(&self, prefix: &str) -> bool {
        self.starts_with(&Words::with_delimiter(prefix, self.delimiter))
    }

    /// Remove tokens by position and by value.
    ///
    /// Positions are resolved against the sequence as it is before any
    /// removal; out-of-range positions are ignored.
    pub fn remove<'a, I>(&mut self, selectors: I) -> &mut Self
    where
        I: IntoIterator<Item = Selector<'a>>,
    {
        let mut indexes = Vec::new();
        let mut values = Vec::new();
        for selector in selectors {
            match selector {
                Selector::Index(index) => indexes.extend(positive_index(index, self.count())),
                Selector::Word(word) => values.push(word),
            }
        }

        insert_sort(&mut indexes);
        for index in no_dup_and_reverse(&indexes) {
            self.words.remove(index);
        }
        for word in values {
            self.words.retain(|w| w != word);
        }
        self
    }

    /// Drop the last token.
    pub fn pop(&mut self) -> Option<String> {
        self.words.pop()
    }
}

impl fmt::Display for Words {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}
