use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Validated column identifier.
///
/// A key is the value stored in a card's `status`. It is never empty and never
/// contains whitespace, so it can round-trip through shells and file formats.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ColumnKey(pub(crate) String);

/// Error returned when a string is not a usable column key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidColumnKey {
    pub value: String,
    pub reason: &'static str,
}

impl fmt::Display for InvalidColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid column key '{}': {}", self.value, self.reason)
    }
}

impl std::error::Error for InvalidColumnKey {}

impl ColumnKey {
    /// Validate an explicit key.
    pub fn parse(value: &str) -> Result<Self, InvalidColumnKey> {
        if value.is_empty() {
            return Err(InvalidColumnKey {
                value: value.to_string(),
                reason: "key must not be empty",
            });
        }
        if value.chars().any(char::is_whitespace) {
            return Err(InvalidColumnKey {
                value: value.to_string(),
                reason: "key must not contain whitespace",
            });
        }
        Ok(Self(value.to_string()))
    }

    /// Derive a key from a column title: lower-cased, words joined by `_`.
    ///
    /// `"Em Teste"` becomes `em_teste`. Titles that are blank after trimming
    /// have no key.
    pub fn from_title(title: &str) -> Result<Self, InvalidColumnKey> {
        let derived = title
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join("_");
        if derived.is_empty() {
            return Err(InvalidColumnKey {
                value: title.to_string(),
                reason: "title has no characters to derive a key from",
            });
        }
        Ok(Self(derived))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ColumnKey {
    type Err = InvalidColumnKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ColumnKey {
    type Error = InvalidColumnKey;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ColumnKey> for String {
    fn from(key: ColumnKey) -> Self {
        key.0
    }
}

impl AsRef<str> for ColumnKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A named bucket of cards sharing one status value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub key: ColumnKey,
    pub title: String,
}

impl Column {
    pub fn new(key: ColumnKey, title: impl Into<String>) -> Self {
        Self {
            key,
            title: title.into(),
        }
    }
}

/// Buffered inline edit of a column title.
///
/// The board is not touched while the draft is open. [`TitleDraft::commit`]
/// yields the new title only when it is non-blank and actually differs;
/// [`TitleDraft::cancel`] hands back the original.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleDraft {
    key: ColumnKey,
    original: String,
    buffer: String,
}

impl TitleDraft {
    #[must_use]
    pub fn begin(column: &Column) -> Self {
        Self {
            key: column.key.clone(),
            original: column.title.clone(),
            buffer: column.title.clone(),
        }
    }

    #[must_use]
    pub const fn key(&self) -> &ColumnKey {
        &self.key
    }

    #[must_use]
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn set(&mut self, text: impl Into<String>) {
        self.buffer = text.into();
    }

    pub fn push(&mut self, ch: char) {
        self.buffer.push(ch);
    }

    pub fn pop(&mut self) {
        self.buffer.pop();
    }

    /// Enter / blur. Returns `(key, new_title)` when there is something to rename.
    #[must_use]
    pub fn commit(self) -> Option<(ColumnKey, String)> {
        let trimmed = self.buffer.trim();
        if trimmed.is_empty() || trimmed == self.original {
            return None;
        }
        Some((self.key, trimmed.to_string()))
    }

    /// Escape. Discards the buffer.
    #[must_use]
    pub fn cancel(self) -> String {
        self.original
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> ColumnKey {
        ColumnKey::parse(s).unwrap()
    }

    #[test]
    fn derives_key_from_title() {
        assert_eq!(ColumnKey::from_title("Em Teste").unwrap(), key("em_teste"));
        assert_eq!(
            ColumnKey::from_title("  Aguardando   Navio ").unwrap(),
            key("aguardando_navio")
        );
        assert_eq!(ColumnKey::from_title("Concluído").unwrap(), key("concluído"));
    }

    #[test]
    fn same_title_derives_same_key() {
        assert_eq!(
            ColumnKey::from_title("Em Teste").unwrap(),
            ColumnKey::from_title("em teste").unwrap()
        );
    }

    #[test]
    fn blank_title_has_no_key() {
        assert!(ColumnKey::from_title("   ").is_err());
        assert!(ColumnKey::from_title("").is_err());
    }

    #[test]
    fn parse_rejects_whitespace_and_empty() {
        assert!(ColumnKey::parse("").is_err());
        assert!(ColumnKey::parse("em teste").is_err());
        assert!(ColumnKey::parse("em\tteste").is_err());
        assert!(ColumnKey::parse("em_teste").is_ok());
    }

    #[test]
    fn key_serializes_as_plain_string() {
        let json = serde_json::to_string(&key("aprovado")).unwrap();
        assert_eq!(json, "\"aprovado\"");
        let back: ColumnKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key("aprovado"));
        assert!(serde_json::from_str::<ColumnKey>("\"has space\"").is_err());
    }

    #[test]
    fn title_draft_commits_changed_title() {
        let column = Column::new(key("aprovado"), "Aprovado");
        let mut draft = TitleDraft::begin(&column);
        draft.set("Aprovado pelo cliente ");
        assert_eq!(
            draft.commit(),
            Some((key("aprovado"), "Aprovado pelo cliente".to_string()))
        );
    }

    #[test]
    fn title_draft_unchanged_or_blank_commits_nothing() {
        let column = Column::new(key("aprovado"), "Aprovado");
        let draft = TitleDraft::begin(&column);
        assert_eq!(draft.commit(), None);

        let mut draft = TitleDraft::begin(&column);
        draft.set("   ");
        assert_eq!(draft.commit(), None);
    }

    #[test]
    fn title_draft_cancel_reverts() {
        let column = Column::new(key("aprovado"), "Aprovado");
        let mut draft = TitleDraft::begin(&column);
        draft.pop();
        draft.push('X');
        assert_eq!(draft.buffer(), "AprovadX");
        assert_eq!(draft.cancel(), "Aprovado");
    }
}
