use super::column::ColumnKey;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Board-allocated card identifier. Never reused after deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub u64);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CardId {
    type Err = ParseEnumError;

    /// Accepts `12` or `#12`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        digits.parse::<u64>().map(Self).map_err(|_| ParseEnumError {
            expected: "card id",
            got: s.to_string(),
        })
    }
}

/// How pressing a card is. Ordered from least to most urgent.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

impl Urgency {
    pub const ALL: [Self; 4] = [Self::Low, Self::Normal, Self::High, Self::Critical];

    const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl FromStr for Urgency {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" | "baixa" => Ok(Self::Low),
            "normal" | "media" | "média" => Ok(Self::Normal),
            "high" | "alta" => Ok(Self::High),
            "critical" | "urgente" => Ok(Self::Critical),
            _ => Err(ParseEnumError {
                expected: "urgency",
                got: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub author: String,
    pub body: String,
    pub at: DateTime<Utc>,
}

/// Reference to a document kept elsewhere (path or URL).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub location: String,
}

/// One tracked service request on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub status: ColumnKey,
    pub client: String,
    pub service: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub urgency: Urgency,
    pub requested_on: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_on: Option<NaiveDate>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Card {
    /// One-line label used by list and board views.
    #[must_use]
    pub fn headline(&self) -> String {
        format!("{} - {}", self.client, self.service)
    }

    /// True when a due date exists and lies before `today`.
    #[must_use]
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.due_on.is_some_and(|due| due < today)
    }
}

/// Form contents for a new card. `status: None` places it in the first column.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewCard {
    pub client: String,
    pub service: String,
    pub description: Option<String>,
    pub urgency: Urgency,
    pub requested_on: Option<NaiveDate>,
    pub due_on: Option<NaiveDate>,
    pub status: Option<ColumnKey>,
}

/// Field edits applied by the edit form. `None` leaves a field untouched.
///
/// `description` and `due_on` are doubly optional so they can be cleared.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CardPatch {
    pub client: Option<String>,
    pub service: Option<String>,
    pub description: Option<Option<String>>,
    pub urgency: Option<Urgency>,
    pub requested_on: Option<NaiveDate>,
    pub due_on: Option<Option<NaiveDate>>,
    pub status: Option<ColumnKey>,
}

impl CardPatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.client.is_none()
            && self.service.is_none()
            && self.description.is_none()
            && self.urgency.is_none()
            && self.requested_on.is_none()
            && self.due_on.is_none()
            && self.status.is_none()
    }
}
