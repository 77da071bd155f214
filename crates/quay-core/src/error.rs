use std::fmt;

/// Machine-readable error codes for scripts and agents driving the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    AlreadyInitialized,
    CardNotFound,
    ColumnNotFound,
    DuplicateColumn,
    ColumnNotEmpty,
    InvalidColumnKey,
    EmptyTitle,
    NoColumns,
    CorruptBoard,
    BoardWriteFailed,
    LockContention,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::AlreadyInitialized => "E1003",
            Self::CardNotFound => "E2001",
            Self::ColumnNotFound => "E2002",
            Self::DuplicateColumn => "E2003",
            Self::ColumnNotEmpty => "E2004",
            Self::InvalidColumnKey => "E2005",
            Self::EmptyTitle => "E2006",
            Self::NoColumns => "E2007",
            Self::CorruptBoard => "E3001",
            Self::BoardWriteFailed => "E5001",
            Self::LockContention => "E5002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Board not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::AlreadyInitialized => "Board already initialized",
            Self::CardNotFound => "Card not found",
            Self::ColumnNotFound => "Column not found",
            Self::DuplicateColumn => "Column key already exists",
            Self::ColumnNotEmpty => "Column still has cards",
            Self::InvalidColumnKey => "Invalid column key",
            Self::EmptyTitle => "Title must not be blank",
            Self::NoColumns => "Board has no columns",
            Self::CorruptBoard => "Corrupt board file",
            Self::BoardWriteFailed => "Board file write failed",
            Self::LockContention => "Lock contention",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `quay init` to create a board in this directory."),
            Self::ConfigParseError => Some("Fix syntax in .quay/config.toml and retry."),
            Self::AlreadyInitialized => Some("Use `quay init --force` to start a fresh board."),
            Self::CardNotFound => Some("List cards with `quay card list`."),
            Self::ColumnNotFound => Some("List columns with `quay column list`."),
            Self::DuplicateColumn => {
                Some("Pick a different title, or rename the existing column instead.")
            }
            Self::ColumnNotEmpty => {
                Some("Move or delete the column's cards before removing it.")
            }
            Self::InvalidColumnKey => Some("Column keys must be non-empty and contain no spaces."),
            Self::EmptyTitle => None,
            Self::NoColumns => Some("Add a column with `quay column add <TITLE>` first."),
            Self::CorruptBoard => Some("Restore .quay/board.json from version control or backup."),
            Self::BoardWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => Some("Retry after the other `quay` process releases its lock."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
