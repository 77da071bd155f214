pub mod card;
pub mod column;
pub mod stage;

pub use card::{Attachment, Card, CardId, CardPatch, Comment, NewCard, ParseEnumError, Urgency};
pub use column::{Column, ColumnKey, InvalidColumnKey, TitleDraft};
pub use stage::{DEFAULT_STAGES, EmptyStageRing, StageRing, default_columns};
