use thiserror::Error;

/// Kind of entity an identifier refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Voice,
    Broadcast,
    Line,
    Channel,
    RecordedMedia,
    Cd,
    VhsTape,
}

impl EntityKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Voice => "voice",
            Self::Broadcast => "broadcast",
            Self::Line => "line",
            Self::Channel => "channel",
            Self::RecordedMedia => "recorded media",
            Self::Cd => "cd",
            Self::VhsTape => "vhs tape",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("invalid color {value:?}: {reason}")]
    InvalidColor { value: String, reason: &'static str },
    #[error("invalid guid {0:?}")]
    InvalidGuid(String),
    #[error("invalid {kind} id {value:?}")]
    InvalidId { kind: EntityKind, value: String },
    #[error("duplicate {kind} id {id}")]
    DuplicateId { kind: EntityKind, id: String },
    #[error("duplicate guid {0}")]
    DuplicateGuid(String),
    #[error("unresolved {kind} reference {id}")]
    UnresolvedReference { kind: EntityKind, id: String },
}

pub type Result<T> = std::result::Result<T, ModelError>;
