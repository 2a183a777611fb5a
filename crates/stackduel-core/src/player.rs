use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity assigned to a connection when it is accepted. Never reused
/// within a process, independent of the transport's own handles.
pub type ParticipantId = u64;

/// Identifier of a two-player game session (the `gameId` on the wire).
pub type SessionId = Uuid;

/// Default maximum display name length, in characters.
pub const DEFAULT_MAX_NAME_LEN: usize = 32;

/// A connected client that has announced a display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
}

impl Participant {
    pub fn new(id: ParticipantId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Reasons a display name is refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("Please enter a name")]
    Empty,
    #[error("Name must be at most {max} characters")]
    TooLong { max: usize },
    #[error("Name contains invalid characters")]
    InvalidCharacters,
}

/// Trim and validate a display name. Returns the name as it should be shown.
pub fn normalize_display_name(raw: &str, max_len: usize) -> Result<String, NameError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(NameError::Empty);
    }
    if name.chars().count() > max_len {
        return Err(NameError::TooLong { max: max_len });
    }
    if name.chars().any(char::is_control) {
        return Err(NameError::InvalidCharacters);
    }
    Ok(name.to_string())
}
