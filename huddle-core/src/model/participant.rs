use crate::error::ProtocolError;
use crate::utils::{GENERATED_PARTICIPANT_ID_LEN, MAX_PARTICIPANT_ID_LEN};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque identity of one relay connection.
///
/// The relay mints one per connection attempt and stamps it onto every routed
/// message as `from`. Values read off the wire are accepted as-is; use
/// [`ParticipantId::parse`] when an id proposed by a client must be checked.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Mint a short random token.
    pub fn generate() -> Self {
        let token = Uuid::new_v4()
            .simple()
            .to_string()
            .chars()
            .take(GENERATED_PARTICIPANT_ID_LEN)
            .collect();
        Self(token)
    }

    /// Accept a client-proposed id: 1..=64 ASCII alphanumerics, `-` or `_`.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let well_formed = !raw.is_empty()
            && raw.len() <= MAX_PARTICIPANT_ID_LEN
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        if well_formed {
            Ok(Self(raw.to_owned()))
        } else {
            Err(ProtocolError::InvalidParticipantId(raw.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
