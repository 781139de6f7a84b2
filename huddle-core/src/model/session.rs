use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Room name chosen by the joining client. Only its length is ever checked.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn parse(raw: &str, max_len: usize) -> Result<Self, ProtocolError> {
        Self::from(raw).validated(max_len)
    }

    pub fn validated(self, max_len: usize) -> Result<Self, ProtocolError> {
        let len = self.0.len();
        if len == 0 || len > max_len {
            return Err(ProtocolError::InvalidRoomId { len, max: max_len });
        }
        Ok(self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
