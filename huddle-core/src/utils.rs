/// Members admitted to a single session before joins are refused.
pub const DEFAULT_ROOM_CAPACITY: usize = 10;

/// Longest room id the relay accepts, in bytes.
pub const DEFAULT_MAX_ROOM_ID_LEN: usize = 128;

/// Longest participant id a client may propose for itself, in bytes.
pub const MAX_PARTICIPANT_ID_LEN: usize = 64;

/// Length of the tokens minted by [`ParticipantId::generate`](crate::ParticipantId::generate).
pub const GENERATED_PARTICIPANT_ID_LEN: usize = 9;

pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:stun1.l.google.com:19302";
