mod capability;
mod coordinator;
mod peer_link;

pub use capability::*;
pub use coordinator::*;
pub use peer_link::*;
