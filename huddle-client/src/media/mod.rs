mod webrtc_capability;

pub use webrtc_capability::*;
