mod participant_channel;

pub use participant_channel::*;
