mod client;
mod client_event;

pub use client::*;
pub use client_event::*;
