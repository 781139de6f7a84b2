mod backoff;
mod supervisor;

pub use backoff::*;
pub use supervisor::*;
