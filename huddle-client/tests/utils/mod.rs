pub mod loopback_media;
pub mod relay;

pub use loopback_media::*;
pub use relay::*;
