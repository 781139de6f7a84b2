pub mod relay;
pub mod test_client;

pub use relay::*;
pub use test_client::*;
