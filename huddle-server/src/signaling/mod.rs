mod channel_handler;
mod dispatcher;
mod relay_service;
mod ws_handler;

pub use channel_handler::*;
pub use dispatcher::*;
pub use relay_service::*;
pub use ws_handler::*;
