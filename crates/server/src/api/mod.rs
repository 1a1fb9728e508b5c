pub mod audit;
pub mod device;
pub mod error;
pub mod game;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod switches;
pub mod ws;

pub use error::ApiError;
pub use routes::create_router;
pub use ws::{WsBroadcaster, WsMessage};
