//! HTTP API: router, handlers, envelopes and the server entry point.

pub mod error;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod server;
pub mod upload;

pub use error::ApiError;
pub use response::ApiResponse;
pub use routes::{build_router, ApiState};
pub use server::start_api_server;
