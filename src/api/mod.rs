//! HTTP API.
//!
//! Exposes the diagnosis, chat and checker operations as JSON / streaming
//! endpoints under `/api/`. `api_router()` returns a composable `Router`;
//! `start_server()` binds it and runs it until shutdown is signalled.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::{api_router, build_router};
pub use server::{start_server, ApiServer, ServerError, ServerSession};
pub use types::ApiContext;
