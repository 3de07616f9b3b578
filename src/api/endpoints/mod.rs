//! API endpoint handlers.
//!
//! Handlers translate HTTP bodies into pipeline calls and pipeline errors
//! into `ApiError`. They hold no state beyond the shared `ApiContext`.

pub mod chat;
pub mod checker;
pub mod diagnose;
pub mod health;
