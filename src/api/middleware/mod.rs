//! HTTP middleware. Only access logging for now; CORS comes from tower-http.

pub mod audit;
