//! HTTP transport for the rate limiter.
//!
//! A single endpoint, `GET /`, resolves the caller's [`ClientKey`](crate::ratelimit::ClientKey),
//! asks the limiter for a decision and answers `200` with the in-window count
//! or `429` with the body `error`.

mod server;
mod service;

pub use server::HttpServer;
pub use service::{router, REJECTED_BODY};
