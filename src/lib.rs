//! Windowgate - Per-client Rolling Window Rate Limiter
//!
//! This crate implements a rate limiter that sits in front of a request handler
//! and rejects a client's requests once it exceeds a quota within a rolling
//! window of whole seconds. Counting state lives in one explicitly owned
//! [`ratelimit::WindowLimiter`] that is shared with the HTTP layer.

pub mod config;
pub mod error;
pub mod http;
pub mod ratelimit;
