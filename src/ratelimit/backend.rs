//! Admission control trait for abstracting limiter implementations.

/// Outcome of a single admission decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    /// Whether the request may proceed
    pub allowed: bool,
    /// Requests counted in the client's current window, or 0 when rejected
    pub count: u64,
}

impl Admission {
    /// An admitted request with the client's in-window count.
    pub fn allowed(count: u64) -> Self {
        Self {
            allowed: true,
            count,
        }
    }

    /// A rejected request. Rejections never report a count.
    pub fn rejected() -> Self {
        Self {
            allowed: false,
            count: 0,
        }
    }
}

/// Trait for admission control implementations.
///
/// The HTTP layer is generic over this trait so it can be driven by the
/// [`WindowLimiter`](super::WindowLimiter) or by a test double.
pub trait AdmissionControl: Send + Sync {
    /// Record a request from `key` at the current instant and decide whether to admit it.
    fn admit(&self, key: &str) -> Admission;
}
