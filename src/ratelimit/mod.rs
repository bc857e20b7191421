//! Rate limiting logic and state management.

mod backend;
mod client;
mod limit;
mod limiter;
mod sweeper;
mod window;

pub use backend::{Admission, AdmissionControl};
pub use client::{ClientKey, FORWARDED_FOR_HEADER, REAL_IP_HEADER};
pub use limit::{Limit, LimitSettings};
pub use limiter::WindowLimiter;
pub use sweeper::spawn_eviction;
pub use window::ClientWindow;
