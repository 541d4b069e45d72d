//! The shared library for Conference Central, a conference-management web API.
//!
//! This library holds everything that is independent of the HTTP server: the
//! wire forms exchanged with clients, typed entity keys, the filter compiler,
//! error types and logging setup.

pub mod data;
pub mod errors;
pub mod id;
pub mod log;
pub mod query;

pub use chrono;
pub use serde;
pub use serde_json;
pub use tracing;
pub use tracing::{debug, error, info, trace, warn};
