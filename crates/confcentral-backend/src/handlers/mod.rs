pub mod error;
pub mod health;
pub mod internal;
pub mod v1;

pub use error::{ApiError, ApiForm, ApiJson, ApiPath, ApiResult};
