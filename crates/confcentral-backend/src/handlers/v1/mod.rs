//! Public API handlers, mounted under `/api/v1`.

pub mod announcement;
pub mod conference;
pub mod profile;
pub mod session;
pub mod wishlist;
