//! In-memory session caching.

pub mod session;
