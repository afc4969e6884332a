//! Tollgate Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer: a reqwest-backed request executor
//! and refresh transport, and a file-backed token persistence medium.

pub mod http;
pub mod persistence;

pub use http::{HttpRefreshTransport, ReqwestRequestExecutor};
pub use persistence::FileTokenPersistence;
