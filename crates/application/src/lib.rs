//! Tollgate Application - Pipeline orchestration
//!
//! This crate holds the authenticated request pipeline: the token store,
//! the single-flight refresh coordinator, and the pipeline that ties them
//! together. External systems plug in through the ports module.

pub mod config;
pub mod coordinator;
pub mod pipeline;
pub mod ports;
pub mod store;

pub use config::PipelineConfig;
pub use coordinator::RefreshCoordinator;
pub use pipeline::AuthenticatedPipeline;
pub use ports::{
    PersistenceError, RefreshTransport, RefreshedTokens, RequestExecutor, TokenPersistence,
};
pub use store::TokenStore;
