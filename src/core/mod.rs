// src/core/mod.rs
//! Configuration, persisted state and HTTP delivery shared by the components.

pub mod config_manager;
pub mod fs_ops;
pub mod job_store;
pub mod service_client;

pub use config_manager::{ConfigManager, RelayConfig, Timings};
pub use fs_ops::FsOps;
pub use job_store::JobStore;
pub use service_client::DeliveryClient;
