pub mod config;
pub mod core;
pub mod logging;
pub mod storage;

pub use config::{AuthMethod, LogConfig, RemoteConfig, SyncJob};
pub use core::{SyncConfig, SyncEngine, SyncError, SyncReport};
pub use storage::{RemoteStore, SftpStore};
