pub mod engine;
pub mod index;
pub mod planner;
pub mod scanner;

pub use engine::{SyncConfig, SyncEngine, SyncError, SyncReport};
pub use index::{IndexBuilder, INDEX_FILE_NAME};
pub use planner::{SyncDecision, SyncPlanner};
pub use scanner::{FileScanner, LocalFile, ScanConfig};
