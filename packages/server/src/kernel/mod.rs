//! Kernel module - server infrastructure and dependencies.

pub mod analyzer_client;
pub mod deps;
pub mod sheets_client;
pub mod test_dependencies;
pub mod traits;

pub use analyzer_client::HttpAnalyzer;
pub use deps::{SensAdapter, ServerDeps};
pub use sheets_client::SheetsBridgeClient;
pub use traits::*;
