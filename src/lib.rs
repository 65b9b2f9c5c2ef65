pub mod chat;
pub mod core;
pub mod edgar;
pub mod render;
pub mod repl;
pub mod utils;

// Re-exports
pub use crate::core::config::FormDConfig;
pub use crate::edgar::filing::FilingRecord;
pub use crate::utils::progress::ProgressTracker;
