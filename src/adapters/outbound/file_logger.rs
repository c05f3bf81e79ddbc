use crate::domains::logger::{DomainLogger, FileLogger};
use std::sync::Arc;

/// Parses a level name from configuration, defaulting to `Info`.
pub fn parse_level(level: &str) -> log::LevelFilter {
    level.parse().unwrap_or(log::LevelFilter::Info)
}

/// Initialize the file logger and return a domain logger the application can inject.
pub fn init_file_logger(path: &str, level: &str) -> Result<Arc<dyn DomainLogger>, String> {
    FileLogger::init(path, parse_level(level)).map_err(|e| format!("Failed to initialize fast_log: {}", e))?;
    Ok(Arc::new(FileLogger))
}
