use crate::domains::logger::DomainLogger;
use std::sync::Arc;

/// Writes planning progress to the terminal, tagged with the cell name.
struct ConsoleBridge {
    tag: String,
}

impl DomainLogger for ConsoleBridge {
    fn info(&self, msg: &str) {
        eprintln!("[{}] {}", self.tag, msg);
    }
    fn warn(&self, msg: &str) {
        eprintln!("[{}] WARN: {}", self.tag, msg);
    }
    fn error(&self, msg: &str) {
        eprintln!("[{}] ERROR: {}", self.tag, msg);
    }
}

/// Console-backed DomainLogger, also the fallback when the file logger
/// cannot be initialized.
pub fn init_console_logger(tag: &str) -> Arc<dyn DomainLogger> {
    Arc::new(ConsoleBridge { tag: tag.to_string() })
}
