use crate::domains::logger::DomainLogger;
use std::sync::Arc;

/// Fans every message out to a list of loggers, in order.
pub struct MultiLogger {
    sinks: Vec<Arc<dyn DomainLogger>>,
}

impl MultiLogger {
    pub fn new(sinks: Vec<Arc<dyn DomainLogger>>) -> Self {
        Self { sinks }
    }
}

impl DomainLogger for MultiLogger {
    fn info(&self, msg: &str) {
        self.sinks.iter().for_each(|s| s.info(msg));
    }

    fn warn(&self, msg: &str) {
        self.sinks.iter().for_each(|s| s.warn(msg));
    }

    fn error(&self, msg: &str) {
        self.sinks.iter().for_each(|s| s.error(msg));
    }
}

/// File plus console when `path` is given and the file logger initializes,
/// console only otherwise.
pub fn init_run_logger(path: Option<&str>, level: &str, tag: &str) -> Arc<dyn DomainLogger> {
    let console = super::console_logger::init_console_logger(tag);
    match path.map(|p| super::file_logger::init_file_logger(p, level)) {
        Some(Ok(file_logger)) => Arc::new(MultiLogger::new(vec![file_logger, console])),
        Some(Err(e)) => {
            console.warn(&format!("{}; logging to console only", e));
            console
        }
        None => console,
    }
}
