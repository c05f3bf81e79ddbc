pub mod console_logger;
pub mod file_logger;
pub mod multi_logger;
pub mod noop_logger;
pub mod scenario_data;
pub mod schedule_writer;
pub mod tracing_setup;

pub use console_logger::*;
pub use file_logger::*;
pub use multi_logger::*;
pub use noop_logger::*;
pub use scenario_data::*;
pub use schedule_writer::*;
pub use tracing_setup::*;
