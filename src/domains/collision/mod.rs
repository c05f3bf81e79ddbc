pub mod auditor;
pub mod polyline;
pub mod segment;

pub use auditor::*;
pub use polyline::*;
pub use segment::*;
