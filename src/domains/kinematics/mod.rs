pub mod reachability;
pub mod timing;

pub use reachability::*;
pub use timing::*;
