pub mod assignment;
pub mod cell;
pub mod collision;
pub mod kinematics;
pub mod logger;
pub mod scheduling;

pub use logger::*;
