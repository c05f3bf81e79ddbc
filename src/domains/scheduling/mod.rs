pub mod path_builder;
pub mod reservation;
pub mod schedule;

pub use path_builder::*;
pub use reservation::*;
pub use schedule::*;
