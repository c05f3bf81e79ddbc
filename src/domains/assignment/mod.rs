pub mod branch_and_bound;
pub mod feasibility;
pub mod model;

pub use branch_and_bound::*;
pub use feasibility::*;
pub use model::*;
