pub mod counter_ops;
pub mod create;

pub use counter_ops::*;
pub use create::*;
