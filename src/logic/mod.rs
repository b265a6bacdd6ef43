pub mod resolve;
pub mod validate;

pub use resolve::*;
pub use validate::*;
