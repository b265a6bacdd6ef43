pub mod entity;
pub mod flow;
pub mod graph;
pub mod kind;
pub mod metadata;
pub mod process;
pub mod refs;
pub mod registry;

pub use entity::*;
pub use flow::*;
pub use graph::*;
pub use kind::*;
pub use metadata::*;
pub use process::*;
pub use refs::*;
pub use registry::{FieldDef, FieldShape};
