pub mod archive;
pub mod entity_cache;
pub mod entity_store;
pub mod ipc;
pub mod traits;

pub use archive::*;
pub use entity_cache::*;
pub use entity_store::*;
pub use ipc::*;
pub use traits::*;
