mod memory_store;
pub use memory_store::*;

mod memory_lock;
pub use memory_lock::*;
