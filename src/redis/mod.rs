mod redis_store;
pub use redis_store::*;

mod redis_lock;
pub use redis_lock::*;
