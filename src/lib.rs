#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![forbid(unsafe_code)]

#[cfg(not(any(feature = "rt-tokio", feature = "rt-smol")))]
compile_error!("damper requires one of the `rt-tokio` or `rt-smol` features");

mod damper;
pub use damper::*;

mod throttle;
pub use throttle::*;

mod debounce;
pub use debounce::*;

mod store;
pub use store::*;

mod lock;
pub use lock::*;

mod local;
pub use local::*;

#[cfg(any(feature = "redis-tokio", feature = "redis-smol"))]
mod redis;
#[cfg(any(feature = "redis-tokio", feature = "redis-smol"))]
pub use redis::*;

mod error;
pub use error::*;

mod common;
pub use common::{DispatchDecision, DispatcherId, KeyPrefix, Settings, SkipReason};

mod runtime;

#[cfg(test)]
mod tests;
