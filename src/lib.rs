pub mod badges;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod placement;
pub mod platform;
pub mod practice;
pub mod profiling;
pub mod store;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod trial;

pub use error::{CoreError, Result};
