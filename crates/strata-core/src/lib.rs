pub mod asset;
pub mod compliance;
pub mod config;
pub mod contractor;
pub mod error;
pub mod io;
pub mod paths;
pub mod recurrence;
pub mod schedule;
pub mod store;
pub mod types;
pub mod work_order;

pub use error::{Result, StrataError};
