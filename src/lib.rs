pub mod config;
pub mod db;
pub mod error;
pub mod ipc;
pub mod logging;
pub mod rollcall;

pub use error::{Result, RollCallError};
