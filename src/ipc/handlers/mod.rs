pub mod config;
pub mod core;
pub mod groups;
pub mod rollcall;
pub mod students;
