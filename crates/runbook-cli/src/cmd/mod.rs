pub mod config;
pub mod defaults;
pub mod exec;
pub mod list;
