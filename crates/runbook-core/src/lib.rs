pub mod annotation;
pub mod blocks;
pub mod config;
pub mod context;
pub mod defaults;
pub mod error;
pub mod form;
pub mod io;
pub mod paths;
pub mod runner;
pub mod script;
pub mod session;
pub mod tokenizer;

pub use error::{Result, RunbookError};
