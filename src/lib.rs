pub mod app;
pub mod auth;
pub mod chain;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod resources;

pub use error::{ChainError, Result};
