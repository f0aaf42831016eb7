// Public API for integration tests and potential library usage

pub mod config;
pub mod engine;
pub mod questions;
pub mod session;
pub mod store;
pub mod types;
