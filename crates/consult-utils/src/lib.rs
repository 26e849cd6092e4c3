//! Shared utilities for consult-rs
//!
//! This crate provides common functionality used across the consult-rs workspace,
//! including logging setup, `.env` loading, and application configuration.

pub mod config;
pub mod env;
pub mod logging;

pub use config::AppConfig;
pub use env::{env_var, env_var_or, load_dotenv};
pub use logging::{LogFormat, init_tracing};
