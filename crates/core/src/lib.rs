//! Inquiry Core Library
//!
//! Foundational utilities shared by every Inquiry crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Layered configuration
//! - Redaction of error detail returned to callers

pub mod config;
pub mod error;
pub mod logging;
pub mod redact;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};
