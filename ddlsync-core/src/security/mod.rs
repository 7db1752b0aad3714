//! Credential protection for connection parameters.
//!
//! - `credentials`: login and password in zeroizing storage
//! - `obfuscation`: reversible password obfuscation for configuration files
//!
//! # Security Guarantees
//! - Plaintext passwords live only inside `Zeroizing` containers
//! - Passwords never appear in logs, `Debug` output or error messages

mod credentials;
mod obfuscation;

pub use credentials::Credentials;
pub use obfuscation::{obscure_password, reveal_password};
