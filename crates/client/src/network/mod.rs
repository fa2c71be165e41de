//! Network subsystem
//!
//! Talks to the USB/IP management backend over its REST interface.

pub mod client;
pub mod error;

// Re-export public types
pub use client::ConsoleClient;
pub use error::ApiError;
