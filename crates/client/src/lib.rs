//! usbip-console client library
//!
//! Configuration, the REST client for the USB/IP management backend, and
//! the terminal console built on top of them. The `usbip-console` binary
//! wires these together.

pub mod config;
pub mod network;
pub mod tui;
