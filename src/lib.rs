//! Face display library - everything that does not need the ESP32 to run.
//!
//! Rendering, image decoding, the message codec and the reconnect state machine
//! are plain Rust and are tested on the host. The device specific pieces (Wi-Fi,
//! WebSocket client, panel and SD card drivers) are only compiled for ESP-IDF.
//!
//! # Testing
//!
//! Run tests on host with:
//! ```bash
//! cargo test --lib --tests --target x86_64-unknown-linux-gnu
//! ```

// === Pure logic modules (testable on host) ===

// Configuration
pub mod config;

// Drawing
pub mod asset;
pub mod face;
pub mod surface;

// Messaging
pub mod codec;
pub mod connectivity;

pub mod app;
pub mod board;

// === ESP-IDF modules ===

#[cfg(target_os = "espidf")]
pub mod wifi;
#[cfg(target_os = "espidf")]
pub mod ws;
