//! Board support for the TTGO T5 V2.3

pub mod pins;

pub mod display;
#[cfg(target_os = "espidf")]
pub mod sdcard;

pub use pins::Pins;
