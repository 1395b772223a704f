//! Audio Data Module
//!
//! In-memory representation of decoded PCM shared by every processing stage.

pub mod buffer;

pub use buffer::{SampleBuffer, SampleFormat};
