//! Sign Stream: real-time sign-language recognition over WebSocket.

pub mod classifier;
pub mod config;
pub mod error;
pub mod geometry;
pub mod landmarks;
pub mod logging;
pub mod perception;
pub mod stream;
