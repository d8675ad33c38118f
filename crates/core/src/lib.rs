//! Core library: configuration, session handling, the daily calorie counter
//! and the image analysis flow.

pub mod account;
pub mod analysis;
pub mod analyze;
pub mod app;
pub mod config;
pub mod error;
pub mod progress;
pub mod session;
pub mod state;
