//! Continuous dictation session engine
//!
//! Reconciles a live, restart-prone speech recognizer stream into a single
//! stable transcript, keeps the device awake while listening and exposes a
//! small control surface to the UI.

#![deny(clippy::all)]

pub mod activity;
pub mod config;
pub mod dictation;
mod error;
pub mod platform;
pub mod preferences;
pub mod recognizer;
pub mod storage;

pub use error::AppError;
