//! # KitaDoc Common Library
//!
//! Shared code for the KitaDoc documentation service including:
//! - Record models (patients, groups, documentation)
//! - Record stores with pluggable persistence
//! - Configuration loading and data folder resolution
//! - ID and timestamp utilities

pub mod config;
pub mod error;
pub mod ids;
pub mod models;
pub mod store;
pub mod time;

pub use error::{Error, Result};
