//! # ferry-core
//!
//! Core types for the Ferry online migration engine.
//! Errors, configuration, tracing setup, constants, and the typed
//! notification registry shared by the storage layer.

pub mod config;
pub mod constants;
pub mod errors;
pub mod events;
pub mod tracing;
