//! Query modules.

pub mod metadata;
