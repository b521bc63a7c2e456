//! Utility helpers

pub mod logger;
