//! Core ancestry logic
//!
//! The walker, its data model and the metadata sources it resolves through.

pub mod models;
pub mod process_tree;
pub mod source;
