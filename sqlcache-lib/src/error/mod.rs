//! Error types

mod cache;

pub use cache::*;
