//! Stored data model

mod item;
mod value;

pub use item::*;
pub use value::*;
