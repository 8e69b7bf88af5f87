//! Core traits for types taking part in injection.

mod dispose;
mod injectable;

pub use dispose::{Dispose, Initialize};
pub use injectable::{Injectable, Upcast};
