//! Systems - logic that operates on components

mod navigation;
mod surroundings;

pub use navigation::*;
pub use surroundings::*;
