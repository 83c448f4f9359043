//! Storage layer for engine state.

mod memory;
mod traits;

pub use memory::MemoryStore;
pub use traits::{AlertFilter, Store};
