extern crate fnv;

pub mod depth;
pub mod effects;
mod runtime;
pub use runtime::*;
