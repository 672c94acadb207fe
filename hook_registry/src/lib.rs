#[macro_use]
extern crate lazy_static;

extern crate fnv;

mod registry;
/// Interception of virtual dispatch table slots.
pub mod vtable;
pub use registry::*;
