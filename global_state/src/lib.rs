#[macro_use]
extern crate lazy_static;

extern crate fnv;

mod global_state;
/// Platform queries the lifecycle needs from the host.
pub mod host;
pub mod lifecycle;
pub mod share;
pub use global_state::*;
