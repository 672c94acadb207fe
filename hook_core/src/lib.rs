#![allow(non_snake_case)]

extern crate fnv;

#[cfg(windows)]
extern crate winapi;

#[macro_use]
extern crate lazy_static;

extern crate global_state;
extern crate hook_registry;
extern crate runtime;
extern crate shared_gl;
extern crate util;

#[macro_use]
mod dispatch;

pub mod context_attribs;
pub mod draw_counts;
pub mod gl_query;
pub mod host;
pub mod init;
pub mod pixel_format;
pub mod promote;

/// Exported GL entries.
pub mod hook_gl;
/// Exported WGL entries.
pub mod hook_wgl;
pub mod proc_address;

#[cfg(test)]
mod test_support;

pub use dispatch::{set_driver, DriverModule};
pub use host::set_host;
