#![allow(non_snake_case)]
#![allow(non_camel_case_types)]

#[macro_use]
extern crate lazy_static;

pub mod defs_gl;
pub mod error;
pub mod types;
pub mod util;
