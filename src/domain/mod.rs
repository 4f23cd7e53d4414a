//! Domain types

pub mod email;

pub use email::*;
