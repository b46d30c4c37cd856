//! Core types for lendmemo.

mod memo;
mod request;

pub use memo::*;
pub use request::*;
