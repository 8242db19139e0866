//! Shared balance constants.

pub mod constants;

pub use constants::*;
