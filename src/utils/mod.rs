//! Utility modules: persistence helpers and logging setup.

pub mod logging;
pub mod persistence;
