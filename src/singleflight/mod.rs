//! Request Coalescing Module
//!
//! Collapses concurrent loads of the same key into a single execution.

mod flight;

pub use flight::Flight;
