//! Group Module
//!
//! Named cache namespaces: each group couples a loader, a local LRU store,
//! an optional peer picker and a request coalescer.

mod cache_group;
mod getter;
mod registry;

pub use cache_group::{Group, GroupStats};
pub use getter::{Getter, GetterFunc};
pub use registry::GroupRegistry;
