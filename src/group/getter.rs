//! Loader capability for cache misses.

use async_trait::async_trait;

// == Getter ==
/// Produces the value for a key that no cache holds.
///
/// Errors are handed back to the caller of [`Group::get`](crate::group::Group::get)
/// unchanged and are never cached.
#[async_trait]
pub trait Getter: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Vec<u8>>;
}

/// Adapts a plain closure into a [`Getter`].
pub struct GetterFunc<F>(F);

impl<F> GetterFunc<F>
where
    F: Fn(&str) -> anyhow::Result<Vec<u8>> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> Getter for GetterFunc<F>
where
    F: Fn(&str) -> anyhow::Result<Vec<u8>> + Send + Sync,
{
    async fn get(&self, key: &str) -> anyhow::Result<Vec<u8>> {
        (self.0)(key)
    }
}
