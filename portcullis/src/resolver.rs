//! key lookup for scheme parsers verifying signed credentials
//!
//! Only the synchronous lookup contract lives here. Caching and refreshing
//! keys is up to the implementation.
use std::{collections::HashMap, sync::Arc};

use crate::{context::Context, error::Error};

/// resolves a key id, like the `kid` header of a signed token, to a key
pub trait KeyResolver<K>: Send + Sync {
    fn resolve(&self, ctx: &Context, key_id: &str) -> Result<K, Error>;
}

impl<K> KeyResolver<K> for Box<dyn KeyResolver<K>> {
    fn resolve(&self, ctx: &Context, key_id: &str) -> Result<K, Error> {
        self.as_ref().resolve(ctx, key_id)
    }
}

impl<K> KeyResolver<K> for Arc<dyn KeyResolver<K>> {
    fn resolve(&self, ctx: &Context, key_id: &str) -> Result<K, Error> {
        self.as_ref().resolve(ctx, key_id)
    }
}

impl<K, F> KeyResolver<K> for F
where
    F: Fn(&Context, &str) -> Result<K, Error> + Send + Sync,
{
    fn resolve(&self, ctx: &Context, key_id: &str) -> Result<K, Error> {
        self(ctx, key_id)
    }
}

/// a fixed set of keys
impl<K: Clone + Send + Sync> KeyResolver<K> for HashMap<String, K> {
    fn resolve(&self, ctx: &Context, key_id: &str) -> Result<K, Error> {
        ctx.check()?;
        self.get(key_id)
            .cloned()
            .ok_or_else(|| Error::UnknownKey(key_id.to_string()))
    }
}
