//! Registry of cached computations by function identity.
//!
//! The out-of-band executor receives only a function identity string and an
//! argument list, so every computation that participates in revalidation must
//! be registered here at startup, under the same identity on both the serving
//! and the executing side.

use crate::args::Args;
use crate::error::{Error, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// A computation invokable by identity with a validated argument list.
///
/// Implemented for any `Fn(Args) -> Future<Output = Result<Value>>` closure,
/// so plain async functions register directly. Failures should be reported
/// as [`Error::ComputeFailure`].
pub trait CachedFunction: Send + Sync {
    fn call(&self, args: Args) -> BoxFuture<'static, Result<Value>>;
}

impl std::fmt::Debug for dyn CachedFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CachedFunction")
    }
}

impl<F, Fut> CachedFunction for F
where
    F: Fn(Args) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    fn call(&self, args: Args) -> BoxFuture<'static, Result<Value>> {
        (self)(args).boxed()
    }
}

/// Table mapping function identities to their computations.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Arc<dyn CachedFunction>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        FunctionRegistry {
            functions: HashMap::new(),
        }
    }

    /// Register a computation under a unique function identity.
    ///
    /// Registering the same identity twice replaces the earlier entry.
    pub fn register<F>(&mut self, unique_fn_id: impl Into<String>, function: F)
    where
        F: CachedFunction + 'static,
    {
        self.functions
            .insert(unique_fn_id.into(), Arc::new(function));
    }

    /// Look up a computation by identity.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownFunction` if nothing is registered under the
    /// identity.
    pub fn get(&self, unique_fn_id: &str) -> Result<Arc<dyn CachedFunction>> {
        self.functions
            .get(unique_fn_id)
            .cloned()
            .ok_or_else(|| Error::UnknownFunction(unique_fn_id.to_string()))
    }

    pub fn contains(&self, unique_fn_id: &str) -> bool {
        self.functions.contains_key(unique_fn_id)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
