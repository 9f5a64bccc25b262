//! Deferred values resolved by the engine

use crate::error::{CloudError, Result};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::fmt;
use std::sync::Arc;
use tokio::sync::oneshot;

/// A value that becomes known once the engine has applied the resource
/// that produces it
///
/// Cloning is cheap and every clone observes the same value. Projections
/// registered with [`Output::apply`] run when the value is first awaited.
#[derive(Clone)]
pub struct Output<T>
where
    T: Clone + Send + Sync + 'static,
{
    name: Arc<str>,
    value: Shared<BoxFuture<'static, Option<T>>>,
}

impl<T> Output<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// An output whose value is already known
    pub fn known(name: impl Into<Arc<str>>, value: T) -> Self {
        Self {
            name: name.into(),
            value: futures_util::future::ready(Some(value)).boxed().shared(),
        }
    }

    /// An output resolved later through the returned resolver
    ///
    /// Dropping the resolver without resolving makes the output fail with
    /// [`CloudError::Unresolved`].
    pub fn pending(name: impl Into<Arc<str>>) -> (Self, OutputResolver<T>) {
        let (tx, rx) = oneshot::channel();
        let output = Self {
            name: name.into(),
            value: rx.map(|received| received.ok()).boxed().shared(),
        };
        (output, OutputResolver { tx })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a projection over the eventual value
    pub fn apply<U, F>(self, f: F) -> Output<U>
    where
        U: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        Output {
            name: self.name.clone(),
            value: self.value.map(move |value| value.map(f)).boxed().shared(),
        }
    }

    /// Wait for the value
    pub async fn resolve(&self) -> Result<T> {
        self.value
            .clone()
            .await
            .ok_or_else(|| CloudError::Unresolved(self.name.to_string()))
    }

    /// The value, if some clone has already awaited it to completion
    pub fn try_get(&self) -> Option<T> {
        self.value.peek().cloned().flatten()
    }
}

impl<T> fmt::Debug for Output<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output")
            .field("name", &self.name)
            .field("resolved", &self.value.peek().is_some())
            .finish()
    }
}

/// Engine-side half of a pending [`Output`]
#[derive(Debug)]
pub struct OutputResolver<T> {
    tx: oneshot::Sender<T>,
}

impl<T> OutputResolver<T> {
    pub fn resolve(self, value: T) {
        // nobody holding the output any more
        let _ = self.tx.send(value);
    }
}
