//! One canonical program shape.
//!
//! Every accepted program form (plain action, output-returning function, their
//! async variants, and class-based stacks) reduces to a [`Callback`]: a one-shot
//! async operation yielding the run's output map.

use futures::future::BoxFuture;
use futures::FutureExt;
use stack_core::PropertyMap;
use std::fmt;
use std::future::Future;

use crate::stack::{Stack, StackProvider};

pub type CallbackFuture = BoxFuture<'static, anyhow::Result<PropertyMap>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackKind {
    /// A free function; the runner wraps it in a root resource.
    Function,
    /// A class-based stack; it is its own root.
    Stack,
}

impl CallbackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Stack => "stack",
        }
    }
}

pub struct Callback {
    kind: CallbackKind,
    body: Box<dyn FnOnce() -> CallbackFuture + Send>,
}

impl Callback {
    fn new<F>(kind: CallbackKind, body: F) -> Self
    where
        F: FnOnce() -> CallbackFuture + Send + 'static,
    {
        Self {
            kind,
            body: Box::new(body),
        }
    }

    /// A synchronous action with no outputs.
    pub fn from_action<F>(action: F) -> Self
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        Self::new(CallbackKind::Function, move || {
            async move {
                action()?;
                Ok::<_, anyhow::Error>(PropertyMap::new())
            }
            .boxed()
        })
    }

    /// A synchronous function returning outputs.
    pub fn from_fn<F>(function: F) -> Self
    where
        F: FnOnce() -> anyhow::Result<PropertyMap> + Send + 'static,
    {
        Self::new(CallbackKind::Function, move || {
            async move { function() }.boxed()
        })
    }

    /// An async action with no outputs.
    pub fn from_async_action<F, Fut>(action: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::new(CallbackKind::Function, move || {
            async move {
                action().await?;
                Ok::<_, anyhow::Error>(PropertyMap::new())
            }
            .boxed()
        })
    }

    /// An async function returning outputs.
    pub fn from_async_fn<F, Fut>(function: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<PropertyMap>> + Send + 'static,
    {
        Self::new(CallbackKind::Function, move || function().boxed())
    }

    /// Construct `S` with [`Stack::create`] and read its outputs.
    pub fn from_stack<S: Stack>() -> Self {
        Self::new(CallbackKind::Stack, || {
            async {
                let stack = S::create().await?;
                Ok::<_, anyhow::Error>(stack.outputs())
            }
            .boxed()
        })
    }

    /// Construct `S` through `provider` and read its outputs.
    pub fn from_stack_with<S, P>(provider: P) -> Self
    where
        S: Stack,
        P: StackProvider<S>,
    {
        Self::new(CallbackKind::Stack, move || {
            async move {
                let stack = provider.provide().await?;
                Ok::<_, anyhow::Error>(stack.outputs())
            }
            .boxed()
        })
    }

    pub fn kind(&self) -> CallbackKind {
        self.kind
    }

    /// Start the user program. Errors it raises come back unchanged.
    pub fn invoke(self) -> CallbackFuture {
        (self.body)()
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug, thiserror::Error)]
    #[error("bucket quota exceeded")]
    struct QuotaError;

    struct Site {
        url: String,
    }

    #[async_trait::async_trait]
    impl Stack for Site {
        async fn create() -> anyhow::Result<Self> {
            Ok(Self {
                url: "https://site.test".to_string(),
            })
        }

        fn outputs(&self) -> PropertyMap {
            PropertyMap::from([("url".to_string(), json!(self.url))])
        }
    }

    fn ab() -> PropertyMap {
        PropertyMap::from([("a".to_string(), json!(1)), ("b".to_string(), json!(2))])
    }

    #[tokio::test]
    async fn test_actions_yield_empty_outputs() {
        let sync = Callback::from_action(|| Ok(()));
        let asynchronous = Callback::from_async_action(|| async { Ok(()) });

        assert_eq!(sync.kind(), CallbackKind::Function);
        assert!(sync.invoke().await.unwrap().is_empty());
        assert!(asynchronous.invoke().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_functions_forward_outputs() {
        let sync = Callback::from_fn(|| Ok(ab()));
        let asynchronous = Callback::from_async_fn(|| async { Ok(ab()) });

        assert_eq!(sync.invoke().await.unwrap(), ab());
        assert_eq!(asynchronous.invoke().await.unwrap(), ab());
    }

    #[tokio::test]
    async fn test_stack_outputs() {
        let callback = Callback::from_stack::<Site>();
        assert_eq!(callback.kind(), CallbackKind::Stack);

        let outputs = callback.invoke().await.unwrap();
        assert_eq!(outputs.get("url"), Some(&json!("https://site.test")));

        let provided = Callback::from_stack_with::<Site, _>(|| async {
            Ok(Site {
                url: "https://other.test".to_string(),
            })
        });
        let outputs = provided.invoke().await.unwrap();
        assert_eq!(outputs.get("url"), Some(&json!("https://other.test")));
    }

    #[tokio::test]
    async fn test_user_error_propagates_unchanged() {
        let callback = Callback::from_async_action(|| async { Err(anyhow::Error::new(QuotaError)) });

        let err = callback.invoke().await.unwrap_err();
        assert!(err.downcast_ref::<QuotaError>().is_some());
    }

    #[tokio::test]
    async fn test_body_runs_once_and_lazily() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let callback = Callback::from_action(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        let future = callback.invoke();
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        future.await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
