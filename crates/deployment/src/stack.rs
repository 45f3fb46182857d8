use async_trait::async_trait;
use stack_core::PropertyMap;
use std::future::Future;

/// A class-based program: constructing the value registers its resources.
///
/// Resources created inside [`Stack::create`] find their run through
/// [`crate::DeploymentContext::current`].
#[async_trait]
pub trait Stack: Send + Sized + 'static {
    /// Build the stack, registering its resources
    async fn create() -> anyhow::Result<Self>;

    /// Declared outputs of the constructed stack
    fn outputs(&self) -> PropertyMap {
        PropertyMap::new()
    }
}

/// Builds a stack from caller-held dependencies instead of [`Stack::create`].
#[async_trait]
pub trait StackProvider<S: Stack>: Send + 'static {
    /// Build the stack, registering its resources
    async fn provide(self) -> anyhow::Result<S>;
}

#[async_trait]
impl<S, F, Fut> StackProvider<S> for F
where
    S: Stack,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<S>> + Send + 'static,
{
    async fn provide(self) -> anyhow::Result<S> {
        self().await
    }
}
