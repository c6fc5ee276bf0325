//! Step trait and adapters.
//!
//! Steps are the fundamental units of work chained by a
//! [`Pipeline`](crate::pipeline::Pipeline). Each step consumes the previous
//! step's output and the run's cancellation token.

use crate::cancellation::CancelToken;
use async_trait::async_trait;
use std::fmt::Debug;
use std::future::Future;
use std::marker::PhantomData;

/// One unit of asynchronous work in a pipeline.
///
/// A step is invoked at most once per pipeline run and owns no state across
/// runs. Errors are returned as-is; the pipeline surfaces them without
/// rewrapping, so returning a concrete error type keeps it downcastable for
/// the caller.
#[async_trait]
pub trait Step<T: Send + 'static>: Send + Sync + Debug {
    /// Returns the name of the step.
    fn name(&self) -> &str;

    /// Executes the step.
    ///
    /// # Arguments
    ///
    /// * `input` - The previous step's output (or the run's seed value)
    /// * `token` - The cancellation token shared across the run
    async fn run(&self, input: T, token: CancelToken) -> anyhow::Result<T>;
}

/// A step backed by an async closure.
pub struct FnStep<T, F, Fut>
where
    F: Fn(T, CancelToken) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<T>> + Send,
{
    name: String,
    func: F,
    _phantom: PhantomData<fn(T) -> Fut>,
}

impl<T, F, Fut> FnStep<T, F, Fut>
where
    F: Fn(T, CancelToken) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<T>> + Send,
{
    /// Creates a new closure-backed step.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
            _phantom: PhantomData,
        }
    }
}

impl<T, F, Fut> Debug for FnStep<T, F, Fut>
where
    F: Fn(T, CancelToken) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<T>> + Send,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStep").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<T, F, Fut> Step<T> for FnStep<T, F, Fut>
where
    T: Send + 'static,
    F: Fn(T, CancelToken) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<T>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, input: T, token: CancelToken) -> anyhow::Result<T> {
        (self.func)(input, token).await
    }
}

#[async_trait]
impl<T, S> Step<T> for std::sync::Arc<S>
where
    T: Send + 'static,
    S: Step<T> + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn run(&self, input: T, token: CancelToken) -> anyhow::Result<T> {
        (**self).run(input, token).await
    }
}

/// A step that returns its input unchanged.
#[derive(Debug, Clone)]
pub struct PassthroughStep {
    name: String,
}

impl PassthroughStep {
    /// Creates a new passthrough step.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl<T: Send + 'static> Step<T> for PassthroughStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, input: T, _token: CancelToken) -> anyhow::Result<T> {
        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fn_step() {
        let step = FnStep::new("double", |x: i32, _token| async move { Ok(x * 2) });

        assert_eq!(Step::<i32>::name(&step), "double");

        let token = CancelToken::new();
        let output = step.run(21, token).await.expect("step succeeds");
        assert_eq!(output, 42);
    }

    #[tokio::test]
    async fn test_fn_step_error_passes_through() {
        let step = FnStep::new("boom", |_x: i32, _token| async move {
            Err(anyhow::anyhow!("exploded"))
        });

        let token = CancelToken::new();
        let err = step.run(1, token).await.unwrap_err();
        assert_eq!(err.to_string(), "exploded");
    }

    #[tokio::test]
    async fn test_passthrough_step() {
        let step = PassthroughStep::new("noop");

        assert_eq!(Step::<String>::name(&step), "noop");

        let token = CancelToken::new();
        let output = step.run("hello".to_string(), token).await.expect("ok");
        assert_eq!(output, "hello");
    }
}
