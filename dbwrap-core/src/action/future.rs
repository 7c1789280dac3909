use crate::{DatabaseError, Error, Result, TaskExecutor, log_error};
use futures::{FutureExt, future::BoxFuture};
use std::{
    fmt::{self, Debug},
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use tokio::sync::oneshot;

/// Pending result of an action.
///
/// Resolves exactly once, with the value or with the failure that prevented it. The work runs
/// on the executor it was submitted to whether or not this future is polled.
#[must_use = "the result of the action is lost unless the future is awaited"]
pub struct ActionFuture<T> {
    inner: BoxFuture<'static, Result<T>>,
}

impl<T: Send + 'static> ActionFuture<T> {
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            inner: future.boxed(),
        }
    }

    /// Submits `future` to `executor` and returns the handle to its result.
    ///
    /// A task rejected by the executor resolves immediately with the rejection, a task dropped
    /// before finishing (for example because it panicked) resolves with
    /// [`DatabaseError::Abandoned`].
    pub fn spawn<F>(executor: &dyn TaskExecutor, future: F) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        let task = async move {
            let _ = sender.send(future.await);
        };
        if let Err(e) = executor.execute(task.boxed()) {
            return Self::failed(log_error!(e));
        }
        Self::new(async move {
            receiver
                .await
                .unwrap_or_else(|_| Err(DatabaseError::Abandoned.into()))
        })
    }

    pub fn ready(result: Result<T>) -> Self {
        Self::new(futures::future::ready(result))
    }

    pub fn failed(error: Error) -> Self {
        Self::ready(Err(error))
    }

    /// Transforms the value once available, failures pass through untouched.
    pub fn map<U, F>(self, f: F) -> ActionFuture<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        ActionFuture::new(async move { self.inner.await.map(f) })
    }

    /// Like [`ActionFuture::map`], with a transformation that can fail.
    pub fn and_then<U, F>(self, f: F) -> ActionFuture<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> Result<U> + Send + 'static,
    {
        ActionFuture::new(async move { self.inner.await.and_then(f) })
    }

    /// Replaces a failure with the value computed by `f`.
    pub fn catching<F>(self, f: F) -> ActionFuture<T>
    where
        F: FnOnce(Error) -> T + Send + 'static,
    {
        ActionFuture::new(async move { Ok(self.inner.await.unwrap_or_else(f)) })
    }

    /// Blocks the current thread until the result is available.
    ///
    /// Must not be called from within an asynchronous context, the work itself has to be able
    /// to progress on some other thread.
    pub fn complete(self) -> Result<T> {
        futures::executor::block_on(self.inner)
    }
}

impl<T> Future for ActionFuture<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl<T> Debug for ActionFuture<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionFuture").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::ActionFuture;
    use crate::{DatabaseError, Result, SpawnExecutor, Task, TaskExecutor, error_kind};

    struct Refuse;
    impl TaskExecutor for Refuse {
        fn execute(&self, _task: Task) -> Result<()> {
            Err(DatabaseError::Rejected("refused".into()).into())
        }
    }

    #[tokio::test]
    async fn rejected() {
        let result = ActionFuture::spawn(&Refuse, async { Ok(1) }).await;
        assert!(matches!(
            result.as_ref().map_err(error_kind),
            Err(Some(DatabaseError::Rejected(..)))
        ));
    }

    #[tokio::test]
    async fn abandoned() {
        let result = ActionFuture::spawn(&SpawnExecutor::new(), async {
            if true {
                panic!("boom");
            }
            Ok(1)
        })
        .await;
        assert!(matches!(
            result.as_ref().map_err(error_kind),
            Err(Some(DatabaseError::Abandoned))
        ));
    }

    #[tokio::test]
    async fn transformations() {
        let executor = SpawnExecutor::new();
        let value = ActionFuture::spawn(&executor, async { Ok(20) })
            .map(|v| v + 1)
            .and_then(|v| Ok(v * 2))
            .await
            .unwrap();
        assert_eq!(value, 42);
        let value = ActionFuture::<i32>::failed(DatabaseError::Abandoned.into())
            .catching(|_| -1)
            .await
            .unwrap();
        assert_eq!(value, -1);
    }
}
