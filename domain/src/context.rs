//! Cancellation and deadline propagation for domain and repository calls.
//!
//! A `Context` is cheap to clone and is passed by reference into every
//! repository operation. Canceling a context also cancels every context
//! derived from it, never the other way around.
use crate::error::Error;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Clone, Debug)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl Context {
    /// A context that is never canceled and has no deadline.
    pub fn background() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    /// A context that ends when `token` is canceled.
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derives a child context. An earlier deadline inherited from `self` wins.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) if current <= deadline => current,
            _ => deadline,
        };

        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fails with `Canceled` or `DeadlineExceeded` once the context has ended.
    pub fn check(&self) -> Result<(), Error> {
        if self.token.is_cancelled() {
            return Err(Error::canceled());
        }

        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Error::deadline_exceeded()),
            _ => Ok(()),
        }
    }

    /// Resolves once the context ends, yielding the reason.
    pub async fn done(&self) -> Error {
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = self.token.cancelled() => Error::canceled(),
                _ = tokio::time::sleep_until(deadline) => Error::deadline_exceeded(),
            },
            None => {
                self.token.cancelled().await;
                Error::canceled()
            }
        }
    }

    /// Runs `fut` unless the context has already ended, abandoning it if the
    /// context ends first.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, Error>>,
    {
        self.check()?;

        tokio::select! {
            biased;
            err = self.done() => Err(err),
            result = fut => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ContextErrorKind, DomainErrorKind};

    fn context_kind(err: Error) -> ContextErrorKind {
        match err.error_kind {
            DomainErrorKind::Context(kind) => kind,
            other => panic!("expected a context error, got {other:?}"),
        }
    }

    #[test]
    fn background_context_is_live() {
        assert!(Context::background().check().is_ok());
    }

    #[test]
    fn canceled_context_fails_check() {
        let ctx = Context::background();
        ctx.cancel();

        assert_eq!(context_kind(ctx.check().unwrap_err()), ContextErrorKind::Canceled);
    }

    #[test]
    fn canceling_a_parent_cancels_derived_contexts_only_downwards() {
        let parent = Context::background();
        let child = parent.with_timeout(Duration::from_secs(60));

        child.cancel();
        assert!(parent.check().is_ok());

        let child = parent.with_timeout(Duration::from_secs(60));
        parent.cancel();
        assert_eq!(
            context_kind(child.check().unwrap_err()),
            ContextErrorKind::Canceled
        );
    }

    #[tokio::test(start_paused = true)]
    async fn earliest_deadline_wins() {
        let outer = Context::background().with_timeout(Duration::from_secs(1));
        let inner = outer.with_timeout(Duration::from_secs(30));

        assert_eq!(inner.deadline(), outer.deadline());
    }

    #[tokio::test(start_paused = true)]
    async fn run_abandons_work_past_the_deadline() {
        let ctx = Context::background().with_timeout(Duration::from_millis(50));

        let result = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;

        assert_eq!(
            context_kind(result.unwrap_err()),
            ContextErrorKind::DeadlineExceeded
        );
    }

    #[tokio::test]
    async fn run_returns_the_result_of_finished_work() {
        let ctx = Context::background();

        let value = ctx.run(async { Ok(7) }).await;

        assert_eq!(value.ok(), Some(7));
    }

    #[tokio::test]
    async fn run_never_starts_work_on_an_ended_context() {
        let ctx = Context::background();
        ctx.cancel();

        let result: Result<(), Error> = ctx.run(async { panic!("must not be polled") }).await;

        assert!(result.is_err());
    }
}
