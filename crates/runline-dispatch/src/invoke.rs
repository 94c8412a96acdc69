//! The invocation adapter.
//!
//! [`invoke`] calls a [`Command`] with named arguments and always hands back
//! one [`PendingResult`], whichever way the target completes:
//!
//! ```text
//! CommandArgs ─ bind ─▶ PositionalArguments ─▶ Target::Direct    ─ return value ─┐
//!                                            ├▶ Target::Deferred  ─ future ───────┼─▶ PendingResult
//!                                            └▶ Target::Callback  ─ Completion ───┘
//! ```
//!
//! A callback target may also return a future. That future is driven to its
//! end even when the completion settles first, but only the completion
//! decides the result. If the future fails after dropping the completion
//! uncalled, its error is reported instead of the dropped completion.
//!
//! Errors returned by the target, failures passed to its completion, and
//! panics raised while it runs all settle the pending result as an
//! [`InvocationError`]. Nothing escapes the adapter.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::{self, BoxFuture, Either};
use futures::FutureExt;
use tracing::debug;

use crate::args::{CommandArgs, PositionalArguments};
use crate::bind::bind;
use crate::error::InvocationError;
use crate::handler::{
    Command, Completion, CompletionDropped, DeferredOutput, InvocationContext, Output, Target,
};
use crate::introspect::inspect;
use crate::options::Options;

/// The single outcome of one invocation.
///
/// Resolves exactly once, to the target's [`Output`] or an
/// [`InvocationError`]. There is no cancellation and no retry.
#[must_use = "a PendingResult does nothing unless awaited"]
pub struct PendingResult {
    inner: BoxFuture<'static, Result<Output, InvocationError>>,
}

impl PendingResult {
    /// Tracks `fut`. Errors it yields become [`InvocationError`]s; an error
    /// that already is one is kept as is rather than wrapped again.
    pub fn new<F>(fut: F) -> Self
    where
        F: Future<Output = anyhow::Result<Output>> + Send + 'static,
    {
        Self {
            inner: fut.map(|r| r.map_err(InvocationError::new)).boxed(),
        }
    }

    /// An already-settled result.
    pub fn ready(result: Result<Output, InvocationError>) -> Self {
        Self {
            inner: future::ready(result).boxed(),
        }
    }

    /// Converts into a [`DeferredOutput`], so a deferred target can return
    /// another invocation's result and have it chained through.
    pub fn into_deferred(self) -> DeferredOutput {
        self.inner
            .map(|r| r.map_err(anyhow::Error::new))
            .boxed()
    }
}

impl Future for PendingResult {
    type Output = Result<Output, InvocationError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl fmt::Debug for PendingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingResult").finish_non_exhaustive()
    }
}

/// Invokes `command` with `args`, binding an [`InvocationContext`] built
/// from `args` and `options`.
///
/// The target runs synchronously up to its first suspension point before
/// this returns; awaiting the [`PendingResult`] drives the rest.
///
/// ```rust
/// use std::sync::Arc;
/// use runline_dispatch::{invoke, Command, CommandArgs, NamedArguments, Options};
///
/// let hello = Command::direct(&["name"], |_ctx, args| {
///     Ok::<_, anyhow::Error>(args.get(0).unwrap_or("stranger").to_string())
/// });
/// let args = CommandArgs::Named(NamedArguments::from_tokens(["name=World"]));
/// let output = futures::executor::block_on(invoke(&hello, args, Arc::new(Options::default())))?;
/// assert_eq!(output.as_value(), Some(&serde_json::json!("World")));
/// # Ok::<(), runline_dispatch::InvocationError>(())
/// ```
pub fn invoke(command: &Command, args: CommandArgs, options: Arc<Options>) -> PendingResult {
    let info = inspect(command);
    let values = bind(&args, info);
    debug!(
        params = ?info.param_list,
        style = ?command.style(),
        bound = values.len(),
        "invoking target"
    );

    let ctx = InvocationContext::new(args, options);
    let positional = PositionalArguments::new(values);

    match command.target() {
        Target::Direct(f) => PendingResult::ready(call_guarded(|| f(&ctx, positional))),
        Target::Deferred(f) => match call_guarded(|| Ok(f(&ctx, positional))) {
            Ok(fut) => PendingResult::new(guard_future(fut)),
            Err(err) => PendingResult::ready(Err(err)),
        },
        Target::Callback(f) => {
            debug!("target completes through a callback");
            let (completion, mut settled) = Completion::channel();
            let positional = positional.with_completion(completion);

            match call_guarded(|| f(&ctx, positional)) {
                Ok(None) => PendingResult::new(settled),
                Ok(Some(detached)) => PendingResult::new(async move {
                    match future::select(settled, guard_future(detached)).await {
                        Either::Left((result, detached)) => {
                            let _ = detached.await;
                            result
                        }
                        Either::Right((detached, settled)) => match (settled.await, detached) {
                            (Err(dropped), Err(err)) if dropped.is::<CompletionDropped>() => Err(err),
                            (result, _) => {
                                debug!("ignoring future returned by callback target");
                                result
                            }
                        },
                    }
                }),
                // A completion called before the failure still wins.
                Err(err) => match settled.try_settled() {
                    Some(result) => PendingResult::new(future::ready(result)),
                    None => PendingResult::ready(Err(err)),
                },
            }
        }
    }
}

/// Runs a synchronous call, turning both errors and panics into
/// [`InvocationError`]s.
fn call_guarded<T>(f: impl FnOnce() -> anyhow::Result<T>) -> Result<T, InvocationError> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result.map_err(InvocationError::new),
        Err(payload) => Err(InvocationError::msg(panic_message(payload))),
    }
}

/// Drives a target's future, turning a panic into an error.
fn guard_future(fut: DeferredOutput) -> impl Future<Output = anyhow::Result<Output>> + Send {
    AssertUnwindSafe(fut).catch_unwind().map(|result| match result {
        Ok(result) => result,
        Err(payload) => Err(anyhow::Error::msg(panic_message(payload))),
    })
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    let detail = if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    };
    format!("target panicked: {}", detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::NamedArguments;
    use anyhow::anyhow;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    fn named(tokens: &[&str]) -> CommandArgs {
        CommandArgs::Named(NamedArguments::from_tokens(tokens))
    }

    fn options() -> Arc<Options> {
        Arc::new(Options::default())
    }

    #[tokio::test]
    async fn test_direct_returns_42() {
        let cmd = Command::direct(&[], |_ctx, _args| Ok::<_, anyhow::Error>(42));
        let output = invoke(&cmd, named(&[]), options()).await.unwrap();
        assert_eq!(output.as_value(), Some(&json!(42)));
    }

    #[tokio::test]
    async fn test_deferred_returns_42() {
        let cmd = Command::deferred(&[], |_ctx, _args| async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok::<_, anyhow::Error>(42)
        });
        let output = invoke(&cmd, named(&[]), options()).await.unwrap();
        assert_eq!(output.as_value(), Some(&json!(42)));
    }

    #[tokio::test]
    async fn test_callback_returns_42() {
        let cmd = Command::callback(&[], |_ctx, mut args| {
            let done = args.take_completion().expect("completion slot");
            done.call(None, Some(Output::Value(json!(42))));
            Ok::<_, anyhow::Error>(())
        });
        let output = invoke(&cmd, named(&[]), options()).await.unwrap();
        assert_eq!(output.as_value(), Some(&json!(42)));
    }

    #[tokio::test]
    async fn test_callback_completes_later() {
        let cmd = Command::callback(&["n"], |_ctx, mut args| {
            let n: i64 = args.get(0).unwrap_or("0").parse()?;
            let done = args.take_completion().expect("completion slot");
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                done.resolve(n * 2);
            });
            Ok::<_, anyhow::Error>(())
        });
        let output = invoke(&cmd, named(&["n=21"]), options()).await.unwrap();
        assert_eq!(output.as_value(), Some(&json!(42)));
    }

    #[tokio::test]
    async fn test_callback_receives_trailing_slot() {
        let cmd = Command::callback(&["a", "b"], |_ctx, args| {
            assert_eq!(args.len(), 3);
            let (values, completion) = args.into_parts();
            completion.expect("completion slot").resolve(values);
            Ok::<_, anyhow::Error>(())
        });
        let output = invoke(&cmd, named(&["b=2"]), options()).await.unwrap();
        assert_eq!(output.as_value(), Some(&json!([null, "2"])));
    }

    #[tokio::test]
    async fn test_callback_error_first_argument_fails() {
        let cmd = Command::callback(&[], |_ctx, mut args| {
            let done = args.take_completion().expect("completion slot");
            done.call(Some(anyhow!("disk full")), Some(Output::Value(json!(1))));
            Ok::<_, anyhow::Error>(())
        });
        let err = invoke(&cmd, named(&[]), options()).await.unwrap_err();
        assert_eq!(err.to_string(), "disk full");
    }

    #[tokio::test]
    async fn test_callback_takes_precedence_over_returned_future() {
        let ran = Arc::new(AtomicBool::new(false));
        let ran_in_target = ran.clone();
        let target = Target::Callback(Arc::new(
            move |_ctx: &InvocationContext,
                  mut args: PositionalArguments|
                  -> anyhow::Result<Option<DeferredOutput>> {
                let done = args.take_completion().expect("completion slot");
                let ran = ran_in_target.clone();
                let detached: DeferredOutput = async move {
                    ran.store(true, Ordering::SeqCst);
                    Ok(Output::Value(json!("from future")))
                }
                .boxed();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    done.resolve("from callback");
                });
                Ok(Some(detached))
            },
        ));
        let cmd = Command::from_target(&[], target);

        let output = invoke(&cmd, named(&[]), options()).await.unwrap();
        assert_eq!(output.as_value(), Some(&json!("from callback")));
        assert!(ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_callback_ignores_rejected_future() {
        let target = Target::Callback(Arc::new(
            |_ctx: &InvocationContext,
             mut args: PositionalArguments|
             -> anyhow::Result<Option<DeferredOutput>> {
                let done = args.take_completion().expect("completion slot");
                done.resolve(7);
                Ok(Some(async { Err::<Output, _>(anyhow!("ignored")) }.boxed()))
            },
        ));
        let cmd = Command::from_target(&[], target);
        let output = invoke(&cmd, named(&[]), options()).await.unwrap();
        assert_eq!(output.as_value(), Some(&json!(7)));
    }

    fn callback_with_future(
        body: impl Fn(Completion) -> DeferredOutput + Send + Sync + 'static,
    ) -> Command {
        Command::from_target(
            &[],
            Target::Callback(Arc::new(
                move |_ctx: &InvocationContext,
                      mut args: PositionalArguments|
                      -> anyhow::Result<Option<DeferredOutput>> {
                    let done = args.take_completion().expect("completion slot");
                    Ok(Some(body(done)))
                },
            )),
        )
    }

    #[tokio::test]
    async fn test_callback_future_runs_past_completion() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();
        let cmd = callback_with_future(move |done| {
            let flag = flag.clone();
            async move {
                done.resolve("cb");
                tokio::time::sleep(Duration::from_millis(5)).await;
                flag.store(true, Ordering::SeqCst);
                Ok(Output::Undefined)
            }
            .boxed()
        });

        let output = invoke(&cmd, named(&[]), options()).await.unwrap();
        assert_eq!(output.as_value(), Some(&json!("cb")));
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_callback_future_error_reported_when_completion_dropped() {
        let cmd = callback_with_future(|done| {
            async move {
                let _held = done;
                Err(anyhow!("permission denied"))
            }
            .boxed()
        });
        let err = invoke(&cmd, named(&[]), options()).await.unwrap_err();
        assert_eq!(err.to_string(), "permission denied");
    }

    #[tokio::test]
    async fn test_callback_future_panic_reported_when_completion_dropped() {
        let cmd = callback_with_future(|done| {
            async move {
                let _held = done;
                if true {
                    panic!("lost handle");
                }
                Ok(Output::Undefined)
            }
            .boxed()
        });
        let err = invoke(&cmd, named(&[]), options()).await.unwrap_err();
        assert_eq!(err.to_string(), "target panicked: lost handle");
    }

    #[tokio::test]
    async fn test_callback_future_finishing_without_completion_fails() {
        let cmd = callback_with_future(|done| {
            async move {
                drop(done);
                Ok(Output::Value(json!("ignored")))
            }
            .boxed()
        });
        let err = invoke(&cmd, named(&[]), options()).await.unwrap_err();
        assert!(err.inner().is::<CompletionDropped>());
    }

    #[tokio::test]
    async fn test_callback_dropped_completion_fails() {
        let cmd = Command::callback(&[], |_ctx, _args| Ok::<_, anyhow::Error>(()));
        let err = invoke(&cmd, named(&[]), options()).await.unwrap_err();
        assert!(err.to_string().contains("dropped without being called"));
    }

    #[tokio::test]
    async fn test_callback_sync_error_after_completion_keeps_completion() {
        let cmd = Command::callback(&[], |_ctx, mut args| {
            args.take_completion().expect("completion slot").resolve("done");
            Err(anyhow!("late failure"))
        });
        let output = invoke(&cmd, named(&[]), options()).await.unwrap();
        assert_eq!(output.as_value(), Some(&json!("done")));
    }

    #[tokio::test]
    async fn test_callback_sync_error_fails() {
        let cmd = Command::callback(&[], |_ctx, _args| Err(anyhow!("bad input")));
        let err = invoke(&cmd, named(&[]), options()).await.unwrap_err();
        assert_eq!(err.to_string(), "bad input");
    }

    #[tokio::test]
    async fn test_direct_error_is_invocation_error() {
        let cmd = Command::direct(&[], |_ctx, _args| Err::<i32, _>(anyhow!("nope")));
        let err = invoke(&cmd, named(&[]), options()).await.unwrap_err();
        assert_eq!(err.to_string(), "nope");
    }

    #[tokio::test]
    async fn test_deferred_rejection_is_invocation_error() {
        let cmd = Command::deferred(&[], |_ctx, _args| async {
            Err::<i32, _>(anyhow!("rejected"))
        });
        let err = invoke(&cmd, named(&[]), options()).await.unwrap_err();
        assert_eq!(err.to_string(), "rejected");
    }

    #[tokio::test]
    async fn test_direct_panic_is_caught() {
        let cmd = Command::direct(&[], |_ctx, _args| -> anyhow::Result<i32> {
            panic!("kaboom")
        });
        let err = invoke(&cmd, named(&[]), options()).await.unwrap_err();
        assert_eq!(err.to_string(), "target panicked: kaboom");
    }

    #[tokio::test]
    async fn test_deferred_panic_is_caught() {
        let cmd = Command::deferred(&[], |_ctx, _args| async {
            if true {
                panic!("async kaboom");
            }
            Ok::<_, anyhow::Error>(1)
        });
        let err = invoke(&cmd, named(&[]), options()).await.unwrap_err();
        assert_eq!(err.to_string(), "target panicked: async kaboom");
    }

    #[tokio::test]
    async fn test_deferred_chains_pending_result() {
        let inner = Command::direct(&[], |_ctx, _args| Ok::<_, anyhow::Error>("inner"));
        let outer = Command::from_target(
            &[],
            Target::Deferred(Arc::new(move |ctx: &InvocationContext, _args: PositionalArguments| {
                invoke(&inner, CommandArgs::default(), Arc::new(ctx.options().clone()))
                    .into_deferred()
            })),
        );
        let output = invoke(&outer, named(&[]), options()).await.unwrap();
        assert_eq!(output.as_value(), Some(&json!("inner")));
    }

    #[tokio::test]
    async fn test_chained_failure_is_not_double_wrapped() {
        let inner = Command::direct(&[], |_ctx, _args| Err::<i32, _>(anyhow!("deep")));
        let outer = Command::from_target(
            &[],
            Target::Deferred(Arc::new(move |_ctx: &InvocationContext, _args: PositionalArguments| {
                invoke(&inner, CommandArgs::default(), Arc::new(Options::default()))
                    .into_deferred()
            })),
        );
        let err = invoke(&outer, named(&[]), options()).await.unwrap_err();
        assert_eq!(err.to_string(), "deep");
        assert!(err.inner().downcast_ref::<InvocationError>().is_none());
    }

    #[tokio::test]
    async fn test_context_carries_raw_args_and_options() {
        let cmd = Command::direct(&[], |ctx, _args| {
            let named = ctx.named().expect("named args");
            Ok::<_, anyhow::Error>(json!({
                "flag": named.contains("flag"),
                "x": named.get("x"),
                "newline": ctx.options().newline,
            }))
        });
        let output = invoke(&cmd, named(&["flag", "x=1"]), options()).await.unwrap();
        assert_eq!(
            output.as_value(),
            Some(&json!({"flag": true, "x": "1", "newline": true}))
        );
    }

    #[tokio::test]
    async fn test_positional_input_passes_through() {
        let cmd = Command::direct(&["a"], |_ctx, args| {
            Ok::<_, anyhow::Error>(args.values().to_vec())
        });
        let args = CommandArgs::Positional(vec![Some("x".into()), None, Some("z".into())]);
        let output = invoke(&cmd, args, options()).await.unwrap();
        assert_eq!(output.as_value(), Some(&json!(["x", null, "z"])));
    }
}
