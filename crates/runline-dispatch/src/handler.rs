//! Target callables and what they produce.
//!
//! A target is an ordinary function that was never written with a CLI in
//! mind. It comes in one of three completion styles, modelled as the
//! variants of [`Target`]:
//!
//! | Variant | Signature | Completes by |
//! |---------|-----------|--------------|
//! | `Direct` | `Fn(&InvocationContext, PositionalArguments) -> Result<Output>` | returning |
//! | `Deferred` | `Fn(&InvocationContext, PositionalArguments) -> DeferredOutput` | its future resolving |
//! | `Callback` | `Fn(&InvocationContext, PositionalArguments) -> Result<Option<DeferredOutput>>` | calling the [`Completion`] in its last slot |
//!
//! Parameter names cannot be recovered from a compiled function, so a
//! [`Command`] carries them explicitly next to the target. The
//! `#[command]` macro in `runline-macros` fills them in from the signature.
//!
//! # Context
//!
//! Instead of reading an ambient receiver, every target gets the
//! [`InvocationContext`] as an explicit first argument. It exposes the raw
//! [`CommandArgs`] and the run's [`Options`].

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use anyhow::{anyhow, Context as _};
use futures::channel::oneshot;
use futures::future::BoxFuture;
use futures::stream::{BoxStream, Stream, StreamExt};
use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::args::{CommandArgs, NamedArguments, PositionalArguments};
use crate::introspect::{CompletionStyle, ParameterInfo};
use crate::options::Options;

/// What a target produces.
pub enum Output {
    /// A materialized JSON value.
    Value(Value),
    /// A lazy sequence, drained by the normalizer before printing.
    Stream(BoxStream<'static, anyhow::Result<Value>>),
    /// No value at all (the target returned `()`).
    Undefined,
}

impl Output {
    /// Serializes `value` into an [`Output::Value`].
    pub fn value<T: Serialize>(value: T) -> anyhow::Result<Self> {
        let value = serde_json::to_value(value).context("result is not JSON-serializable")?;
        Ok(Output::Value(value))
    }

    /// Wraps a stream of serializable items.
    pub fn stream<S, T>(items: S) -> Self
    where
        S: Stream<Item = T> + Send + 'static,
        T: Serialize,
    {
        Output::Stream(
            items
                .map(|item| serde_json::to_value(item).context("stream item is not JSON-serializable"))
                .boxed(),
        )
    }

    /// Wraps a stream of fallible items. The first error fails the drain.
    pub fn try_stream<S, T, E>(items: S) -> Self
    where
        S: Stream<Item = Result<T, E>> + Send + 'static,
        T: Serialize,
        E: Into<anyhow::Error>,
    {
        Output::Stream(
            items
                .map(|item| {
                    let item = item.map_err(Into::<anyhow::Error>::into)?;
                    serde_json::to_value(item).context("stream item is not JSON-serializable")
                })
                .boxed(),
        )
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, Output::Stream(_))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Output::Undefined)
    }

    /// Returns the value if this is a materialized value.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Output::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Output::Stream(_) => f.write_str("Stream(..)"),
            Output::Undefined => f.write_str("Undefined"),
        }
    }
}

impl From<Value> for Output {
    fn from(value: Value) -> Self {
        Output::Value(value)
    }
}

/// Conversion from a target's native return type into [`Output`].
///
/// `Result<T, E>` with a serializable `T` becomes [`Output::Value`];
/// `Result<Output, E>` passes through for targets that stream or return
/// nothing.
pub trait IntoOutput {
    fn into_output(self) -> anyhow::Result<Output>;
}

impl<T, E> IntoOutput for Result<T, E>
where
    T: Serialize,
    E: Into<anyhow::Error>,
{
    fn into_output(self) -> anyhow::Result<Output> {
        Output::value(self.map_err(Into::<anyhow::Error>::into)?)
    }
}

impl<E: Into<anyhow::Error>> IntoOutput for Result<Output, E> {
    fn into_output(self) -> anyhow::Result<Output> {
        self.map_err(Into::into)
    }
}

/// Conversion from a raw bound slot into a typed parameter.
///
/// The binder never fails, so a missing or malformed value only surfaces
/// here, as an invocation error, when the target asks for a type that
/// cannot represent it.
pub trait FromArg: Sized {
    fn from_arg(name: &str, raw: Option<String>) -> anyhow::Result<Self>;
}

fn require(name: &str, raw: Option<String>) -> anyhow::Result<String> {
    raw.ok_or_else(|| anyhow!("missing value for argument \"{}\"", name))
}

impl FromArg for String {
    fn from_arg(name: &str, raw: Option<String>) -> anyhow::Result<Self> {
        require(name, raw)
    }
}

impl FromArg for Value {
    /// JSON text is parsed; anything else becomes a JSON string.
    fn from_arg(name: &str, raw: Option<String>) -> anyhow::Result<Self> {
        let raw = require(name, raw)?;
        Ok(serde_json::from_str(&raw).unwrap_or(Value::String(raw)))
    }
}

impl<T: FromArg> FromArg for Option<T> {
    fn from_arg(name: &str, raw: Option<String>) -> anyhow::Result<Self> {
        match raw {
            None => Ok(None),
            Some(raw) => T::from_arg(name, Some(raw)).map(Some),
        }
    }
}

macro_rules! impl_from_arg_parse {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromArg for $ty {
                fn from_arg(name: &str, raw: Option<String>) -> anyhow::Result<Self> {
                    let raw = require(name, raw)?;
                    raw.parse::<$ty>().with_context(|| {
                        format!("invalid value {:?} for argument \"{}\"", raw, name)
                    })
                }
            }
        )*
    };
}

impl_from_arg_parse!(bool, char, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

/// The callback appended to a callback-style target's arguments.
///
/// Consuming `self` on every settling method means a target can complete at
/// most once. Dropping it without calling it fails the invocation instead of
/// leaving it pending forever.
pub struct Completion {
    tx: oneshot::Sender<anyhow::Result<Output>>,
}

impl Completion {
    /// Creates a completion and the settlement it feeds.
    pub fn channel() -> (Completion, Settlement) {
        let (tx, rx) = oneshot::channel();
        (Completion { tx }, Settlement { rx })
    }

    /// Error-first completion: any error fails, otherwise `value` succeeds.
    ///
    /// A missing value settles as [`Output::Undefined`].
    pub fn call(self, err: Option<anyhow::Error>, value: Option<Output>) {
        match err {
            Some(err) => self.settle(Err(err)),
            None => self.settle(Ok(value.unwrap_or(Output::Undefined))),
        }
    }

    pub fn settle(self, result: anyhow::Result<Output>) {
        // The receiver is gone only if the invocation was abandoned.
        let _ = self.tx.send(result);
    }

    pub fn ok(self, output: Output) {
        self.settle(Ok(output));
    }

    /// Succeeds with a serializable value.
    pub fn resolve<T: Serialize>(self, value: T) {
        self.settle(Output::value(value));
    }

    pub fn fail(self, err: impl Into<anyhow::Error>) {
        self.settle(Err(err.into()));
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("abandoned", &self.tx.is_canceled())
            .finish()
    }
}

/// The settlement of a [`Completion`] that was dropped without being called.
#[derive(Debug, Error)]
#[error("completion callback was dropped without being called")]
pub struct CompletionDropped;

/// Resolves once the paired [`Completion`] is called or dropped.
#[derive(Debug)]
pub struct Settlement {
    rx: oneshot::Receiver<anyhow::Result<Output>>,
}

impl Settlement {
    /// Returns the settlement if the completion has already been called.
    pub fn try_settled(&mut self) -> Option<anyhow::Result<Output>> {
        self.rx.try_recv().ok().flatten()
    }
}

impl Future for Settlement {
    type Output = anyhow::Result<Output>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.rx.poll_unpin(cx).map(|settled| {
            settled.unwrap_or_else(|_| Err(anyhow::Error::new(CompletionDropped)))
        })
    }
}

/// Explicit context handed to every target.
///
/// Cheap to clone, so deferred targets can move it into their futures.
#[derive(Debug, Clone, Default)]
pub struct InvocationContext {
    args: Arc<CommandArgs>,
    options: Arc<Options>,
}

impl InvocationContext {
    pub fn new(args: CommandArgs, options: Arc<Options>) -> Self {
        Self {
            args: Arc::new(args),
            options,
        }
    }

    /// The arguments exactly as the caller supplied them.
    pub fn args(&self) -> &CommandArgs {
        &self.args
    }

    /// The named mapping, or `None` when positional values were supplied.
    pub fn named(&self) -> Option<&NamedArguments> {
        self.args.named()
    }

    pub fn options(&self) -> &Options {
        &self.options
    }
}

/// A boxed future producing a target's output.
pub type DeferredOutput = BoxFuture<'static, anyhow::Result<Output>>;

pub type DirectFn =
    Arc<dyn Fn(&InvocationContext, PositionalArguments) -> anyhow::Result<Output> + Send + Sync>;

pub type DeferredFn =
    Arc<dyn Fn(&InvocationContext, PositionalArguments) -> DeferredOutput + Send + Sync>;

/// A callback-style function. Any future it hands back is driven but its
/// outcome is ignored; only the [`Completion`] settles the invocation.
pub type CallbackFn = Arc<
    dyn Fn(&InvocationContext, PositionalArguments) -> anyhow::Result<Option<DeferredOutput>>
        + Send
        + Sync,
>;

/// A callable, tagged with its completion style.
#[derive(Clone)]
pub enum Target {
    Direct(DirectFn),
    Deferred(DeferredFn),
    Callback(CallbackFn),
}

impl Target {
    pub fn style(&self) -> CompletionStyle {
        match self {
            Target::Direct(_) => CompletionStyle::Direct,
            Target::Deferred(_) => CompletionStyle::Deferred,
            Target::Callback(_) => CompletionStyle::CallbackBased,
        }
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Target::{:?}", self.style())
    }
}

/// A registered callable: declared parameter names plus its target.
#[derive(Debug, Clone)]
pub struct Command {
    info: ParameterInfo,
    target: Target,
}

impl Command {
    /// Registers a target with its parameter names in declaration order.
    ///
    /// For callback targets the names exclude the completion slot.
    pub fn from_target(params: &[&str], target: Target) -> Self {
        let info = ParameterInfo {
            param_list: params.iter().map(|p| p.to_string()).collect(),
            has_callback: target.style() == CompletionStyle::CallbackBased,
        };
        Self { info, target }
    }

    /// A target that completes by returning.
    ///
    /// ```rust
    /// use runline_dispatch::Command;
    ///
    /// let add = Command::direct(&["a", "b"], |_ctx, args| {
    ///     let a: i64 = args.get(0).unwrap_or("0").parse()?;
    ///     let b: i64 = args.get(1).unwrap_or("0").parse()?;
    ///     Ok::<_, anyhow::Error>(a + b)
    /// });
    /// assert_eq!(add.info().param_list, vec!["a", "b"]);
    /// ```
    pub fn direct<F, R>(params: &[&str], f: F) -> Self
    where
        F: Fn(&InvocationContext, PositionalArguments) -> R + Send + Sync + 'static,
        R: IntoOutput,
    {
        Self::from_target(
            params,
            Target::Direct(Arc::new(
                move |ctx: &InvocationContext, args: PositionalArguments| f(ctx, args).into_output(),
            )),
        )
    }

    /// A target that completes through a future.
    pub fn deferred<F, Fut, R>(params: &[&str], f: F) -> Self
    where
        F: Fn(&InvocationContext, PositionalArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoOutput + 'static,
    {
        Self::from_target(
            params,
            Target::Deferred(Arc::new(move |ctx: &InvocationContext, args: PositionalArguments| {
                f(ctx, args).map(IntoOutput::into_output).boxed()
            })),
        )
    }

    /// A target that completes by calling the [`Completion`] in its last slot.
    pub fn callback<F, E>(params: &[&str], f: F) -> Self
    where
        F: Fn(&InvocationContext, PositionalArguments) -> Result<(), E> + Send + Sync + 'static,
        E: Into<anyhow::Error>,
    {
        Self::from_target(
            params,
            Target::Callback(Arc::new(move |ctx: &InvocationContext, args: PositionalArguments| {
                f(ctx, args)
                    .map(|()| None::<DeferredOutput>)
                    .map_err(Into::<anyhow::Error>::into)
            })),
        )
    }

    pub fn info(&self) -> &ParameterInfo {
        &self.info
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn style(&self) -> CompletionStyle {
        self.target.style()
    }
}

/// One entry of a module program.
#[derive(Debug, Clone)]
pub enum Export {
    Command(Command),
    /// A non-callable export (a constant, a version string, ...).
    Value(Value),
}

impl Export {
    pub fn as_command(&self) -> Option<&Command> {
        match self {
            Export::Command(cmd) => Some(cmd),
            Export::Value(_) => None,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Export::Command(_))
    }
}

impl From<Command> for Export {
    fn from(cmd: Command) -> Self {
        Export::Command(cmd)
    }
}
