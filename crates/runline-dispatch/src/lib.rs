//! Named-argument invocation for command-line programs.
//!
//! `runline-dispatch` turns loose `name=value` tokens into a call of an
//! ordinary function, whatever way that function signals it is done, and
//! turns what it produced into printable JSON or YAML.
//!
//! # Pipeline
//!
//! ```text
//! tokens ─► resolve ─► bind ─► invoke ─► normalize ─► render
//! ```
//!
//! - **Introspection** ([`inspect`]): the ordered parameter names of a
//!   target and whether it completes through a trailing callback.
//! - **Binding** ([`bind`]): named arguments to positional slots, in
//!   declaration order. Never fails; unmapped parameters are absent.
//! - **Invocation** ([`invoke`]): calls a [`Direct`](Target::Direct),
//!   [`Deferred`](Target::Deferred) or [`Callback`](Target::Callback)
//!   target and returns one [`PendingResult`].
//! - **Normalization** ([`normalize`]): drains streams into arrays.
//! - **Resolution** ([`resolve`], [`select`]): picks the target of a
//!   callable program or of a module's named export.
//!
//! [`Runner`] wires the whole pass together behind a [`ProgramLoader`].
//!
//! # Completion Styles
//!
//! ```rust
//! use runline_dispatch::{invoke, Command, CommandArgs, Options};
//! use std::sync::Arc;
//!
//! let direct = Command::direct(&[], |_ctx, _args| Ok::<_, anyhow::Error>(42));
//! let deferred = Command::deferred(&[], |_ctx, _args| async { Ok::<_, anyhow::Error>(42) });
//! let callback = Command::callback(&[], |_ctx, mut args| {
//!     if let Some(done) = args.take_completion() {
//!         done.resolve(42);
//!     }
//!     Ok::<_, anyhow::Error>(())
//! });
//!
//! for command in [direct, deferred, callback] {
//!     let pending = invoke(&command, CommandArgs::default(), Arc::new(Options::default()));
//!     let output = futures::executor::block_on(pending).unwrap();
//!     assert_eq!(output.as_value(), Some(&serde_json::json!(42)));
//! }
//! ```
//!
//! # Absent Values
//!
//! A missing argument is `None` everywhere: in [`NamedArguments`] for a
//! bare token, and in [`PositionalArguments`] for an unmapped parameter.
//! Targets that need a value convert slots with [`FromArg`], which turns a
//! missing value into an invocation error.

mod args;
mod bind;
mod error;
mod handler;
mod introspect;
mod invoke;
mod normalize;
mod options;
mod output;
mod registry;
mod resolve;
mod run;
mod serialize;

pub use args::{CommandArgs, NamedArguments, PositionalArguments};
pub use bind::bind;
pub use error::{DispatchError, InvocationError};
pub use handler::{
    CallbackFn, Command, Completion, CompletionDropped, DeferredFn, DeferredOutput, DirectFn,
    Export, FromArg, IntoOutput, InvocationContext, Output, Settlement, Target,
};
pub use introspect::{inspect, inspect_export, CompletionStyle, ParameterInfo};
pub use invoke::{invoke, PendingResult};
pub use normalize::normalize;
pub use options::{LogLevel, Options};
pub use output::{OutputDestination, OutputFormat};
pub use registry::{ProgramLoader, Registry};
pub use resolve::{resolve, select, Module, Program};
pub use run::{RunOutcome, Runner};
pub use serialize::{render, to_json, to_yaml, SerializeError};

// Used by code generated with `#[command]`.
#[doc(hidden)]
pub mod __private {
    pub use anyhow;
    pub use futures;
}
