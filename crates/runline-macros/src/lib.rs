//! Proc macros for runline.
//!
//! - [`macro@command`] - Register a plain function as a `runline_dispatch::Command`

use proc_macro::TokenStream;

mod command;

/// Registers a plain function as a command.
///
/// The function is kept unchanged. Next to it the macro generates
/// `<name>__command() -> runline_dispatch::Command`, with the parameter
/// names taken from the signature in declaration order.
///
/// - Parameters are converted from their bound slot with `FromArg`;
///   `Option<T>` accepts a missing value, anything else rejects it.
/// - `#[ctx]` marks the parameter that receives the `InvocationContext`;
///   it is not part of the parameter list.
/// - A trailing `Completion` parameter makes the command callback-style.
/// - An `async fn` is deferred.
///
/// # Example
///
/// ```rust,ignore
/// use runline_dispatch::{Completion, InvocationContext};
/// use runline_macros::command;
///
/// #[command]
/// fn add(a: i64, b: i64) -> i64 {
///     a + b
/// }
///
/// #[command]
/// async fn wait(ms: Option<u64>) -> Result<u64, anyhow::Error> {
///     let ms = ms.unwrap_or(10);
///     tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
///     Ok(ms)
/// }
///
/// #[command]
/// fn legacy(#[ctx] ctx: &InvocationContext, path: String, done: Completion) {
///     std::thread::spawn(move || done.resolve(path));
/// }
///
/// let math = Module::new()
///     .command("add", add__command())
///     .command("wait", wait__command());
/// ```
///
/// # Testing
///
/// The original function is preserved, so you can test it directly:
///
/// ```rust,ignore
/// #[test]
/// fn test_add() {
///     assert_eq!(add(2, 3), 5);
/// }
/// ```
#[proc_macro_attribute]
pub fn command(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attr = proc_macro2::TokenStream::from(attr);
    let item = proc_macro2::TokenStream::from(item);
    command::command_impl(attr, item)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
