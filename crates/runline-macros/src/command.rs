//! `#[command]` proc macro for registering plain functions.
//!
//! The macro keeps the function as written and generates a
//! `<name>__command()` constructor returning a `runline_dispatch::Command`
//! whose parameter list is read from the signature.
//!
//! # Example
//!
//! ```rust,ignore
//! use runline_macros::command;
//!
//! #[command]
//! fn greet(name: Option<String>, shout: Option<bool>) -> Result<String, anyhow::Error> {
//!     let text = format!("Hello, {}!", name.unwrap_or_else(|| "stranger".into()));
//!     Ok(if shout.unwrap_or(false) { text.to_uppercase() } else { text })
//! }
//!
//! // Generates:
//! // pub fn greet__command() -> runline_dispatch::Command {
//! //     Command::from_target(&["name", "shout"], Target::Direct(Arc::new(|ctx, args| {
//! //         let name = <Option<String> as FromArg>::from_arg("name", slot 0)?;
//! //         let shout = <Option<bool> as FromArg>::from_arg("shout", slot 1)?;
//! //         IntoOutput::into_output(greet(name, shout))
//! //     })))
//! // }
//! ```
//!
//! # Parameters
//!
//! | Declaration | Role | Value |
//! |-------------|------|-------|
//! | `name: T` | named argument `name` | `<T as FromArg>::from_arg` |
//! | `#[ctx] ctx: &InvocationContext` | context, not an argument | the invocation's context |
//! | `#[ctx] ctx: InvocationContext` | context, not an argument | a clone (for `async fn`) |
//! | `done: Completion` (last) | completion slot | makes the command callback-style |
//!
//! # Completion Style
//!
//! | Function | Style |
//! |----------|-------|
//! | `fn` | direct |
//! | `async fn` | deferred |
//! | `fn` with trailing `Completion` | callback |
//! | `async fn` with trailing `Completion` | callback; the returned future is driven but ignored |
//!
//! # Return Types
//!
//! | Return Type | Output |
//! |-------------|--------|
//! | none | `Output::Undefined` |
//! | `Result<(), E>` | `Output::Undefined`, or the error |
//! | `Result<T, E>` | through `IntoOutput` (`T: Serialize`, or `T = Output`) |
//! | `Output` | as is |
//! | `T` | `Output::value(T)` |

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    ext::IdentExt, spanned::Spanned, Error, FnArg, Ident, ItemFn, Pat, PatType, Result,
    ReturnType, Type,
};

/// What a parameter of the annotated function receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParamKind {
    /// A bound argument slot.
    Arg,
    /// `#[ctx]`: the invocation context.
    Ctx { by_ref: bool },
    /// The trailing completion.
    Completion,
}

struct ParamInfo {
    ident: Ident,
    ty: Type,
    kind: ParamKind,
}

impl ParamInfo {
    /// The argument name as seen on the command line.
    fn arg_name(&self) -> String {
        self.ident.unraw().to_string()
    }
}

/// How the function's return value becomes an `Output`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReturnKind {
    /// No return type.
    Unit,
    /// `Result<(), E>`.
    UnitResult,
    /// Any other `Result<T, E>`.
    Result,
    /// A bare `Output`.
    Output,
    /// A plain serializable value.
    Plain,
}

fn last_segment_is(ty: &Type, name: &str) -> bool {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            return segment.ident == name;
        }
    }
    false
}

fn is_completion_type(ty: &Type) -> bool {
    last_segment_is(ty, "Completion")
}

fn return_kind(output: &ReturnType) -> ReturnKind {
    let ty = match output {
        ReturnType::Default => return ReturnKind::Unit,
        ReturnType::Type(_, ty) => ty.as_ref(),
    };

    if let Type::Tuple(tuple) = ty {
        if tuple.elems.is_empty() {
            return ReturnKind::Unit;
        }
    }

    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            if segment.ident == "Result" {
                if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                    if let Some(syn::GenericArgument::Type(Type::Tuple(tuple))) = args.args.first()
                    {
                        if tuple.elems.is_empty() {
                            return ReturnKind::UnitResult;
                        }
                    }
                }
                return ReturnKind::Result;
            }
            if segment.ident == "Output" {
                return ReturnKind::Output;
            }
        }
    }

    ReturnKind::Plain
}

fn parse_param(pat_type: &PatType) -> Result<ParamInfo> {
    let ident = match pat_type.pat.as_ref() {
        Pat::Ident(pat_ident) => pat_ident.ident.clone(),
        pat => {
            return Err(Error::new(
                pat.span(),
                "expected identifier pattern for parameter",
            ))
        }
    };
    let ty = (*pat_type.ty).clone();

    let kind = if pat_type.attrs.iter().any(|attr| attr.path().is_ident("ctx")) {
        ParamKind::Ctx {
            by_ref: matches!(ty, Type::Reference(_)),
        }
    } else if is_completion_type(&ty) {
        ParamKind::Completion
    } else {
        ParamKind::Arg
    };

    Ok(ParamInfo { ident, ty, kind })
}

fn parse_params(fn_item: &ItemFn) -> Result<Vec<ParamInfo>> {
    let mut params = Vec::new();
    for fn_arg in &fn_item.sig.inputs {
        match fn_arg {
            FnArg::Typed(pat_type) => params.push(parse_param(pat_type)?),
            FnArg::Receiver(_) => {
                return Err(Error::new(
                    fn_arg.span(),
                    "#[command] functions cannot have self parameter",
                ));
            }
        }
    }

    let completions = params
        .iter()
        .filter(|p| p.kind == ParamKind::Completion)
        .count();
    let last_is_completion = params
        .last()
        .is_some_and(|p| p.kind == ParamKind::Completion);
    if completions > 1 || (completions == 1 && !last_is_completion) {
        let offender = params
            .iter()
            .find(|p| p.kind == ParamKind::Completion)
            .map(|p| p.ident.span())
            .unwrap_or_else(|| fn_item.sig.ident.span());
        return Err(Error::new(
            offender,
            "a Completion parameter must be the last parameter",
        ));
    }

    Ok(params)
}

/// Generate the statement that fills one parameter from the invocation.
fn generate_extraction(param: &ParamInfo) -> TokenStream {
    let ident = &param.ident;
    let ty = &param.ty;

    match param.kind {
        ParamKind::Arg => {
            let name = param.arg_name();
            quote! {
                let #ident: #ty = <#ty as ::runline_dispatch::FromArg>::from_arg(
                    #name,
                    __values.next().flatten(),
                )?;
            }
        }
        ParamKind::Ctx { by_ref: true } => quote! {
            let #ident: #ty = __ctx;
        },
        ParamKind::Ctx { by_ref: false } => quote! {
            let #ident: #ty = ::std::clone::Clone::clone(__ctx);
        },
        ParamKind::Completion => quote! {
            let #ident: #ty = __completion.ok_or_else(|| {
                ::runline_dispatch::__private::anyhow::anyhow!("missing completion slot")
            })?;
        },
    }
}

/// Convert an evaluated call (`__result`) into `anyhow::Result<Output>`.
fn generate_conversion(kind: ReturnKind) -> TokenStream {
    match kind {
        ReturnKind::Unit => quote! {
            {
                let () = __result;
                ::runline_dispatch::__private::anyhow::Ok(::runline_dispatch::Output::Undefined)
            }
        },
        ReturnKind::UnitResult => quote! {
            ::runline_dispatch::IntoOutput::into_output(
                __result.map(|()| ::runline_dispatch::Output::Undefined),
            )
        },
        ReturnKind::Result => quote! {
            ::runline_dispatch::IntoOutput::into_output(__result)
        },
        ReturnKind::Output => quote! {
            ::runline_dispatch::__private::anyhow::Ok::<::runline_dispatch::Output>(__result)
        },
        ReturnKind::Plain => quote! {
            ::runline_dispatch::Output::value(__result)
        },
    }
}

/// Main implementation of the #[command] macro
pub fn command_impl(attr: TokenStream, item: TokenStream) -> Result<TokenStream> {
    if !attr.is_empty() {
        return Err(Error::new(attr.span(), "#[command] takes no arguments"));
    }

    let fn_item: ItemFn = syn::parse2(item)?;
    let fn_name = &fn_item.sig.ident;
    let fn_vis = &fn_item.vis;
    let constructor_name = format_ident!("{}__command", fn_name);
    let is_async = fn_item.sig.asyncness.is_some();

    let params = parse_params(&fn_item)?;
    let has_completion = params.iter().any(|p| p.kind == ParamKind::Completion);
    let returns = return_kind(&fn_item.sig.output);

    let arg_names: Vec<String> = params
        .iter()
        .filter(|p| p.kind == ParamKind::Arg)
        .map(ParamInfo::arg_name)
        .collect();
    let takes_args = !arg_names.is_empty();
    let extractions: Vec<TokenStream> = params.iter().map(generate_extraction).collect();
    let call_args: Vec<&Ident> = params.iter().map(|p| &p.ident).collect();
    let conversion = generate_conversion(returns);

    let values_binding = if takes_args {
        quote! { let mut __values = __values.into_iter(); }
    } else {
        quote! { let _ = __values; }
    };

    let anyhow_result = quote! { ::runline_dispatch::__private::anyhow::Result };
    let prelude = quote! {
        let (__values, __completion) = __args.into_parts();
        #values_binding
        #(#extractions)*
    };

    // Boxes the future returned by an async fn, converting its output.
    let boxed_future = quote! {
        ::runline_dispatch::__private::futures::FutureExt::boxed(async move {
            let __result = __future.await;
            #conversion
        })
    };

    let target = match (is_async, has_completion) {
        (false, false) => quote! {
            ::runline_dispatch::Target::Direct(::std::sync::Arc::new(
                |__ctx: &::runline_dispatch::InvocationContext,
                 __args: ::runline_dispatch::PositionalArguments|
                 -> #anyhow_result<::runline_dispatch::Output> {
                    #prelude
                    let __result = #fn_name(#(#call_args),*);
                    #conversion
                },
            ))
        },
        (true, false) => quote! {
            ::runline_dispatch::Target::Deferred(::std::sync::Arc::new(
                |__ctx: &::runline_dispatch::InvocationContext,
                 __args: ::runline_dispatch::PositionalArguments|
                 -> ::runline_dispatch::DeferredOutput {
                    let __started = (|| -> #anyhow_result<_> {
                        #prelude
                        ::runline_dispatch::__private::anyhow::Ok(#fn_name(#(#call_args),*))
                    })();
                    match __started {
                        ::std::result::Result::Ok(__future) => #boxed_future,
                        ::std::result::Result::Err(__err) => {
                            ::runline_dispatch::__private::futures::FutureExt::boxed(
                                ::runline_dispatch::__private::futures::future::ready(
                                    ::std::result::Result::Err(__err),
                                ),
                            )
                        }
                    }
                },
            ))
        },
        (false, true) => quote! {
            ::runline_dispatch::Target::Callback(::std::sync::Arc::new(
                |__ctx: &::runline_dispatch::InvocationContext,
                 __args: ::runline_dispatch::PositionalArguments|
                 -> #anyhow_result<::std::option::Option<::runline_dispatch::DeferredOutput>> {
                    #prelude
                    let __result = #fn_name(#(#call_args),*);
                    let _ = (#conversion)?;
                    ::std::result::Result::Ok(::std::option::Option::None)
                },
            ))
        },
        (true, true) => quote! {
            ::runline_dispatch::Target::Callback(::std::sync::Arc::new(
                |__ctx: &::runline_dispatch::InvocationContext,
                 __args: ::runline_dispatch::PositionalArguments|
                 -> #anyhow_result<::std::option::Option<::runline_dispatch::DeferredOutput>> {
                    #prelude
                    let __future = #fn_name(#(#call_args),*);
                    ::std::result::Result::Ok(::std::option::Option::Some(#boxed_future))
                },
            ))
        },
    };

    // Strip #[ctx] from the original function's parameters
    let mut clean_fn = fn_item.clone();
    for fn_arg in &mut clean_fn.sig.inputs {
        if let FnArg::Typed(pat_type) = fn_arg {
            pat_type.attrs.retain(|attr| !attr.path().is_ident("ctx"));
        }
    }

    Ok(quote! {
        #clean_fn

        #[allow(non_snake_case)]
        #fn_vis fn #constructor_name() -> ::runline_dispatch::Command {
            ::runline_dispatch::Command::from_target(&[#(#arg_names),*], #target)
        }
    })
}
