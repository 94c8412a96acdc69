//! Built-in programs.
//!
//! Small functions written without any CLI in mind, registered with
//! `#[command]`. Between them they cover every completion style, streamed
//! results, context access, and the printing policy for "no value".

use std::time::Duration;

use futures::stream;
use runline_dispatch::{Completion, InvocationContext, Module, Output, Registry};
use runline_macros::command;
use serde::Serialize;
use serde_json::{json, Value};

/// `greet name=Ada greeting=Hi`
#[command]
pub fn greet(name: Option<String>, greeting: Option<String>) -> String {
    format!(
        "{}, {}!",
        greeting.as_deref().unwrap_or("Hello"),
        name.as_deref().unwrap_or("stranger")
    )
}

/// Shows what the function sees beyond its parameters.
#[command]
pub fn echo(#[ctx] ctx: &InvocationContext) -> Value {
    json!({
        "args": ctx.args(),
        "options": ctx.options().extra,
    })
}

#[command]
pub fn add(a: i64, b: i64) -> i64 {
    a + b
}

#[command]
pub fn divide(a: f64, b: f64) -> anyhow::Result<f64> {
    if b == 0.0 {
        anyhow::bail!("division by zero");
    }
    Ok(a / b)
}

/// Streams the integers in `start..end`.
#[command]
pub fn range(start: Option<i64>, end: i64) -> Output {
    Output::stream(stream::iter(start.unwrap_or(0)..end))
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub count: usize,
    pub sum: f64,
    pub mean: Option<f64>,
}

/// `stats values=[1,2,3]`
#[command]
pub fn stats(values: Value) -> anyhow::Result<Summary> {
    let numbers = values
        .as_array()
        .ok_or_else(|| anyhow::anyhow!("values must be a JSON array"))?
        .iter()
        .map(|v| {
            v.as_f64()
                .ok_or_else(|| anyhow::anyhow!("not a number: {}", v))
        })
        .collect::<anyhow::Result<Vec<f64>>>()?;

    let sum: f64 = numbers.iter().sum();
    let mean = (!numbers.is_empty()).then(|| sum / numbers.len() as f64);
    Ok(Summary {
        count: numbers.len(),
        sum,
        mean,
    })
}

/// Resolves after `ms` milliseconds.
#[command]
pub async fn wait(ms: Option<u64>) -> u64 {
    let ms = ms.unwrap_or(10);
    tokio::time::sleep(Duration::from_millis(ms)).await;
    ms
}

/// Error-first callback style, completed from another thread.
#[command]
pub fn legacy(ms: Option<u64>, fail: Option<bool>, done: Completion) {
    let ms = ms.unwrap_or(10);
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(ms));
        if fail.unwrap_or(false) {
            done.call(Some(anyhow::anyhow!("legacy operation failed")), None);
        } else {
            done.resolve(json!({ "waited": ms }));
        }
    });
}

/// Completes through its callback, then keeps working before resolving its
/// own future. The callback's value is the one printed.
#[command]
pub async fn race(done: Completion) -> &'static str {
    done.resolve("callback");
    tokio::time::sleep(Duration::from_millis(1)).await;
    "future"
}

/// Produces no value at all.
#[command]
pub fn nothing() {}

#[command]
pub fn null() -> Value {
    Value::Null
}

#[command]
pub fn explode(message: Option<String>) -> String {
    panic!("{}", message.unwrap_or_else(|| "boom".to_string()))
}

/// The programs available to the `runline` binary.
pub fn registry() -> Registry {
    Registry::new()
        .program("greet", greet__command())
        .program("echo", echo__command())
        .program(
            "math",
            Module::new()
                .command("add", add__command())
                .command("divide", divide__command())
                .command("range", range__command())
                .command("stats", stats__command())
                .value("pi", std::f64::consts::PI),
        )
        .program(
            "timer",
            Module::new()
                .command("wait", wait__command())
                .command("legacy", legacy__command())
                .command("race", race__command()),
        )
        .program(
            "edge",
            Module::new()
                .command("nothing", nothing__command())
                .command("null", null__command())
                .command("explode", explode__command()),
        )
}
