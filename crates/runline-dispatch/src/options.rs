//! Run-time options.
//!
//! [`Options`] is built once at startup from defaults and CLI flags, then
//! shared read-only for the rest of the run.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::output::OutputFormat;

/// Verbosity of diagnostic logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// The directive understood by `tracing` filters.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!("unknown log level: {}", other)),
        }
    }
}

/// Global options for one run.
///
/// Defaults: `loglevel = info`, `newline = true`, `print_undefined = false`,
/// `print_null = true`, `format = json`. Flags the CLI does not know
/// land in `extra`, so targets can still read them through the context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub loglevel: LogLevel,
    /// Pretty-print JSON output (2-space indent) instead of one line.
    pub newline: bool,
    /// Print `undefined` when a target produces no value.
    pub print_undefined: bool,
    /// Print `null` results; when false a null result prints nothing.
    pub print_null: bool,
    pub format: OutputFormat,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            loglevel: LogLevel::Info,
            newline: true,
            print_undefined: false,
            print_null: true,
            format: OutputFormat::Json,
            extra: BTreeMap::new(),
        }
    }
}

impl Options {
    /// Looks up a free-form option.
    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Sets a free-form option from a `key=value` pair.
    ///
    /// The value is parsed as JSON when possible (`true`, `3`, `[1]`),
    /// otherwise kept as a string. A bare key is set to `true`.
    pub fn set_extra(&mut self, pair: &str) {
        let (key, value) = match pair.split_once('=') {
            Some((key, raw)) => (
                key,
                serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string())),
            ),
            None => (pair, Value::Bool(true)),
        };
        self.extra.insert(key.to_string(), value);
    }
}
