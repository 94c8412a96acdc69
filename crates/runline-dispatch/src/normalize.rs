//! Result normalization.
//!
//! Turns whatever a target produced into a plain value the printer can
//! serialize. Streams are drained into a list; everything else passes
//! through unchanged.

use futures::TryStreamExt;
use serde_json::Value;
use tracing::debug;

use crate::error::InvocationError;
use crate::handler::Output;

/// Normalizes a target's output.
///
/// - [`Output::Stream`] is drained completely and becomes a JSON array of
///   its items in order. An empty stream becomes `[]`.
/// - [`Output::Value`] is returned as is, including `null`.
/// - [`Output::Undefined`] becomes `None`.
///
/// A stream that yields an error fails the whole drain; items produced
/// before it are discarded.
///
/// ```rust
/// use futures::stream;
/// use runline_dispatch::{normalize, Output};
/// use serde_json::json;
///
/// let output = Output::stream(stream::iter(vec![1, 2, 3]));
/// let value = futures::executor::block_on(normalize(output)).unwrap();
/// assert_eq!(value, Some(json!([1, 2, 3])));
/// ```
pub async fn normalize(output: Output) -> Result<Option<Value>, InvocationError> {
    match output {
        Output::Value(value) => Ok(Some(value)),
        Output::Undefined => Ok(None),
        Output::Stream(items) => {
            let items: Vec<Value> = items.try_collect().await.map_err(InvocationError::new)?;
            debug!(items = items.len(), "drained streamed result");
            Ok(Some(Value::Array(items)))
        }
    }
}
