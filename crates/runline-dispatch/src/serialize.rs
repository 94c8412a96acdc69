//! Serialization of normalized results.
//!
//! Applies the printing policy from [`Options`]: which format, whether JSON
//! is indented, and whether "no value" and `null` produce any text at all.

use serde_json::Value;
use thiserror::Error;

use crate::options::Options;
use crate::output::OutputFormat;

/// Errors that can occur during serialization.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Serializes a value to JSON; 2-space indented when `newline` is set.
pub fn to_json(value: &Value, newline: bool) -> Result<String, SerializeError> {
    if newline {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(serde_json::to_string(value)?)
    }
}

/// Serializes a value to YAML, without the trailing newline.
pub fn to_yaml(value: &Value) -> Result<String, SerializeError> {
    let text = serde_yaml::to_string(value)?;
    Ok(text.trim_end_matches('\n').to_string())
}

/// Renders a normalized result for printing.
///
/// Returns `None` when nothing should be printed: a missing value without
/// `print_undefined`, or `null` without `print_null`.
pub fn render(value: Option<&Value>, options: &Options) -> Result<Option<String>, SerializeError> {
    let value = match value {
        None if options.print_undefined => return Ok(Some("undefined".to_string())),
        None => return Ok(None),
        Some(Value::Null) if !options.print_null => return Ok(None),
        Some(value) => value,
    };

    let text = match options.format {
        OutputFormat::Json => to_json(value, options.newline)?,
        OutputFormat::Yaml => to_yaml(value)?,
    };
    Ok(Some(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_json_pretty() {
        let result = to_json(&json!({"name": "test", "value": 42}), true).unwrap();
        assert_eq!(result, "{\n  \"name\": \"test\",\n  \"value\": 42\n}");
    }

    #[test]
    fn test_to_json_compact() {
        let result = to_json(&json!([1, 2, 3]), false).unwrap();
        assert_eq!(result, "[1,2,3]");
    }

    #[test]
    fn test_to_yaml() {
        let result = to_yaml(&json!({"name": "test", "value": 42})).unwrap();
        assert!(result.contains("name: test"));
        assert!(result.contains("value: 42"));
        assert!(!result.ends_with('\n'));
    }

    #[test]
    fn test_render_string_default_options() {
        let options = Options::default();
        let text = render(Some(&json!("World")), &options).unwrap();
        assert_eq!(text.as_deref(), Some("\"World\""));
    }

    #[test]
    fn test_render_undefined() {
        let mut options = Options::default();
        assert_eq!(render(None, &options).unwrap(), None);

        options.print_undefined = true;
        assert_eq!(render(None, &options).unwrap().as_deref(), Some("undefined"));
    }

    #[test]
    fn test_render_null() {
        let mut options = Options::default();
        assert_eq!(
            render(Some(&Value::Null), &options).unwrap().as_deref(),
            Some("null")
        );

        options.print_null = false;
        assert_eq!(render(Some(&Value::Null), &options).unwrap(), None);
    }

    #[test]
    fn test_render_yaml() {
        let options = Options {
            format: OutputFormat::Yaml,
            ..Options::default()
        };
        let text = render(Some(&json!(["a", "b"])), &options).unwrap().unwrap();
        assert_eq!(text, "- a\n- b");
    }
}
