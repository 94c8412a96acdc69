//! Output format and destination.
//!
//! [`OutputFormat`] chooses the serialization of the normalized result.
//! [`OutputDestination`] chooses where the serialized text goes.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Serialization of the printed result.
///
/// This is the user-facing enum for the `--format` CLI flag.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON, indented when `newline` is set
    #[default]
    Json,
    /// YAML document
    Yaml,
}

/// Destination for the printed result.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputDestination {
    /// Write to the given writer (standard output for the binary)
    #[default]
    Stdout,
    /// Write to a specific file
    File(PathBuf),
}

impl OutputDestination {
    /// Writes `content` followed by a newline.
    ///
    /// `stdout` is only used for [`OutputDestination::Stdout`]; taking it as a
    /// parameter keeps the printing path testable.
    pub fn write_text<W: Write>(&self, stdout: &mut W, content: &str) -> std::io::Result<()> {
        match self {
            OutputDestination::Stdout => writeln!(stdout, "{}", content),
            OutputDestination::File(path) => {
                validate_path(path)?;
                std::fs::write(path, format!("{}\n", content))
            }
        }
    }
}

/// Validates that a file path's parent directory exists.
fn validate_path(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Parent directory does not exist: {}", parent.display()),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_default_is_json() {
        assert_eq!(OutputFormat::default(), OutputFormat::Json);
    }

    #[test]
    fn test_write_text_to_writer() {
        let mut buf = Vec::new();
        OutputDestination::Stdout
            .write_text(&mut buf, "\"World\"")
            .unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "\"World\"\n");
    }

    #[test]
    fn test_write_text_to_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("result.json");
        let dest = OutputDestination::File(file_path.clone());

        let mut unused = Vec::new();
        dest.write_text(&mut unused, "[1,2,3]").unwrap();

        assert!(unused.is_empty());
        let content = std::fs::read_to_string(file_path).unwrap();
        assert_eq!(content, "[1,2,3]\n");
    }

    #[test]
    fn test_write_to_invalid_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("missing").join("result.json");
        let dest = OutputDestination::File(file_path);

        let result = dest.write_text(&mut Vec::new(), "1");
        assert!(result.is_err());
    }
}
