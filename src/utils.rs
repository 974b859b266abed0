//! Input/output helpers for the `apireq` binary.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

// === Filesystem Helpers ===

pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory: {}", path.display()))
}

/// Read a whole input file, or stdin when `path` is `None` or `-`.
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        _ => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read stdin")?;
            Ok(buffer)
        }
    }
}

/// Write `contents` to a file (creating parent directories), or stdout when
/// `path` is `None`.
pub fn write_output(path: Option<&Path>, contents: &str) -> Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                ensure_dir(parent)?;
            }
            fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(contents.as_bytes())
                .and_then(|()| stdout.write_all(b"\n"))
                .context("Failed to write stdout")
        }
    }
}

/// Serialize to JSON, pretty or compact.
pub fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    rendered.context("Failed to serialize JSON output")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn writes_and_reads_files() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("out.json");

        write_output(Some(&path), "[1]")?;

        assert_eq!(read_input(Some(&path))?, "[1]");
        Ok(())
    }

    #[test]
    fn missing_input_names_the_file() {
        let err = read_input(Some(Path::new("/definitely/not/here.json"))).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }

    #[test]
    fn json_rendering_modes() -> Result<()> {
        let value = json!({"a": [1]});
        assert_eq!(to_json(&value, false)?, r#"{"a":[1]}"#);
        assert_eq!(to_json(&value, true)?, "{\n  \"a\": [\n    1\n  ]\n}");
        Ok(())
    }
}
