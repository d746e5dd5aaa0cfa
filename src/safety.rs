//! Safety checks to prevent overwriting the source dataset.
//!
//! Every tool writes new files next to its inputs. A mistyped flag must not
//! make a tool replace the file it is reading from.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Resolves a path for comparison. Existing files are canonicalized, others
/// are compared as given.
fn comparable(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Validates that output paths are safe to write.
///
/// Checks:
/// - No output may be the same file as any source
/// - No two outputs may be the same file
pub fn validate_output_paths(outputs: &[&Path], sources: &[&Path]) -> Result<()> {
    let sources: Vec<(&Path, PathBuf)> = sources.iter().map(|s| (*s, comparable(s))).collect();
    let mut seen: Vec<(&Path, PathBuf)> = Vec::with_capacity(outputs.len());

    for output in outputs {
        let resolved = comparable(output);

        if let Some((source, _)) = sources.iter().find(|(_, s)| *s == resolved) {
            return Err(Error::UnsafeOutput(format!(
                "output '{}' cannot be the same as source '{}'",
                output.display(),
                source.display()
            )));
        }

        if let Some((other, _)) = seen.iter().find(|(_, o)| *o == resolved) {
            return Err(Error::UnsafeOutput(format!(
                "outputs '{}' and '{}' refer to the same file",
                other.display(),
                output.display()
            )));
        }

        seen.push((output, resolved));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_distinct_outputs_ok() {
        let output = PathBuf::from("/tmp/public/main.csv");
        let lyrics = PathBuf::from("/tmp/public/lyrics.csv");
        let source = PathBuf::from("/tmp/public/contestants.csv");
        assert!(validate_output_paths(&[&output, &lyrics], &[&source]).is_ok());
    }

    #[test]
    fn test_output_equals_source() {
        let path = PathBuf::from("/data/contestants.csv");
        let result = validate_output_paths(&[&path], &[&path]);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("cannot be the same as source"));
    }

    #[test]
    fn test_outputs_collide() {
        let source = PathBuf::from("/data/contestants.csv");
        let out = PathBuf::from("/data/out.csv");
        let result = validate_output_paths(&[&out, &out], &[&source]);
        assert!(result.unwrap_err().to_string().contains("same file"));
    }

    #[test]
    fn test_relative_alias_of_source_blocked() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("contestants.csv");
        fs::write(&source, "year\n").unwrap();
        let alias = temp_dir.path().join(".").join("contestants.csv");
        assert!(validate_output_paths(&[&alias], &[&source]).is_err());
    }
}
