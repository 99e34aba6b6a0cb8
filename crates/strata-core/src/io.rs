//! YAML document I/O shared by the file store and the config file.

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Replace `path` with `data` in one rename, creating parents as needed.
/// Readers see either the old document or the new one, never a torn write.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) => {
            std::fs::create_dir_all(parent)?;
            parent
        }
        None => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

pub fn write_yaml<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let data = serde_yaml::to_string(value)?;
    atomic_write(path, data.as_bytes())
}

/// Write `value` unless a document already exists at `path`.
/// Returns whether anything was written.
pub fn write_yaml_if_missing<T: Serialize>(path: &Path, value: &T) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    write_yaml(path, value)?;
    Ok(true)
}

pub fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&data)?)
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Doc {
        id: String,
        n: u32,
    }

    #[test]
    fn write_then_read_through_missing_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("assets/nested/a1.yaml");
        let doc = Doc {
            id: "a1".into(),
            n: 3,
        };
        write_yaml(&path, &doc).unwrap();
        assert_eq!(read_yaml::<Doc>(&path).unwrap(), doc);
    }

    #[test]
    fn write_if_missing_keeps_existing_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        let first = Doc {
            id: "first".into(),
            n: 1,
        };
        let second = Doc {
            id: "second".into(),
            n: 2,
        };
        assert!(write_yaml_if_missing(&path, &first).unwrap());
        assert!(!write_yaml_if_missing(&path, &second).unwrap());
        assert_eq!(read_yaml::<Doc>(&path).unwrap(), first);
    }

    #[test]
    fn read_of_malformed_yaml_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.yaml");
        atomic_write(&path, b"id: [unclosed").unwrap();
        assert!(read_yaml::<Doc>(&path).is_err());
    }
}
