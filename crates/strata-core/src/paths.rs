use crate::error::{Result, StrataError};
use crate::types::Collection;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const STRATA_DIR: &str = ".strata";
pub const CONFIG_FILE: &str = ".strata/config.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn strata_dir(root: &Path) -> PathBuf {
    root.join(STRATA_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn collection_dir(root: &Path, collection: Collection) -> PathBuf {
    strata_dir(root).join(collection.dir_name())
}

pub fn record_path(root: &Path, collection: Collection, id: &str) -> PathBuf {
    collection_dir(root, collection).join(format!("{id}.yaml"))
}

// ---------------------------------------------------------------------------
// Id validation
// ---------------------------------------------------------------------------

static ID_RE: OnceLock<Regex> = OnceLock::new();

fn id_re() -> &'static Regex {
    ID_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_\-]*$").unwrap())
}

/// Record ids become file names, so they are restricted to a safe alphabet.
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() || id.len() > 64 || !id_re().is_match(id) {
        return Err(StrataError::InvalidId(id.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
